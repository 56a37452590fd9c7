//! End-to-end HTTP tests against a live server running with the
//! ephemeral store.

#![allow(clippy::panic)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use item_gateway::api;
use item_gateway::app_state::AppState;
use item_gateway::cache::{CacheProvider, MemoryCache};
use item_gateway::persistence::ItemStore;
use item_gateway::server::serve_until;
use item_gateway::service::ItemService;

struct TestServer {
    base: String,
    client: reqwest::Client,
    _shutdown: oneshot::Sender<()>,
}

impl TestServer {
    async fn start(cache: CacheProvider) -> Self {
        let service = ItemService::new(ItemStore::ephemeral(), cache, Duration::from_secs(600));
        let app = api::build_app(
            AppState {
                item_service: Arc::new(service),
            },
            Path::new("/nonexistent-static-dir"),
        );

        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(serve_until(listener, app, Duration::from_secs(1), async {
            let _ = rx.await;
        }));

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            _shutdown: tx,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn call(&self, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = self.client.request(method, self.url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let Ok(response) = request.send().await else {
            panic!("request to {path} failed");
        };
        let status = response.status();
        let Ok(bytes) = response.bytes().await else {
            panic!("unreadable body");
        };
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}

fn timestamp(value: &Value, name: &str) -> DateTime<Utc> {
    let Ok(at) = serde_json::from_value(field(value, name).clone()) else {
        panic!("{name} is not a timestamp in {value}");
    };
    at
}

fn field<'a>(value: &'a Value, name: &str) -> &'a Value {
    value.get(name).unwrap_or(&Value::Null)
}

#[tokio::test]
async fn crud_scenario_end_to_end() {
    let server = TestServer::start(CacheProvider::InProcess(MemoryCache::new())).await;

    let (status, a) = server
        .call(Method::POST, "/api/items", Some(json!({"name": "a"})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(field(&a, "id"), &json!(1));

    let (status, b) = server
        .call(Method::POST, "/api/items", Some(json!({"name": "b"})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(field(&b, "id"), &json!(2));

    let (status, list) = server.call(Method::GET, "/api/items", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([a.clone(), b.clone()]));

    // populate the cache before updating
    let (status, cached) = server.call(Method::GET, "/api/items/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cached, a);

    let (status, updated) = server
        .call(Method::PUT, "/api/items/1", Some(json!({"name": "a2"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(field(&updated, "name"), &json!("a2"));
    assert_eq!(field(&updated, "created_at"), field(&a, "created_at"));
    assert!(timestamp(&updated, "updated_at") >= timestamp(&a, "updated_at"));

    let (status, got) = server.call(Method::GET, "/api/items/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(got, updated);

    let (status, _) = server.call(Method::DELETE, "/api/items/2", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = server.call(Method::GET, "/api/items/2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server.call(Method::DELETE, "/api/items/2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_rejects_malformed_body() {
    let server = TestServer::start(CacheProvider::Absent).await;

    let (status, _) = server
        .call(Method::POST, "/api/items", Some(json!({"name": "a"})))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = server
        .call(Method::PUT, "/api/items/1", Some(json!({"name": ""})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.pointer("/error/code"), Some(&json!(1001)));
}

#[tokio::test]
async fn ephemeral_state_does_not_survive_restart() {
    let first = TestServer::start(CacheProvider::Absent).await;
    let (status, _) = first
        .call(Method::POST, "/api/items", Some(json!({"name": "a"})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    drop(first);

    let second = TestServer::start(CacheProvider::Absent).await;
    let (status, list) = second.call(Method::GET, "/api/items", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_get_distinct_ids() {
    const CALLERS: i64 = 150;
    let server = Arc::new(TestServer::start(CacheProvider::InProcess(MemoryCache::new())).await);

    let mut handles = Vec::new();
    for n in 0..CALLERS {
        let server = Arc::clone(&server);
        handles.push(tokio::spawn(async move {
            server
                .call(
                    Method::POST,
                    "/api/items",
                    Some(json!({"name": format!("item-{n}")})),
                )
                .await
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        let Ok((status, body)) = handle.await else {
            panic!("caller panicked");
        };
        assert_eq!(status, StatusCode::CREATED);
        let Some(id) = field(&body, "id").as_i64() else {
            panic!("missing id in {body}");
        };
        ids.insert(id);
    }
    assert_eq!(ids.len(), usize::try_from(CALLERS).unwrap_or_default());
    assert_eq!(ids, (1..=CALLERS).collect::<HashSet<_>>());

    let (_, list) = server.call(Method::GET, "/api/items", None).await;
    assert_eq!(list.as_array().map(Vec::len), Some(ids.len()));
}

#[tokio::test]
async fn health_does_not_need_backends() {
    let server = TestServer::start(CacheProvider::Absent).await;
    let (status, body) = server.call(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(field(&body, "status"), &json!("ok"));
    assert_eq!(field(&body, "store"), &json!("ephemeral"));
}
