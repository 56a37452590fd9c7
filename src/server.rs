//! HTTP serving with bounded graceful shutdown.

use std::future::{Future, IntoFuture};
use std::time::Duration;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Serves `app` until `signal` resolves, then stops accepting connections
/// and gives in-flight requests up to `grace` to finish before returning.
///
/// Handlers still running when the grace period ends are dropped and their
/// callers receive `503 Service Unavailable`.
///
/// # Errors
///
/// Returns an I/O error if the listener fails.
pub async fn serve_until<F>(
    listener: TcpListener,
    app: Router,
    grace: Duration,
    signal: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (signalled_tx, mut signalled) = watch::channel(false);
    let (cut_tx, cut_rx) = watch::channel(false);

    let app = app.layer(middleware::from_fn_with_state(cut_rx, cut_off_after_grace));
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        signal.await;
        tracing::info!("shutdown signal received, draining in-flight requests");
        signalled_tx.send_replace(true);
    });

    let grace_elapsed = async move {
        while !*signalled.borrow_and_update() {
            if signalled.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server.into_future() => result,
        () = grace_elapsed => {
            tracing::warn!(
                grace_ms = u64::try_from(grace.as_millis()).unwrap_or(u64::MAX),
                "grace period elapsed, dropping in-flight requests"
            );
            cut_tx.send_replace(true);
            Ok(())
        }
    }
}

/// Races the request against the end of the grace period.
async fn cut_off_after_grace(
    State(mut cut): State<watch::Receiver<bool>>,
    request: Request,
    next: Next,
) -> Response {
    let cut_signal = async move {
        // a closed channel means the server is gone, which also ends the request
        while !*cut.borrow_and_update() {
            if cut.changed().await.is_err() {
                break;
            }
        }
    };

    tokio::select! {
        response = next.run(request) => response,
        () = cut_signal => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
