//! item-gateway server entry point.
//!
//! Loads configuration, settles the backends, and serves the HTTP API
//! until a termination signal arrives.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use item_gateway::api;
use item_gateway::app_state::AppState;
use item_gateway::config::GatewayConfig;
use item_gateway::degradation;
use item_gateway::server;
use item_gateway::service::ItemService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    tracing::info!(addr = %config.listen_addr, "starting item-gateway");

    // Settle backends
    let backends = degradation::bootstrap(&config).await?;
    let store = backends.store.clone();

    // Build service layer and application state
    let item_service = Arc::new(ItemService::new(
        backends.store,
        backends.cache,
        config.cache_ttl,
    ));
    let app = api::build_app(AppState { item_service }, &config.static_dir);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    server::serve_until(
        listener,
        app,
        config.shutdown_grace,
        server::shutdown_signal(),
    )
    .await?;

    if tokio::time::timeout(config.shutdown_grace, store.close())
        .await
        .is_err()
    {
        tracing::warn!("store connections did not close within the grace period");
    }
    tracing::info!("shutdown complete");
    Ok(())
}
