//! dispatch-gateway server entry point.
//!
//! Starts the Axum server with the WebSocket matching endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use dispatch_gateway::api;
use dispatch_gateway::app_state::AppState;
use dispatch_gateway::config::MatcherConfig;
use dispatch_gateway::domain::ProfileDirectory;
use dispatch_gateway::service::{MatchService, UniformArrival};
use dispatch_gateway::ws::Dispatcher;
use dispatch_gateway::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = MatcherConfig::from_env().map_err(|e| anyhow::anyhow!(e.to_string()))?;
    tracing::info!(addr = %config.listen_addr, "starting dispatch-gateway");

    // Load the external profile directory
    let directory = match &config.profile_path {
        Some(path) => {
            let loaded = ProfileDirectory::from_json_file(path)
                .map_err(|e| anyhow::anyhow!("failed to load {}: {e}", path.display()))?;
            tracing::info!(
                path = %path.display(),
                drivers = loaded.driver_count(),
                users = loaded.user_count(),
                "profile directory loaded"
            );
            loaded
        }
        None => ProfileDirectory::sample(),
    };

    // Build the dispatcher over empty state
    let estimator = UniformArrival::new(config.arrival_min_minutes, config.arrival_max_minutes);
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(directory),
        MatchService::new(Arc::new(estimator)),
        Duration::from_secs(config.remind_delay_secs),
    ));

    // Build application state
    let app_state = AppState { dispatcher };

    // Build router
    let app = Router::new()
        .merge(api::routes())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
