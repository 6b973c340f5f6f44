//! workflow-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use workflow_gateway::api;
use workflow_gateway::app_state::AppState;
use workflow_gateway::config::{LogFormat, WorkflowConfig};
use workflow_gateway::store::{PostgresDocumentStore, PredicateIndex};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = WorkflowConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting workflow-gateway");

    // Build application state
    let app_state = if config.persistence_enabled {
        let store = PostgresDocumentStore::connect(&config).await?;
        let state = AppState::new(Arc::new(store), Arc::new(PredicateIndex::new()), &config);
        state.recover().await?;
        state
    } else {
        tracing::info!("persistence disabled, using in-memory document store");
        AppState::in_memory(&config)
    };

    // Build router
    let app = api::app(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
