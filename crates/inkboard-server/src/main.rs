//! Inkboard Server
//!
//! REST API for accounts and canvases plus the WebSocket relay that keeps
//! participants of a canvas in sync.
//!
//! ## Protocol
//!
//! Real-time messages are JSON of the form `{"event": <name>, "data": <payload>}`:
//! ```json
//! { "event": "joinCanvas", "data": { "canvasId": "...", "token": "..." } }
//! { "event": "drawingUpdate", "data": { "canvasId": "...", "elements": [] } }
//! { "event": "loadCanvas", "data": [] }
//! { "event": "receiveDrawingUpdate", "data": [] }
//! { "event": "unauthorized", "data": { "message": "..." } }
//! ```

mod config;
mod error;
mod routes;
mod state;
mod ws;

use config::{DEFAULT_LOG_FILTER, ServerConfig};
use state::AppState;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let state = Arc::new(AppState::new());
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("Inkboard server listening on {}", config.addr);
    info!("WebSocket endpoint: ws://{}/ws", config.addr);

    axum::serve(listener, app).await?;
    Ok(())
}
