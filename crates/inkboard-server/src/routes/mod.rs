//! Router assembly.

pub mod auth;
pub mod canvas;

use crate::state::AppState;
use crate::ws;
use axum::Router;
use axum::routing::{delete, get, post, put};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/users/register", post(auth::register))
        .route("/api/users/login", post(auth::login))
        .route("/api/canvas/list", get(canvas::list))
        .route("/api/canvas/create", post(canvas::create))
        .route("/api/canvas/delete/{id}", delete(canvas::remove))
        .route("/api/canvas/share/{id}", put(canvas::share))
        .route("/api/canvas/load/{id}", get(canvas::load))
        .route("/ws", get(ws::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Index page
async fn index() -> &'static str {
    "Inkboard Server - REST under /api, real-time channel at /ws"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}
