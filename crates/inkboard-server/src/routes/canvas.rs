//! Canvas management routes. All of them require a bearer token.

use crate::error::ApiError;
use crate::routes::auth::AuthUser;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use inkboard_core::api::{
    CanvasContents, CanvasSummary, CreateCanvasResponse, MessageResponse, ShareRequest,
};
use std::sync::Arc;

/// `GET /api/canvas/list`
pub async fn list(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Json<Vec<CanvasSummary>> {
    Json(state.list_canvases(&auth.user_id))
}

/// `POST /api/canvas/create`
pub async fn create(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> (StatusCode, Json<CreateCanvasResponse>) {
    let canvas_id = state.create_canvas(&auth.user_id);
    (StatusCode::CREATED, Json(CreateCanvasResponse { canvas_id }))
}

/// `DELETE /api/canvas/delete/{id}`
pub async fn remove(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(canvas_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.delete_canvas(&auth.user_id, &canvas_id)?;
    Ok(Json(MessageResponse {
        message: "Canvas deleted".to_string(),
    }))
}

/// `PUT /api/canvas/share/{id}`
pub async fn share(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(canvas_id): Path<String>,
    Json(body): Json<ShareRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if body.email.trim().is_empty() {
        return Err(ApiError::MissingShareEmail);
    }
    let message = state.share_canvas(&auth.user_id, &canvas_id, &body.email)?;
    Ok(Json(MessageResponse { message }))
}

/// `GET /api/canvas/load/{id}`
pub async fn load(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(canvas_id): Path<String>,
) -> Result<Json<CanvasContents>, ApiError> {
    let elements = state.load_canvas(&auth.user_id, &canvas_id)?;
    Ok(Json(CanvasContents { elements }))
}
