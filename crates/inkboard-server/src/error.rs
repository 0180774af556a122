//! REST error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failures reported to API callers.
///
/// Account routes answer with `{"message": ...}`, canvas routes with
/// `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Email and password are required")]
    MissingCredentials,
    #[error("User already exists")]
    EmailTaken,
    #[error("User not found")]
    UserNotFound,
    #[error("Invalid credentials")]
    InvalidPassword,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Canvas not found")]
    CanvasNotFound,
    #[error("Access denied")]
    Forbidden,
    #[error("User to share with not found")]
    ShareTargetNotFound,
    #[error("Canvas is already owned by this user")]
    ShareWithOwner,
    #[error("Email is required")]
    MissingShareEmail,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingCredentials
            | ApiError::EmailTaken
            | ApiError::InvalidPassword
            | ApiError::ShareWithOwner
            | ApiError::MissingShareEmail => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::UserNotFound | ApiError::CanvasNotFound | ApiError::ShareTargetNotFound => {
                StatusCode::NOT_FOUND
            }
        }
    }

    fn body_key(&self) -> &'static str {
        match self {
            ApiError::MissingCredentials
            | ApiError::EmailTaken
            | ApiError::UserNotFound
            | ApiError::InvalidPassword
            | ApiError::Unauthorized => "message",
            _ => "error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = serde_json::Map::new();
        body.insert(self.body_key().to_string(), self.to_string().into());
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::CanvasNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::EmailTaken.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_body_key_matches_route_family() {
        assert_eq!(ApiError::UserNotFound.body_key(), "message");
        assert_eq!(ApiError::CanvasNotFound.body_key(), "error");
        assert_eq!(ApiError::ShareTargetNotFound.body_key(), "error");
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::CanvasNotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
