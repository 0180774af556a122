//! Account routes and bearer authentication.

use crate::error::ApiError;
use crate::state::AppState;
use axum::Json;
use axum::extract::{FromRequestParts, State};
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use inkboard_core::api::{Credentials, MessageResponse, TokenResponse};
use std::sync::Arc;

/// The caller identified by an `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// Token part of a bearer header value.
pub fn bearer_token(value: &str) -> Option<&str> {
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or(ApiError::Unauthorized)?;
        let user_id = state.authenticate(token).ok_or(ApiError::Unauthorized)?;
        Ok(Self { user_id })
    }
}

/// `POST /api/users/register`
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Credentials>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    state.register(&body.email, &body.password)?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User registered successfully".to_string(),
        }),
    ))
}

/// `POST /api/users/login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Credentials>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.login(&body.email, &body.password)?;
    Ok(Json(TokenResponse { token }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(email: &str, password: &str) -> Json<Credentials> {
        Json(Credentials {
            email: email.to_string(),
            password: password.to_string(),
        })
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Bearer   "), None);
        assert_eq!(bearer_token("Basic abc"), None);
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let state = Arc::new(AppState::new());
        let (status, _) = register(State(state.clone()), creds("ann@example.com", "pw"))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let Json(TokenResponse { token }) =
            login(State(state.clone()), creds("ann@example.com", "pw"))
                .await
                .unwrap();
        assert!(state.authenticate(&token).is_some());
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let state = Arc::new(AppState::new());
        let err = login(State(state), creds("who@example.com", "pw")).await.unwrap_err();
        assert_eq!(err, ApiError::UserNotFound);
    }

    #[tokio::test]
    async fn test_extractor_rejects_missing_and_unknown_tokens() {
        let state = Arc::new(AppState::new());
        let request = axum::http::Request::builder().body(()).unwrap();
        let (mut parts, _) = request.into_parts();
        let err = AuthUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err, ApiError::Unauthorized);

        let request = axum::http::Request::builder()
            .header(AUTHORIZATION, "Bearer nope")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        let err = AuthUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err, ApiError::Unauthorized);
    }
}
