//! REST client for accounts and canvas management.
//!
//! Calls are blocking and made one at a time. Local preconditions (password
//! confirmation, share email, canvas selection, stored token) are checked
//! before any request is built, so a failed check never touches the network.

use crate::config::ClientConfig;
use crate::credentials::TokenStore;
use crate::elements::DrawingElement;
use crate::error::{
    AuthError, ClientError, ClientResult, GENERIC_ERROR_MESSAGE, NetworkError, ValidationError,
};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

/// Login and registration body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// One entry of the canvas list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSummary {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub shared: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCanvasResponse {
    #[serde(rename = "canvasId")]
    pub canvas_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRequest {
    pub email: String,
}

/// Plain acknowledgement, also the usual error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasContents {
    #[serde(default)]
    pub elements: Vec<DrawingElement>,
}

/// Error bodies come as `{message}` or `{error}`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Pick the server's explanation out of an error body, or the generic notice.
pub fn error_message(body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .message
        .into_iter()
        .chain(parsed.error)
        .find(|m| !m.trim().is_empty())
        .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string())
}

fn rejection(status: StatusCode, body: &str) -> ClientError {
    let message = error_message(body);
    if status == StatusCode::UNAUTHORIZED {
        AuthError::Rejected(message).into()
    } else {
        NetworkError::Server {
            status: status.as_u16(),
            message,
        }
        .into()
    }
}

/// Blocking client for the REST endpoints.
pub struct ApiClient {
    http: Client,
    base_url: Url,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    pub fn new(base_url: Url, tokens: Arc<dyn TokenStore>) -> ClientResult<Self> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    pub fn from_config(config: &ClientConfig, tokens: Arc<dyn TokenStore>) -> ClientResult<Self> {
        Self::new(config.api_url.clone(), tokens)
    }

    /// Client for the API named by `INKBOARD_API_URL`, or the local default.
    pub fn from_env(tokens: Arc<dyn TokenStore>) -> ClientResult<Self> {
        let config = ClientConfig::from_env()?;
        Self::from_config(&config, tokens)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Sign in and store the returned token.
    pub fn login(&self, email: &str, password: &str) -> ClientResult<()> {
        let body = credentials(email, password)?;
        let response: TokenResponse =
            self.call(self.request(Method::POST, "/api/users/login").json(&body))?;
        self.tokens.save(&response.token)?;
        log::info!("signed in as {}", email);
        Ok(())
    }

    /// Create an account. The caller signs in separately.
    pub fn register(&self, email: &str, password: &str, confirm: &str) -> ClientResult<()> {
        let body = credentials(email, password)?;
        if password != confirm {
            return Err(ValidationError::PasswordMismatch.into());
        }
        self.execute(self.request(Method::POST, "/api/users/register").json(&body))?;
        log::info!("registered {}", email);
        Ok(())
    }

    /// Forget the stored token.
    pub fn logout(&self) -> ClientResult<()> {
        self.tokens.clear()?;
        Ok(())
    }

    pub fn list_canvases(&self) -> ClientResult<Vec<CanvasSummary>> {
        let request = self.authorized(Method::GET, "/api/canvas/list")?;
        self.call(request)
    }

    /// Create an empty canvas and return its id.
    pub fn create_canvas(&self) -> ClientResult<String> {
        let request = self.authorized(Method::POST, "/api/canvas/create")?;
        let response: CreateCanvasResponse = self.call(request)?;
        log::info!("created canvas {}", response.canvas_id);
        Ok(response.canvas_id)
    }

    pub fn delete_canvas(&self, canvas_id: Option<&str>) -> ClientResult<()> {
        let canvas_id = selected(canvas_id)?;
        let request = self.authorized(Method::DELETE, &format!("/api/canvas/delete/{canvas_id}"))?;
        self.execute(request)?;
        log::info!("deleted canvas {}", canvas_id);
        Ok(())
    }

    /// Grant edit rights on a canvas to another account.
    pub fn share_canvas(&self, canvas_id: Option<&str>, email: &str) -> ClientResult<String> {
        let canvas_id = selected(canvas_id)?;
        let email = email.trim();
        if email.is_empty() {
            return Err(ValidationError::EmptyShareEmail.into());
        }
        let request = self
            .authorized(Method::PUT, &format!("/api/canvas/share/{canvas_id}"))?
            .json(&ShareRequest {
                email: email.to_string(),
            });
        let response: MessageResponse = self.call(request)?;
        Ok(response.message)
    }

    pub fn load_canvas(&self, canvas_id: &str) -> ClientResult<Vec<DrawingElement>> {
        let request = self.authorized(Method::GET, &format!("/api/canvas/load/{canvas_id}"))?;
        let contents: CanvasContents = self.call(request)?;
        Ok(contents.elements)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    fn authorized(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let token = self.tokens.load()?.ok_or(AuthError::MissingToken)?;
        Ok(self.request(method, path).bearer_auth(token))
    }

    fn execute(&self, request: RequestBuilder) -> ClientResult<Response> {
        let response = request.send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        log::warn!("request failed with {}: {}", status, body);
        Err(rejection(status, &body))
    }

    fn call<R: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<R> {
        Ok(self.execute(request)?.json()?)
    }
}

fn credentials(email: &str, password: &str) -> ClientResult<Credentials> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingCredentials.into());
    }
    Ok(Credentials {
        email: email.to_string(),
        password: password.to_string(),
    })
}

fn selected(canvas_id: Option<&str>) -> ClientResult<&str> {
    canvas_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ValidationError::NoCanvasSelected.into())
}
