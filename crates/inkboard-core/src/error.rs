//! Client error taxonomy.
//!
//! Every network or channel failure is caught where the call is made and
//! turned into one of these values; nothing is retried.

use crate::board::BoardError;
use crate::config::ConfigError;
use crate::credentials::StorageError;
use thiserror::Error;

/// Message shown when the server gives no usable explanation.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";

/// Missing or rejected credential.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("not signed in")]
    MissingToken,
    #[error("credential rejected: {0}")]
    Rejected(String),
}

/// Request or channel failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// The server answered with an error status.
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("channel error: {0}")]
    Channel(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for NetworkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            NetworkError::Decode(e.to_string())
        } else {
            NetworkError::Transport(e.to_string())
        }
    }
}

/// Local precondition failures, raised before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("email and password are required")]
    MissingCredentials,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("enter an email to share with")]
    EmptyShareEmail,
    #[error("no canvas selected")]
    NoCanvasSelected,
}

/// Any failure surfaced by the client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// Edit rights were revoked for the current canvas.
    #[error("not authorized: {0}")]
    Authorization(String),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    State(#[from] BoardError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Network(e.into())
    }
}

impl ClientError {
    /// Text for a blocking notice.
    pub fn notice(&self) -> String {
        match self {
            ClientError::Network(NetworkError::Server { message, .. })
                if !message.trim().is_empty() =>
            {
                message.clone()
            }
            ClientError::Network(_) => GENERIC_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// Whether the user has to sign in again.
    pub fn needs_reauthentication(&self) -> bool {
        matches!(self, ClientError::Auth(_))
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
