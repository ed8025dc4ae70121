use thiserror::Error;

use crate::api::ApiError;

/// Outcome taxonomy surfaced by the workflow layer. Every variant renders to
/// a message that can be shown as-is.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("{0}")]
    Validation(String),
    #[error("Face verification required")]
    AuthorizationRequired,
    #[error("{0}")]
    RemoteRejected(String),
    #[error("Connection problem. Check your network and try again")]
    Transport,
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl WorkflowError {
    /// Classify a transport-level failure. `fallback` names the action and is
    /// used when the server gave no message of its own.
    pub fn from_api(err: ApiError, fallback: &str) -> Self {
        match err {
            ApiError::Http { status, message } => match message {
                Some(message) if !message.trim().is_empty() => WorkflowError::RemoteRejected(message),
                _ => WorkflowError::RemoteRejected(format!("{fallback} (HTTP {status})")),
            },
            ApiError::Connectivity(_) => WorkflowError::Transport,
            ApiError::Decode(detail) => WorkflowError::Unexpected(detail),
        }
    }

    /// `success == false` in an otherwise well-formed response.
    pub fn rejected(message: Option<String>, fallback: &str) -> Self {
        match message {
            Some(message) if !message.trim().is_empty() => WorkflowError::RemoteRejected(message),
            _ => WorkflowError::RemoteRejected(fallback.to_string()),
        }
    }
}

pub type WorkflowResult<T> = std::result::Result<T, WorkflowError>;
