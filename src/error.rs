//! Crate-wide error taxonomy.
//!
//! Every failure in this layer resolves to a [`ClientError`]; nothing here
//! panics or leaks an unhandled rejection to the caller. The type is `Clone`
//! so that de-duplicated waiters on a shared in-flight fetch can all receive
//! the same outcome.

use thiserror::Error;

/// All the ways a client-side operation can fail.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// No response was received at all (DNS, connect, timeout, ...).
    #[error("network failure: {0}")]
    Network(String),

    /// The server answered, but with `success: false` or a non-2xx status.
    #[error("{message}")]
    Api {
        /// HTTP status, when one was received.
        status: Option<u16>,
        /// Server-provided message, or a generic fallback.
        message: String,
    },

    /// A client-side field check failed; no request was sent.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The session check failed; the route guard reacts with a redirect.
    #[error("session is not valid")]
    SessionInvalid,

    /// The environment or derived configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// The live update channel could not be set up or fell over.
    #[error("live channel error: {0}")]
    Channel(String),
}

impl ClientError {
    /// Shorthand for an API failure without an HTTP status.
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            status: None,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::Api {
                status: Some(status.as_u16()),
                message: err.to_string(),
            },
            None => Self::Network(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::api(format!("unexpected payload shape: {err}"))
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}
