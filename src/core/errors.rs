use crate::core::types::Reason;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BitstampError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Non-2xx answer to an unsigned GET.
    #[error("{status} ({url})")]
    RequestFailed {
        code: u16,
        status: String,
        body: String,
        url: String,
    },

    /// Non-2xx answer to a signed call whose body carried both `code` and `reason`.
    #[error("{code} {reason} ({status})")]
    ApiError {
        status: u16,
        code: String,
        reason: Reason,
    },

    #[error("{body} ({status})")]
    HttpStatus { status: u16, body: String },

    #[error("service unavailable")]
    ServiceUnavailable,

    #[error("server signature mismatch: us ({expected}) them ({received})")]
    SignatureMismatch { expected: String, received: String },

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Connection timeout: {0}")]
    ConnectionTimeout(String),

    #[error("no frame received within {0:?}")]
    ReadTimeout(Duration),

    #[error("websocket connection closed")]
    ConnectionClosed,

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// The exchange answered 200 but reported `"status": "error"` in the body.
    #[error("error {context}: {reason}")]
    OrderRejected { context: String, reason: Reason },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),
}

impl BitstampError {
    /// True for errors that mean the websocket session is gone for good.
    pub fn is_connection_closed(&self) -> bool {
        matches!(self, Self::ConnectionClosed)
    }
}
