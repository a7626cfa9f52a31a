//! Media relay client error types

use reqwest::StatusCode;
use thiserror::Error;

/// Maximum response body size accepted from the relay (16 MB).
pub const MAX_RESPONSE_SIZE: usize = 16 * 1024 * 1024;

/// Longest slice of a relay error body kept in error messages.
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport failure or timeout talking to the relay.
    #[error("Network error: {0}")]
    Network(String),

    /// Relay answered 400: the path configuration was refused.
    #[error("Relay rejected path configuration: {message}")]
    BadConfig { message: String },

    /// Relay answered 404: the path does not exist.
    #[error("Relay path not found: {message}")]
    NotFound { message: String },

    #[error("Relay rejected request ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Relay internal error ({status}): {message}")]
    RelayInternal { status: StatusCode, message: String },

    #[error("Unexpected relay status {status}: {message}")]
    UnexpectedStatus { status: StatusCode, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Response too large ({size} bytes, max {MAX_RESPONSE_SIZE})")]
    ResponseTooLarge { size: u64 },

    /// Session list changed between page fetches; the pages read do not
    /// add up to one listing.
    #[error("Session list changed while paging: {0}")]
    ListingChanged(String),
}

impl GatewayError {
    /// Classify a non-success status and the body the relay sent with it.
    #[must_use]
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = error_message(body);
        match status {
            StatusCode::BAD_REQUEST => Self::BadConfig { message },
            StatusCode::NOT_FOUND => Self::NotFound { message },
            s if s.is_client_error() => Self::Rejected { status, message },
            s if s.is_server_error() => Self::RelayInternal { status, message },
            _ => Self::UnexpectedStatus { status, message },
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Pull the `error` field out of a relay error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());

    if message.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !message.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &message[..end])
    } else {
        message
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
