use thiserror::Error;

use crate::gateway::GatewayError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Relay unavailable: {0}")]
    Unavailable(String),

    #[error("Relay rejected request (status {status}): {message}")]
    RelayRejected { status: u16, message: String },

    #[error("Relay internal error (status {status}): {message}")]
    RelayInternal { status: u16, message: String },

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Process failure: {0}")]
    ProcessFailure(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for failures of the key-value store itself.
    #[must_use]
    pub const fn is_store_failure(&self) -> bool {
        matches!(self, Self::Redis(_) | Self::Store(_))
    }
}

impl From<GatewayError> for Error {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Network(msg) => Self::Unavailable(msg),
            GatewayError::BadConfig { message } => Self::RelayRejected {
                status: 400,
                message,
            },
            GatewayError::NotFound { message } => Self::RelayRejected {
                status: 404,
                message,
            },
            GatewayError::Rejected { status, message } => Self::RelayRejected {
                status: status.as_u16(),
                message,
            },
            GatewayError::RelayInternal { status, message } => Self::RelayInternal {
                status: status.as_u16(),
                message,
            },
            GatewayError::UnexpectedStatus { status, .. } => {
                Self::Internal(format!("Unexpected relay status {status}"))
            }
            GatewayError::Parse(msg) => Self::Internal(format!("Malformed relay response: {msg}")),
            GatewayError::InvalidConfig(msg) => Self::Internal(format!("Relay client misconfigured: {msg}")),
            GatewayError::ResponseTooLarge { size } => {
                Self::Internal(format!("Relay response too large ({size} bytes)"))
            }
            GatewayError::ListingChanged(msg) => Self::Unavailable(msg),
        }
    }
}

impl From<Error> for tonic::Status {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidArgument(msg) => Self::invalid_argument(msg),
            Error::NotFound(msg) => Self::not_found(msg),
            Error::Unavailable(msg) => {
                tracing::error!("Relay unavailable: {msg}");
                Self::unavailable("Media relay is unavailable")
            }
            Error::RelayRejected { status, message } => {
                tracing::error!(status, "Relay rejected request: {message}");
                Self::failed_precondition(format!("Media relay rejected request: {status}"))
            }
            Error::RelayInternal { status, message } => {
                tracing::error!(status, "Relay internal error: {message}");
                Self::internal(format!("Media relay failed: {status}"))
            }
            other if other.is_store_failure() => {
                tracing::error!("Session store failure: {other}");
                Self::unknown("Session store failure")
            }
            other => {
                tracing::error!("Internal error: {other}");
                Self::internal("Internal error")
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
