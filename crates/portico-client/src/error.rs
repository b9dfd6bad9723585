//! Client error types.

use serde::Serialize;
use thiserror::Error;

/// Classification of a normalized error.
///
/// At most one of the transport flags (`Canceled`, `Timeout`, `Network`) can
/// apply to a single error; `Http` is the plain status-code case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The caller cancelled the request.
    Canceled,
    /// No response arrived before the request deadline.
    Timeout,
    /// No response arrived for any other reason.
    Network,
    /// The server answered with a non-success status.
    Http,
    /// The request could not be built (bad URL, header or payload).
    InvalidRequest,
    /// A success body could not be decoded into the requested type.
    Decode,
}

/// Uniform error returned by every dispatcher operation.
///
/// Whatever went wrong underneath (a dropped connection, a deadline, a 500),
/// callers always see this one shape.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{message}")]
pub struct ApiError {
    /// What kind of failure this is.
    pub kind: ErrorKind,
    /// HTTP status code, when a response was received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Short machine-readable code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Human-readable message.
    pub message: String,
    /// Error body returned by the server, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            code: None,
            message: message.into(),
            details: None,
        }
    }

    /// Error for a request that could not be constructed.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    /// Error for a success body that failed to decode.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, message)
    }

    /// True if no response was received (and it was not a timeout).
    pub fn is_network_error(&self) -> bool {
        self.kind == ErrorKind::Network
    }

    /// True if the request exceeded its deadline.
    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }

    /// True if the caller cancelled the request.
    pub fn is_canceled(&self) -> bool {
        self.kind == ErrorKind::Canceled
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        self.status == Some(401)
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self.status, Some(status) if status >= 500)
    }
}

impl From<url::ParseError> for ApiError {
    fn from(e: url::ParseError) -> Self {
        ApiError::invalid_request(format!("invalid URL: {}", e))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::invalid_request(format!("failed to serialize payload: {}", e))
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ApiError>;
