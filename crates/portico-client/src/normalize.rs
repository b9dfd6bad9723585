//! Mapping of transport failures onto [`ApiError`].

use crate::error::{ApiError, ErrorKind};

/// A failure as observed at the transport boundary, before normalization.
#[derive(Debug, Clone)]
pub enum TransportFailure {
    /// The caller's cancellation token fired.
    Canceled,
    /// The request deadline elapsed without a response.
    Timeout,
    /// No response was received.
    Network(String),
    /// The server responded with a non-success status.
    Status {
        status: u16,
        body: Option<serde_json::Value>,
    },
}

impl TransportFailure {
    /// HTTP status, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportFailure::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportFailure::Timeout
        } else if let Some(status) = e.status() {
            TransportFailure::Status {
                status: status.as_u16(),
                body: None,
            }
        } else {
            TransportFailure::Network(e.to_string())
        }
    }
}

/// Human-readable message for well-known error statuses.
pub fn status_message(status: u16) -> Option<&'static str> {
    let message = match status {
        400 => "bad request (400)",
        401 => "unauthorized, please log in again (401)",
        403 => "access denied (403)",
        404 => "resource not found (404)",
        408 => "request timeout (408)",
        500 => "internal server error (500)",
        501 => "not implemented (501)",
        502 => "bad gateway (502)",
        503 => "service unavailable (503)",
        504 => "gateway timeout (504)",
        505 => "HTTP version not supported (505)",
        _ => return None,
    };
    Some(message)
}

fn status_code(status: u16) -> Option<&'static str> {
    match status {
        400..=499 => Some("ERR_BAD_REQUEST"),
        500..=599 => Some("ERR_BAD_RESPONSE"),
        _ => None,
    }
}

/// Normalize a transport failure.
///
/// Cancellation is checked first, then the no-response cases, then the
/// status lookup.
pub fn normalize(failure: TransportFailure) -> ApiError {
    match failure {
        TransportFailure::Canceled => ApiError::new(ErrorKind::Canceled, "request canceled"),
        TransportFailure::Timeout => ApiError::new(ErrorKind::Timeout, "request timed out"),
        TransportFailure::Network(_) => ApiError::new(ErrorKind::Network, "network error"),
        TransportFailure::Status { status, body } => ApiError {
            kind: ErrorKind::Http,
            status: Some(status),
            code: status_code(status).map(str::to_string),
            message: status_message(status)
                .map(str::to_string)
                .unwrap_or_else(|| format!("connection error ({})", status)),
            details: body,
        },
    }
}

/// Parse an error body into `details`: JSON when possible, raw text otherwise.
pub(crate) fn parse_details(bytes: &[u8]) -> Option<serde_json::Value> {
    if bytes.is_empty() {
        return None;
    }
    serde_json::from_slice(bytes).ok().or_else(|| {
        Some(serde_json::Value::String(
            String::from_utf8_lossy(bytes).into_owned(),
        ))
    })
}
