//! Request descriptors: payloads, per-call options and the pending request.

use std::time::Duration;

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{ApiError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Body sent with a request.
#[derive(Debug, Clone, Default)]
pub enum Payload {
    /// No body.
    #[default]
    Empty,
    /// JSON body (`Content-Type: application/json` unless overridden).
    Json(serde_json::Value),
    /// Raw text body.
    Text(String),
    /// Multipart form body.
    Multipart(Vec<FormField>),
}

impl Payload {
    /// Serialize any value into a JSON payload.
    pub fn json<B: Serialize + ?Sized>(body: &B) -> Result<Self> {
        Ok(Payload::Json(serde_json::to_value(body)?))
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Payload::Json(value)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

/// A single multipart field value.
#[derive(Debug, Clone)]
pub enum FormValue {
    Text(String),
    File {
        bytes: Vec<u8>,
        file_name: String,
        mime: String,
    },
}

impl FormValue {
    pub fn text(value: impl Into<String>) -> Self {
        FormValue::Text(value.into())
    }

    /// A file part; the MIME type is guessed from the file name.
    pub fn file(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        FormValue::File {
            bytes,
            file_name,
            mime,
        }
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        FormValue::Text(value)
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        FormValue::Text(value.to_string())
    }
}

/// Named multipart field.
#[derive(Debug, Clone)]
pub struct FormField {
    pub name: String,
    pub value: FormValue,
}

impl FormField {
    pub fn new(name: impl Into<String>, value: impl Into<FormValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

pub(crate) fn build_form(fields: &[FormField]) -> Result<reqwest::multipart::Form> {
    let mut form = reqwest::multipart::Form::new();
    for field in fields {
        form = match &field.value {
            FormValue::Text(text) => form.text(field.name.clone(), text.clone()),
            FormValue::File {
                bytes,
                file_name,
                mime,
            } => {
                let part = reqwest::multipart::Part::bytes(bytes.clone())
                    .file_name(file_name.clone())
                    .mime_str(mime)
                    .map_err(|e| {
                        ApiError::invalid_request(format!("invalid MIME type '{}': {}", mime, e))
                    })?;
                form.part(field.name.clone(), part)
            }
        };
    }
    Ok(form)
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-call options
// ─────────────────────────────────────────────────────────────────────────────

/// How a success body is decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseType {
    /// Parse as JSON; an empty body decodes as `null`.
    #[default]
    Json,
    /// Treat the body as a UTF-8 string.
    Text,
}

/// Optional per-call configuration.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub cancel: Option<CancellationToken>,
    pub timeout: Option<Duration>,
    pub response_type: ResponseType,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header. Invalid names or values are rejected.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ApiError::invalid_request(format!("invalid header name '{}'", name)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| ApiError::invalid_request(format!("invalid value for header '{}'", name)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Cancel the request when `token` fires.
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }
}

/// Full description of a request for [`HttpClient::request`](crate::HttpClient::request).
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub method: Method,
    pub path: String,
    pub payload: Payload,
    pub options: RequestOptions,
}

impl RequestConfig {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            payload: Payload::Empty,
            options: RequestOptions::default(),
        }
    }

    pub fn payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pending request
// ─────────────────────────────────────────────────────────────────────────────

/// An outbound request as the dispatcher tracks it across a retry.
#[derive(Debug, Clone)]
pub(crate) struct PendingRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub payload: Payload,
    pub timeout: Duration,
    /// Token to use instead of asking the provider (set after a refresh).
    pub bearer: Option<String>,
    retried: bool,
}

impl PendingRequest {
    pub fn new(method: Method, url: Url, timeout: Duration) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            query: Vec::new(),
            payload: Payload::Empty,
            timeout,
            bearer: None,
            retried: false,
        }
    }

    pub fn retried(&self) -> bool {
        self.retried
    }

    /// Flag the request as retried. There is no way back.
    pub fn mark_retried(&mut self) {
        self.retried = true;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Blob
// ─────────────────────────────────────────────────────────────────────────────

/// Raw bytes returned by [`HttpClient::download`](crate::HttpClient::download).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    bytes: Vec<u8>,
    content_type: Option<String>,
}

impl Blob {
    pub fn new(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            bytes,
            content_type,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
