//! Request dispatcher.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::api::{AuthApi, UsersApi};
use crate::credentials::AuthOptions;
use crate::error::{ApiError, Result};
use crate::normalize::{TransportFailure, normalize, parse_details};
use crate::refresh::RefreshCoordinator;
use crate::request::{
    Blob, FormField, Payload, PendingRequest, RequestConfig, RequestOptions, ResponseType,
    build_form,
};

/// Default timeout for requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default path prefix joined between the base URL and every request path.
const DEFAULT_API_PREFIX: &str = "api/";

/// HTTP client with bearer-token attachment and single-flight refresh.
///
/// Clones share one connection pool and one refresh coordinator.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use portico_client::{AuthOptions, HttpClient, MemoryCredentials};
///
/// # async fn example() -> portico_client::Result<()> {
/// let creds = Arc::new(MemoryCredentials::new());
/// let client = HttpClient::builder()
///     .base_url("http://localhost:8080")
///     .auth(AuthOptions::new(creds))
///     .build()?;
///
/// let profile = client.auth().profile().await?;
/// println!("{}", profile.result.name);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    http: reqwest::Client,
    base_url: Url,
    api_prefix: String,
    timeout: Duration,
    auth: Option<AuthOptions>,
    refresh: RefreshCoordinator,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("authenticated", &self.inner.auth.is_some())
            .finish()
    }
}

/// A fully read success response.
struct RawResponse {
    content_type: Option<String>,
    body: Vec<u8>,
}

impl HttpClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Default timeout applied to requests without their own.
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

        /// Refresh state shared by every clone of this client.
    pub fn refresh_coordinator(&self) -> &RefreshCoordinator {
        &self.inner.refresh
    }

    /// A client on the same connection pool that never attaches credentials.
    pub fn unauthenticated(&self) -> HttpClient {
        HttpClient {
            inner: Arc::new(ClientInner {
                http: self.inner.http.clone(),
                base_url: self.inner.base_url.clone(),
                api_prefix: self.inner.api_prefix.clone(),
                timeout: self.inner.timeout,
                auth: None,
                refresh: RefreshCoordinator::new(),
            }),
        }
    }

    /// Create a token for cancelling in-flight requests.
    ///
    /// Pass it through [`RequestOptions::cancel_token`]; cancelling it only
    /// affects the requests that carry it.
    pub fn cancellation_token(&self) -> CancellationToken {
        CancellationToken::new()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the authentication API.
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    /// Access the users API.
    pub fn users(&self) -> UsersApi {
        UsersApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Public HTTP methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Issue an arbitrary request and decode the body.
    pub async fn request<T: DeserializeOwned>(&self, config: RequestConfig) -> Result<T> {
        let response_type = config.options.response_type;
        let raw = self.execute(config).await?;
        decode(raw, response_type)
    }

    /// Make a GET request.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: Option<RequestOptions>,
    ) -> Result<T> {
        self.request(with_options(RequestConfig::new(Method::GET, path), options))
            .await
    }

    /// Make a POST request.
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        payload: impl Into<Payload>,
        options: Option<RequestOptions>,
    ) -> Result<T> {
        self.request(with_options(
            RequestConfig::new(Method::POST, path).payload(payload),
            options,
        ))
        .await
    }

    /// Make a PUT request.
    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        payload: impl Into<Payload>,
        options: Option<RequestOptions>,
    ) -> Result<T> {
        self.request(with_options(
            RequestConfig::new(Method::PUT, path).payload(payload),
            options,
        ))
        .await
    }

    /// Make a DELETE request.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: Option<RequestOptions>,
    ) -> Result<T> {
        self.request(with_options(RequestConfig::new(Method::DELETE, path), options))
            .await
    }

    /// POST `fields` as `multipart/form-data`.
    ///
    /// Any caller-supplied `Content-Type` is dropped; the multipart one with
    /// its boundary always wins.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        fields: Vec<FormField>,
        options: Option<RequestOptions>,
    ) -> Result<T> {
        let mut options = options.unwrap_or_default();
        options.headers.remove(CONTENT_TYPE);
        self.request(
            RequestConfig::new(Method::POST, path)
                .payload(Payload::Multipart(fields))
                .options(options),
        )
        .await
    }

    /// GET raw bytes without decoding the body.
    pub async fn download(&self, path: &str, options: Option<RequestOptions>) -> Result<Blob> {
        let raw = self
            .execute(with_options(RequestConfig::new(Method::GET, path), options))
            .await?;
        Ok(Blob::new(raw.body, raw.content_type))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Dispatch
    // ─────────────────────────────────────────────────────────────────────────

    /// Build a URL for an API path. Absolute URLs pass through untouched.
    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Url::parse(path).map_err(ApiError::from);
        }
        let path = path.trim_start_matches('/');
        self.inner
            .base_url
            .join(&format!("{}{}", self.inner.api_prefix, path))
            .map_err(ApiError::from)
    }

    async fn execute(&self, config: RequestConfig) -> Result<RawResponse> {
        let RequestConfig {
            method,
            path,
            payload,
            options,
        } = config;

        let mut request = PendingRequest::new(
            method,
            self.url(&path)?,
            options.timeout.unwrap_or(self.inner.timeout),
        );
        request.headers = options.headers;
        request.query = options.query;
        request.payload = payload;

        self.dispatch(request, options.cancel.as_ref()).await
    }

    /// Send once; on a 401 refresh through the coordinator and send once more.
    async fn dispatch(
        &self,
        mut request: PendingRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<RawResponse> {
        let failure = match self.send(&request, cancel).await? {
            Ok(raw) => return Ok(raw),
            Err(failure) => failure,
        };

        let auth = match &self.inner.auth {
            Some(auth)
                if failure.status() == Some(401) && auth.can_refresh() && !request.retried() =>
            {
                auth
            }
            _ => return Err(normalize(failure)),
        };

        request.mark_retried();
        let Some(token) = self.inner.refresh.refresh(auth, cancel).await? else {
            return Err(normalize(failure));
        };
        request.bearer = Some(token);

        // The retry's outcome is final, whatever it is.
        self.send(&request, cancel).await?.map_err(normalize)
    }

    /// Build and send `request`.
    ///
    /// The outer error is a request that could not be built; the inner one is
    /// what happened on the wire.
    async fn send(
        &self,
        request: &PendingRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<std::result::Result<RawResponse, TransportFailure>> {
        let built = self.build(request)?;
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            retried = request.retried(),
            "dispatching request"
        );

        let outcome = match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(TransportFailure::Canceled),
                    outcome = self.exchange(built) => outcome,
                }
            }
            None => self.exchange(built).await,
        };

        if let Err(failure) = &outcome {
            tracing::debug!(url = %request.url, ?failure, "request failed");
        }
        Ok(outcome)
    }

    fn build(&self, request: &PendingRequest) -> Result<reqwest::Request> {
        let mut headers = request.headers.clone();

        let token = request.bearer.clone().or_else(|| {
            self.inner
                .auth
                .as_ref()
                .and_then(|auth| auth.provider.access_token())
        });
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::invalid_request("access token is not a valid header value"))?;
            headers.insert(AUTHORIZATION, value);
        }

        if matches!(request.payload, Payload::Multipart(_)) {
            headers.remove(CONTENT_TYPE);
        }

        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), request.url.clone())
            .timeout(request.timeout)
            .headers(headers);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match &request.payload {
            Payload::Empty => builder,
            Payload::Json(value) => builder.json(value),
            Payload::Text(text) => builder.body(text.clone()),
            Payload::Multipart(fields) => builder.multipart(build_form(fields)?),
        };

        builder
            .build()
            .map_err(|e| ApiError::invalid_request(format!("failed to build request: {}", e)))
    }

    async fn exchange(
        &self,
        request: reqwest::Request,
    ) -> std::result::Result<RawResponse, TransportFailure> {
        let response = self.inner.http.execute(request).await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        if status.is_success() {
            Ok(RawResponse { content_type, body })
        } else {
            Err(TransportFailure::Status {
                status: status.as_u16(),
                body: parse_details(&body),
            })
        }
    }
}

fn with_options(config: RequestConfig, options: Option<RequestOptions>) -> RequestConfig {
    match options {
        Some(options) => config.options(options),
        None => config,
    }
}

fn decode<T: DeserializeOwned>(raw: RawResponse, response_type: ResponseType) -> Result<T> {
    let result = match response_type {
        ResponseType::Json if raw.body.is_empty() => {
            serde_json::from_value(serde_json::Value::Null)
        }
        ResponseType::Json => serde_json::from_slice(&raw.body),
        ResponseType::Text => serde_json::from_value(serde_json::Value::String(
            String::from_utf8_lossy(&raw.body).into_owned(),
        )),
    };
    result.map_err(|e| ApiError::decode(format!("failed to decode response body: {}", e)))
}

/// Builder for creating an [`HttpClient`].
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: Option<String>,
    api_prefix: String,
    timeout: Duration,
    user_agent: Option<String>,
    auth: Option<AuthOptions>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            auth: None,
        }
    }

    /// Set the base URL for the server.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the path prefix placed before every request path (default `api/`).
    pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Attach credentials (and optionally a refresher) to every request.
    pub fn auth(mut self, auth: AuthOptions) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<HttpClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| ApiError::invalid_request("base_url is required"))?;

        // Parse and normalize base URL
        let mut base_url = Url::parse(&base_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let prefix = self.api_prefix.trim_matches('/');
        let api_prefix = if prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", prefix)
        };

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("portico-client/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| ApiError::invalid_request(format!("failed to build HTTP client: {}", e)))?;

        Ok(HttpClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                api_prefix,
                timeout: self.timeout,
                auth: self.auth,
                refresh: RefreshCoordinator::new(),
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
