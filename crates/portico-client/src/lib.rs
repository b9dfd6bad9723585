//! HTTP request layer with coordinated bearer-token refresh.
//!
//! [`HttpClient`] attaches the current access token to every request. When a
//! request comes back 401 and a [`TokenRefresher`] is configured, the client
//! refreshes once (no matter how many requests failed at the same time),
//! retries the request once with the new token, and hands the caller either
//! the decoded body or an [`ApiError`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use portico_client::{ApiRefresher, AuthOptions, HttpClient, MemoryCredentials, Result};
//!
//! # async fn example() -> Result<()> {
//! let creds = Arc::new(MemoryCredentials::new());
//! let plain = HttpClient::builder().base_url("http://localhost:8080").build()?;
//! let client = HttpClient::builder()
//!     .base_url("http://localhost:8080")
//!     .auth(AuthOptions::new(creds).with_refresher(Arc::new(ApiRefresher::new(&plain))))
//!     .build()?;
//!
//! let users = client.users().list(Default::default()).await?;
//! println!("{} users", users.result.total);
//! # Ok(())
//! # }
//! ```
//!
//! # Components
//!
//! - [`normalize`] - maps transport failures onto [`ApiError`]
//! - [`credentials`] - token providers and the refresher trait
//! - [`refresh`] - single-flight refresh coordination
//! - [`client`] - the dispatcher
//! - [`api`] - auth and users endpoints

pub mod api;
pub mod client;
pub mod credentials;
pub mod error;
pub mod normalize;
pub mod refresh;
pub mod request;
pub mod types;

pub use api::{ApiRefresher, AuthApi, ListUsersQuery, UsersApi};
pub use client::{ClientBuilder, DEFAULT_TIMEOUT, HttpClient};
pub use credentials::{
    AuthOptions, CredentialProvider, FileCredentials, MemoryCredentials, TokenPair,
    TokenRefresher,
};
pub use error::{ApiError, ErrorKind, Result};
pub use normalize::{TransportFailure, normalize};
pub use refresh::RefreshCoordinator;
pub use request::{Blob, FormField, FormValue, Payload, RequestConfig, RequestOptions, ResponseType};
pub use types::*;

pub use tokio_util::sync::CancellationToken;
