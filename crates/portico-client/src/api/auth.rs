//! Authentication API.

use async_trait::async_trait;

use crate::client::HttpClient;
use crate::credentials::{TokenPair, TokenRefresher};
use crate::error::{ApiError, Result};
use crate::request::Payload;
use crate::types::{
    ApiResponse, LoginRequest, LoginResponse, RefreshTokenRequest, RefreshTokenResponse,
    UserProfile,
};

/// Authentication API client.
pub struct AuthApi {
    client: HttpClient,
}

impl AuthApi {
    pub(crate) fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Log in with email and password.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<ApiResponse<LoginResponse>> {
        self.client
            .post("auth/login", Payload::json(credentials)?, None)
            .await
    }

    /// Log out the current session.
    pub async fn logout(&self) -> Result<ApiResponse<serde_json::Value>> {
        self.client.post("auth/logout", Payload::Empty, None).await
    }

    /// Exchange a refresh token for a new token pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<ApiResponse<RefreshTokenResponse>> {
        let body = RefreshTokenRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.client
            .post("auth/refresh", Payload::json(&body)?, None)
            .await
    }

    /// Get the logged-in user's profile.
    pub async fn profile(&self) -> Result<ApiResponse<UserProfile>> {
        self.client.get("auth/profile", None).await
    }
}

/// [`TokenRefresher`] backed by the `auth/refresh` endpoint.
///
/// Uses an unauthenticated client so a refresh can never trigger another
/// refresh.
#[derive(Debug, Clone)]
pub struct ApiRefresher {
    client: HttpClient,
}

impl ApiRefresher {
    pub fn new(client: &HttpClient) -> Self {
        Self {
            client: client.unauthenticated(),
        }
    }
}

#[async_trait]
impl TokenRefresher for ApiRefresher {
    async fn refresh(&self, refresh_token: Option<String>) -> Result<TokenPair> {
        let refresh_token = refresh_token
            .ok_or_else(|| ApiError::invalid_request("no refresh token available"))?;
        let response = self.client.auth().refresh(&refresh_token).await?;
        Ok(TokenPair::new(
            response.result.access_token,
            response.result.refresh_token,
        ))
    }
}
