//! Users API.

use crate::client::HttpClient;
use crate::error::Result;
use crate::request::{Payload, RequestOptions};
use crate::types::{
    ApiResponse, CreateUserRequest, UpdateUserRequest, User, UserListResponse,
};

/// Query parameters for listing users.
#[derive(Debug, Clone, Default)]
pub struct ListUsersQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub keyword: Option<String>,
}

impl ListUsersQuery {
    fn into_options(self) -> RequestOptions {
        let mut options = RequestOptions::new();
        if let Some(page) = self.page {
            options = options.query("page", page);
        }
        if let Some(page_size) = self.page_size {
            options = options.query("pageSize", page_size);
        }
        if let Some(keyword) = self.keyword {
            options = options.query("keyword", keyword);
        }
        options
    }
}

/// Users API client.
pub struct UsersApi {
    client: HttpClient,
}

impl UsersApi {
    pub(crate) fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// List users.
    pub async fn list(&self, query: ListUsersQuery) -> Result<ApiResponse<UserListResponse>> {
        self.client.get("users", Some(query.into_options())).await
    }

    /// Get a user by ID.
    pub async fn get(&self, id: u64) -> Result<ApiResponse<User>> {
        self.client.get(&format!("users/{}", id), None).await
    }

    /// Create a user.
    pub async fn create(&self, request: &CreateUserRequest) -> Result<ApiResponse<User>> {
        self.client
            .post("users", Payload::json(request)?, None)
            .await
    }

    /// Update a user.
    pub async fn update(&self, id: u64, request: &UpdateUserRequest) -> Result<ApiResponse<User>> {
        self.client
            .put(&format!("users/{}", id), Payload::json(request)?, None)
            .await
    }

    /// Delete a user.
    pub async fn delete(&self, id: u64) -> Result<ApiResponse<serde_json::Value>> {
        self.client.delete(&format!("users/{}", id), None).await
    }
}
