//! API endpoint implementations.

mod auth;
mod users;

pub use auth::{ApiRefresher, AuthApi};
pub use users::{ListUsersQuery, UsersApi};
