use async_trait::async_trait;

use crate::errors::Result;
use crate::models::{Email, User};

/// Default page size for user listings
pub const FILTER_USERS_DEFAULT_LIMIT: u32 = 50;
/// Default page size for email listings
pub const FILTER_EMAILS_DEFAULT_LIMIT: u32 = 50;

/// Input for filtering users
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterUsers {
    /// Only the user owning this address
    pub email: Option<String>,
    pub offset: u32,
    pub limit: u32,
}

/// Input for filtering emails
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterEmails {
    pub email_id: Option<i64>,
    pub user_id: Option<i64>,
    pub offset: u32,
    pub limit: u32,
}

/// Storage abstraction for users and emails.
///
/// Constraint violations surface as the well-known client errors:
/// `ERR_ALREADY_EXISTS` for duplicates and `ERR_NOT_FOUND` for missing rows.
#[async_trait]
pub trait DatabaseBackend: Send + Sync {
    /// Insert a user and return its ID
    async fn add_user(&self, name: &str, password_hash: &str) -> Result<i64>;

    /// Remove a user together with all of their emails
    async fn delete_user(&self, user_id: i64) -> Result<()>;

    /// IDs of the users matching the filter, ordered by ID
    async fn filter_users_id(&self, filter: &FilterUsers) -> Result<Vec<i64>>;

    /// Load users by ID; unknown IDs are skipped
    async fn fetch_users(&self, ids: &[i64]) -> Result<Vec<User>>;

    /// Insert an email for a user and return its ID
    async fn add_email(&self, user_id: i64, address: &str) -> Result<i64>;

    /// Remove an email
    async fn delete_email(&self, email_id: i64) -> Result<()>;

    /// Emails matching the filter, ordered by ID
    async fn filter_emails(&self, filter: &FilterEmails) -> Result<Vec<Email>>;

    /// Test database connection
    async fn test_connection(&self) -> Result<()>;
}
