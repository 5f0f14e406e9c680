pub mod connection;
pub mod queries;

use async_trait::async_trait;

use crate::db::backend::{DatabaseBackend, FilterEmails, FilterUsers};
use crate::db::sqlite::connection::SqlitePool;
use crate::errors::Result;
use crate::models::{Email, User};

pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    pub fn new(pool: SqlitePool) -> anyhow::Result<Self> {
        // Initialize schema on creation
        connection::init_schema(&pool)?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run a blocking query on the blocking thread pool
    async fn run<T, F>(&self, query: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&SqlitePool) -> Result<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || query(&pool)).await?
    }
}

#[async_trait]
impl DatabaseBackend for SqliteBackend {
    async fn add_user(&self, name: &str, password_hash: &str) -> Result<i64> {
        let name = name.to_string();
        let password_hash = password_hash.to_string();
        self.run(move |pool| queries::add_user(pool, &name, &password_hash))
            .await
    }

    async fn delete_user(&self, user_id: i64) -> Result<()> {
        self.run(move |pool| queries::delete_user(pool, user_id)).await
    }

    async fn filter_users_id(&self, filter: &FilterUsers) -> Result<Vec<i64>> {
        let filter = filter.clone();
        self.run(move |pool| queries::filter_users_id(pool, &filter))
            .await
    }

    async fn fetch_users(&self, ids: &[i64]) -> Result<Vec<User>> {
        let ids = ids.to_vec();
        self.run(move |pool| queries::fetch_users(pool, &ids)).await
    }

    async fn add_email(&self, user_id: i64, address: &str) -> Result<i64> {
        let address = address.to_string();
        self.run(move |pool| queries::add_email(pool, user_id, &address))
            .await
    }

    async fn delete_email(&self, email_id: i64) -> Result<()> {
        self.run(move |pool| queries::delete_email(pool, email_id))
            .await
    }

    async fn filter_emails(&self, filter: &FilterEmails) -> Result<Vec<Email>> {
        let filter = filter.clone();
        self.run(move |pool| queries::filter_emails(pool, &filter))
            .await
    }

    async fn test_connection(&self) -> Result<()> {
        self.run(queries::test_connection).await
    }
}
