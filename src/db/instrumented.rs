use async_trait::async_trait;
use std::time::Instant;

use crate::db::{Database, DatabaseBackend, FilterEmails, FilterUsers};
use crate::errors::Result;
use crate::metrics::registry::{DATABASE_QUERIES_TOTAL, DATABASE_QUERY_DURATION_SECONDS};
use crate::models::{Email, User};

/// A thin wrapper around a DatabaseBackend that records Prometheus metrics
/// for query counts and durations.
pub struct InstrumentedDatabase {
    inner: Database,
}

impl InstrumentedDatabase {
    pub fn new(inner: Database) -> Self {
        Self { inner }
    }

    fn observe(&self, query_type: &'static str, start: Instant) {
        let seconds = start.elapsed().as_secs_f64();
        DATABASE_QUERIES_TOTAL
            .with_label_values(&[query_type])
            .inc();
        DATABASE_QUERY_DURATION_SECONDS
            .with_label_values(&[query_type])
            .observe(seconds);
    }
}

#[async_trait]
impl DatabaseBackend for InstrumentedDatabase {
    async fn add_user(&self, name: &str, password_hash: &str) -> Result<i64> {
        let start = Instant::now();
        let res = self.inner.add_user(name, password_hash).await;
        self.observe("insert", start);
        res
    }

    async fn delete_user(&self, user_id: i64) -> Result<()> {
        let start = Instant::now();
        let res = self.inner.delete_user(user_id).await;
        self.observe("delete", start);
        res
    }

    async fn filter_users_id(&self, filter: &FilterUsers) -> Result<Vec<i64>> {
        let start = Instant::now();
        let res = self.inner.filter_users_id(filter).await;
        self.observe("select", start);
        res
    }

    async fn fetch_users(&self, ids: &[i64]) -> Result<Vec<User>> {
        let start = Instant::now();
        let res = self.inner.fetch_users(ids).await;
        self.observe("select", start);
        res
    }

    async fn add_email(&self, user_id: i64, address: &str) -> Result<i64> {
        let start = Instant::now();
        let res = self.inner.add_email(user_id, address).await;
        self.observe("insert", start);
        res
    }

    async fn delete_email(&self, email_id: i64) -> Result<()> {
        let start = Instant::now();
        let res = self.inner.delete_email(email_id).await;
        self.observe("delete", start);
        res
    }

    async fn filter_emails(&self, filter: &FilterEmails) -> Result<Vec<Email>> {
        let start = Instant::now();
        let res = self.inner.filter_emails(filter).await;
        self.observe("select", start);
        res
    }

    async fn test_connection(&self) -> Result<()> {
        let start = Instant::now();
        let res = self.inner.test_connection().await;
        self.observe("select", start);
        res
    }
}
