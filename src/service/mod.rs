//! Business operations on users and emails

pub mod auth;

use async_trait::async_trait;
use tracing::debug;

use crate::background::{Job, JobQueue};
use crate::config::JwtConfig;
use crate::db::{Database, FilterEmails, FilterUsers, FILTER_USERS_DEFAULT_LIMIT};
use crate::errors::{Error, Result, ERR_INVALID_PASSWORD, ERR_NOT_FOUND};
use crate::models::{Email, User};

#[async_trait]
pub trait ServiceApi: Send + Sync {
    /// Hash the password and store a new user
    async fn add_user(&self, name: &str, password: &str) -> Result<i64>;
    /// Remove a user and their emails; missing users are not an error
    async fn delete_user(&self, user_id: i64) -> Result<()>;
    async fn enqueue_delete_user(&self, user_id: i64) -> Result<()>;
    async fn filter_users(&self, filter: FilterUsers) -> Result<Vec<User>>;
    async fn get_user_by_id(&self, user_id: i64) -> Result<User>;
    async fn get_user_by_email(&self, address: &str) -> Result<User>;
    /// Check credentials and issue a bearer token
    async fn auth_user(&self, address: &str, password: &str) -> Result<(User, String)>;

    async fn filter_emails(&self, filter: FilterEmails) -> Result<Vec<Email>>;
    async fn get_email_by_id(&self, email_id: i64) -> Result<Email>;
    async fn add_email(&self, user_id: i64, address: &str) -> Result<i64>;
    async fn delete_email(&self, email_id: i64) -> Result<()>;
    async fn enqueue_delete_email(&self, email_id: i64) -> Result<()>;
}

pub struct Service {
    store: Database,
    jwt: JwtConfig,
    queue: JobQueue,
}

impl Service {
    pub fn new(store: Database, jwt: JwtConfig, queue: JobQueue) -> Self {
        Self { store, jwt, queue }
    }

    pub fn store(&self) -> &Database {
        &self.store
    }
}

#[async_trait]
impl ServiceApi for Service {
    async fn add_user(&self, name: &str, password: &str) -> Result<i64> {
        let password = password.to_string();
        // hashing blocks, run it off the runtime threads
        let hash = tokio::task::spawn_blocking(move || auth::hash_password(&password))
            .await?
            .map_err(|e| Error::wrap(e.into(), "could not generate password"))?;

        let id = self
            .store
            .add_user(name, &hash)
            .await
            .map_err(|e| Error::wrap(e, "could not add user"))?;

        debug!(user_id = id, "User added");
        Ok(id)
    }

    async fn delete_user(&self, user_id: i64) -> Result<()> {
        match self.store.delete_user(user_id).await {
            Ok(()) => Ok(()),
            Err(err) if err.is(&ERR_NOT_FOUND) => Ok(()),
            Err(err) => Err(Error::wrap(err, "could not delete user")),
        }
    }

    async fn enqueue_delete_user(&self, user_id: i64) -> Result<()> {
        self.queue.enqueue(Job::DeleteUser(user_id)).await
    }

    async fn filter_users(&self, mut filter: FilterUsers) -> Result<Vec<User>> {
        if filter.limit == 0 {
            filter.limit = FILTER_USERS_DEFAULT_LIMIT;
        }

        let ids = self.store.filter_users_id(&filter).await?;
        self.store.fetch_users(&ids).await
    }

    async fn get_user_by_id(&self, user_id: i64) -> Result<User> {
        let mut users = self.store.fetch_users(&[user_id]).await?;
        if users.len() != 1 {
            return Err(ERR_NOT_FOUND.clone());
        }
        Ok(users.remove(0))
    }

    async fn get_user_by_email(&self, address: &str) -> Result<User> {
        let filter = FilterUsers {
            email: Some(address.to_string()),
            limit: FILTER_USERS_DEFAULT_LIMIT,
            ..Default::default()
        };

        let ids = self.store.filter_users_id(&filter).await?;
        if ids.len() != 1 {
            return Err(ERR_NOT_FOUND.clone());
        }
        self.get_user_by_id(ids[0]).await
    }

    async fn auth_user(&self, address: &str, password: &str) -> Result<(User, String)> {
        let user = self.get_user_by_email(address).await?;

        let candidate = password.to_string();
        let hash = user.password.clone();
        let valid =
            tokio::task::spawn_blocking(move || auth::verify_password(&candidate, &hash)).await?;
        if !valid {
            return Err(ERR_INVALID_PASSWORD.clone());
        }

        let token = auth::issue(user.id, &self.jwt)?;
        Ok((user, token))
    }

    async fn filter_emails(&self, filter: FilterEmails) -> Result<Vec<Email>> {
        self.store.filter_emails(&filter).await
    }

    async fn get_email_by_id(&self, email_id: i64) -> Result<Email> {
        let filter = FilterEmails {
            email_id: Some(email_id),
            limit: 1,
            ..Default::default()
        };

        self.store
            .filter_emails(&filter)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ERR_NOT_FOUND.clone())
    }

    async fn add_email(&self, user_id: i64, address: &str) -> Result<i64> {
        self.store
            .add_email(user_id, address)
            .await
            .map_err(|e| Error::wrap(e, "could not add email"))
    }

    async fn delete_email(&self, email_id: i64) -> Result<()> {
        self.store
            .delete_email(email_id)
            .await
            .map_err(|e| Error::wrap(e, "could not delete email"))
    }

    async fn enqueue_delete_email(&self, email_id: i64) -> Result<()> {
        self.queue.enqueue(Job::DeleteEmail(email_id)).await
    }
}
