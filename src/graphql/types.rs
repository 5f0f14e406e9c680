use async_graphql::*;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::presenter::PresentExt;
use crate::db::FilterEmails;
use crate::models::{Email, User};
use crate::service::ServiceApi;

/// GraphQL representation of a user
#[derive(Debug, Clone)]
pub struct UserType(pub User);

#[Object(name = "User")]
impl UserType {
    async fn id(&self) -> ID {
        ID(self.0.id.to_string())
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn created(&self) -> DateTime<Utc> {
        self.0.created
    }

    async fn updated(&self) -> DateTime<Utc> {
        self.0.updated
    }

    /// Email addresses owned by the user
    async fn emails(&self, ctx: &Context<'_>) -> Result<Vec<EmailType>> {
        let service = ctx.data::<Arc<dyn ServiceApi>>()?;
        let filter = FilterEmails {
            user_id: Some(self.0.id),
            ..Default::default()
        };

        let emails = service.filter_emails(filter).await.present(ctx)?;
        Ok(emails.into_iter().map(EmailType).collect())
    }
}

/// GraphQL representation of an email address
#[derive(Debug, Clone)]
pub struct EmailType(pub Email);

#[Object(name = "Email")]
impl EmailType {
    async fn id(&self) -> ID {
        ID(self.0.id.to_string())
    }

    async fn address(&self) -> &str {
        &self.0.address
    }

    async fn created(&self) -> DateTime<Utc> {
        self.0.created
    }

    /// Owner of the address
    async fn user(&self, ctx: &Context<'_>) -> Result<UserType> {
        let service = ctx.data::<Arc<dyn ServiceApi>>()?;
        let user = service.get_user_by_id(self.0.user_id).await.present(ctx)?;
        Ok(UserType(user))
    }
}

#[derive(Debug, InputObject)]
pub struct AddUserInput {
    pub name: String,
    pub password: String,
}

#[derive(Debug, InputObject)]
pub struct AddEmailInput {
    pub user_id: ID,
    pub address: String,
}

#[derive(Debug, InputObject)]
pub struct AuthUserInput {
    pub email: String,
    pub password: String,
}

/// Result of `addUser`; the user is loaded on demand
pub struct UserResponse {
    pub user_id: i64,
}

#[Object]
impl UserResponse {
    async fn user(&self, ctx: &Context<'_>) -> Result<UserType> {
        let service = ctx.data::<Arc<dyn ServiceApi>>()?;
        let user = service.get_user_by_id(self.user_id).await.present(ctx)?;
        Ok(UserType(user))
    }
}

/// Result of `addEmail`
pub struct EmailResponse {
    pub email_id: i64,
}

#[Object]
impl EmailResponse {
    async fn email(&self, ctx: &Context<'_>) -> Result<EmailType> {
        let service = ctx.data::<Arc<dyn ServiceApi>>()?;
        let email = service.get_email_by_id(self.email_id).await.present(ctx)?;
        Ok(EmailType(email))
    }
}

/// Result of `authUser`
pub struct AuthUserResponse {
    pub token: String,
    pub user: User,
}

#[Object]
impl AuthUserResponse {
    /// Bearer token for the `Authorization` header
    async fn token(&self) -> &str {
        &self.token
    }

    async fn user(&self) -> UserType {
        UserType(self.user.clone())
    }
}
