use async_graphql::*;
use std::sync::Arc;

use super::presenter::{debug_enabled, present, PresentExt};
use crate::db::FilterUsers;
use crate::errors::{
    ERR_INVALID_EMAIL_ADDRESS, ERR_INVALID_LIMIT, ERR_INVALID_NAME, ERR_INVALID_PASSWORD,
};
use crate::graphql::types::*;
use crate::models::email::parse_address;
use crate::models::{parse_id, AuthUser};
use crate::service::ServiceApi;

fn service<'a>(ctx: &Context<'a>) -> Result<&'a Arc<dyn ServiceApi>> {
    ctx.data::<Arc<dyn ServiceApi>>()
}

/// Reject a domain error up front, without calling the service
fn reject<T>(ctx: &Context<'_>, err: &crate::errors::Error) -> Result<T> {
    Err(present(err, debug_enabled(ctx)))
}

/// GraphQL Query root
pub struct Query;

#[Object]
impl Query {
    /// Get a user by ID
    async fn user(&self, ctx: &Context<'_>, id: ID) -> Result<UserType> {
        let user_id = parse_id(&id).present(ctx)?;
        let user = service(ctx)?.get_user_by_id(user_id).await.present(ctx)?;
        Ok(UserType(user))
    }

    /// List users, oldest first
    async fn users(&self, ctx: &Context<'_>, limit: Option<i32>) -> Result<Vec<UserType>> {
        let limit = match limit {
            None => 0,
            Some(limit) if limit > 0 => limit as u32,
            Some(_) => return reject(ctx, &ERR_INVALID_LIMIT),
        };

        let filter = FilterUsers {
            limit,
            ..Default::default()
        };
        let users = service(ctx)?.filter_users(filter).await.present(ctx)?;
        Ok(users.into_iter().map(UserType).collect())
    }

    /// Get an email by ID
    async fn email(&self, ctx: &Context<'_>, id: ID) -> Result<EmailType> {
        let email_id = parse_id(&id).present(ctx)?;
        let email = service(ctx)?.get_email_by_id(email_id).await.present(ctx)?;
        Ok(EmailType(email))
    }

    /// The authenticated user, or null for anonymous requests
    async fn viewer(&self, ctx: &Context<'_>) -> Result<Option<UserType>> {
        let Some(auth) = ctx.data_opt::<AuthUser>() else {
            return Ok(None);
        };

        let user = service(ctx)?.get_user_by_id(auth.id).await.present(ctx)?;
        Ok(Some(UserType(user)))
    }
}

/// GraphQL Mutation root
pub struct Mutation;

#[Object]
impl Mutation {
    async fn add_user(&self, ctx: &Context<'_>, input: AddUserInput) -> Result<UserResponse> {
        let name = input.name.trim();
        if name.is_empty() {
            return reject(ctx, &ERR_INVALID_NAME);
        }
        if input.password.is_empty() {
            return reject(ctx, &ERR_INVALID_PASSWORD);
        }

        let user_id = service(ctx)?
            .add_user(name, &input.password)
            .await
            .present(ctx)?;
        Ok(UserResponse { user_id })
    }

    async fn add_email(&self, ctx: &Context<'_>, input: AddEmailInput) -> Result<EmailResponse> {
        let user_id = parse_id(&input.user_id).present(ctx)?;
        let Some(address) = parse_address(&input.address) else {
            return reject(ctx, &ERR_INVALID_EMAIL_ADDRESS);
        };

        let email_id = service(ctx)?
            .add_email(user_id, &address)
            .await
            .present(ctx)?;
        Ok(EmailResponse { email_id })
    }

    /// Exchange credentials for a bearer token
    async fn auth_user(&self, ctx: &Context<'_>, input: AuthUserInput) -> Result<AuthUserResponse> {
        let Some(address) = parse_address(&input.email) else {
            return reject(ctx, &ERR_INVALID_EMAIL_ADDRESS);
        };

        let (user, token) = service(ctx)?
            .auth_user(&address, &input.password)
            .await
            .present(ctx)?;
        Ok(AuthUserResponse { token, user })
    }

    /// Schedule a user and their emails for deletion
    async fn delete_user(&self, ctx: &Context<'_>, id: ID) -> Result<bool> {
        let user_id = parse_id(&id).present(ctx)?;
        service(ctx)?
            .enqueue_delete_user(user_id)
            .await
            .present(ctx)?;
        Ok(true)
    }

    /// Schedule an email for deletion
    async fn delete_email(&self, ctx: &Context<'_>, id: ID) -> Result<bool> {
        let email_id = parse_id(&id).present(ctx)?;
        service(ctx)?
            .enqueue_delete_email(email_id)
            .await
            .present(ctx)?;
        Ok(true)
    }
}

/// GraphQL schema type
pub type GraphQLSchema = Schema<Query, Mutation, EmptySubscription>;

/// Create a new GraphQL schema backed by the given service
pub fn create_schema(service: Arc<dyn ServiceApi>) -> GraphQLSchema {
    Schema::build(Query, Mutation, EmptySubscription)
        .data(service)
        .finish()
}
