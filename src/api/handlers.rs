use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use utoipa::{IntoParams, ToSchema};

use super::response::{ErrorResponse, Resp};
use crate::config::JwtConfig;
use crate::db::{Database, FilterEmails, FilterUsers};
use crate::errors::{
    Error, Result, ERR_INVALID_EMAIL_ADDRESS, ERR_INVALID_ID, ERR_INVALID_LIMIT,
    ERR_INVALID_NAME, ERR_INVALID_PASSWORD, ERR_INVALID_PAYLOAD,
};
use crate::failf;
use crate::graphql::GraphQLSchema;
use crate::models::email::parse_address;
use crate::models::{parse_id, Email, User};
use crate::service::ServiceApi;

lazy_static::lazy_static! {
    static ref START_TIME: Instant = Instant::now();
}

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub service: Arc<dyn ServiceApi>,
    pub store: Database,
    pub graphql_schema: GraphQLSchema,
    pub jwt: JwtConfig,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddUserRequest {
    #[schema(example = "John")]
    pub name: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserIdResponse {
    pub user_id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "john@example.com")]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: User,
    /// Bearer token for the `Authorization` header
    pub token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddEmailRequest {
    pub user_id: i64,
    #[schema(example = "john@example.com")]
    pub address: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmailIdResponse {
    pub email_id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmailsResponse {
    pub emails: Vec<Email>,
}

/// Query parameters shared by every REST route
#[derive(Debug, Deserialize, IntoParams)]
pub struct FlagParams {
    /// Show server error messages instead of the generic text
    pub debug: Option<String>,
    /// Indent the JSON body
    pub pretty: Option<String>,
}

/// List users query parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListUsersParams {
    /// Maximum number of users (default: 50)
    pub limit: Option<String>,
}

/// List emails query parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListEmailsParams {
    /// Owner of the emails
    pub user_id: Option<String>,
}

fn decode<T: DeserializeOwned>(body: &Bytes) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|e| Error::wrap(ERR_INVALID_PAYLOAD.clone(), format!("could not parse payload ({})", e)))
}

/// Unwrap a URL query extraction, keeping rejections inside the error envelope
pub(crate) fn parse_query<T>(query: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    query.map(|Query(params)| params).map_err(|e| {
        Error::wrap(
            ERR_INVALID_PAYLOAD.clone(),
            format!("could not parse URL query ({})", e.body_text()),
        )
    })
}

fn parse_limit(raw: Option<&str>) -> Result<u32> {
    let Some(raw) = raw else {
        return Ok(0);
    };
    match raw.trim().parse::<u32>() {
        Ok(limit) if limit > 0 => Ok(limit),
        _ => Err(Error::wrap(ERR_INVALID_LIMIT.clone(), format!("limit {:?}", raw))),
    }
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = serde_json::Value),
        (status = 503, description = "Database unreachable", body = serde_json::Value)
    )
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let (status, database) = match state.store.test_connection().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unreachable")
        }
    };

    (
        status,
        Json(serde_json::json!({
            "status": if status.is_success() { "healthy" } else { "degraded" },
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "database": database,
            "uptime_seconds": START_TIME.elapsed().as_secs(),
        })),
    )
}

/// GraphQL playground
pub async fn graphql_playground() -> impl IntoResponse {
    Html(playground_source(GraphQLPlaygroundConfig::new("/graphql/query")))
}

/// List users
#[utoipa::path(
    get,
    path = "/rest/users",
    tag = "users",
    params(ListUsersParams, FlagParams),
    responses(
        (status = 200, description = "Users", body = UsersResponse),
        (status = 400, description = "Invalid limit", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    resp: Resp,
    query: std::result::Result<Query<ListUsersParams>, QueryRejection>,
) -> Response {
    let params = match parse_query(query) {
        Ok(params) => params,
        Err(err) => return resp.fail(err),
    };
    let limit = match parse_limit(params.limit.as_deref()) {
        Ok(limit) => limit,
        Err(err) => return resp.fail(err),
    };

    let filter = FilterUsers {
        limit,
        ..Default::default()
    };
    match state.service.filter_users(filter).await {
        Ok(users) => resp.json(&UsersResponse { users }),
        Err(err) => failf!(resp, err => "could not filter users"),
    }
}

/// Add a user
#[utoipa::path(
    post,
    path = "/rest/users",
    tag = "users",
    params(FlagParams),
    request_body = AddUserRequest,
    responses(
        (status = 200, description = "User created", body = UserIdResponse),
        (status = 400, description = "Invalid payload or name", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn add_user(State(state): State<AppState>, resp: Resp, body: Bytes) -> Response {
    let payload: AddUserRequest = match decode(&body) {
        Ok(payload) => payload,
        Err(err) => return resp.fail(err),
    };

    let name = payload.name.trim();
    if name.is_empty() {
        return failf!(resp, ERR_INVALID_NAME.clone() => "empty name");
    }
    if payload.password.is_empty() {
        return failf!(resp, ERR_INVALID_PASSWORD.clone() => "empty password");
    }

    match state.service.add_user(name, &payload.password).await {
        Ok(user_id) => {
            debug!(user_id, "User created");
            resp.json(&UserIdResponse { user_id })
        }
        Err(err) => resp.fail(err),
    }
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/rest/users/{id}",
    tag = "users",
    params(
        ("id" = i64, Path, description = "User ID"),
        FlagParams
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 400, description = "Invalid ID or user not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    resp: Resp,
    Path(raw_id): Path<String>,
) -> Response {
    let user_id = match parse_id(&raw_id) {
        Ok(id) => id,
        Err(err) => return resp.fail(err),
    };

    match state.service.get_user_by_id(user_id).await {
        Ok(user) => resp.json(&UserResponse { user }),
        Err(err) => resp.fail(err),
    }
}

/// Schedule a user and their emails for deletion
#[utoipa::path(
    delete,
    path = "/rest/users/{id}",
    tag = "users",
    params(
        ("id" = i64, Path, description = "User ID"),
        FlagParams
    ),
    responses(
        (status = 200, description = "Deletion enqueued", body = serde_json::Value),
        (status = 400, description = "Invalid ID", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    resp: Resp,
    Path(raw_id): Path<String>,
) -> Response {
    let user_id = match parse_id(&raw_id) {
        Ok(id) => id,
        Err(err) => return resp.fail(err),
    };

    match state.service.enqueue_delete_user(user_id).await {
        Ok(()) => resp.json(&serde_json::Value::Null),
        Err(err) => failf!(resp, err => "could not delete user {}", user_id),
    }
}

/// Authenticate with an email address and password
#[utoipa::path(
    post,
    path = "/rest/users/login",
    tag = "users",
    params(FlagParams),
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 400, description = "Unknown email or invalid password", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn login(State(state): State<AppState>, resp: Resp, body: Bytes) -> Response {
    let payload: LoginRequest = match decode(&body) {
        Ok(payload) => payload,
        Err(err) => return resp.fail(err),
    };

    let Some(address) = parse_address(&payload.email) else {
        return resp.fail(ERR_INVALID_EMAIL_ADDRESS.clone());
    };

    match state.service.auth_user(&address, &payload.password).await {
        Ok((user, token)) => resp.json(&LoginResponse { user, token }),
        Err(err) => resp.fail(err),
    }
}

/// List the emails of a user
#[utoipa::path(
    get,
    path = "/rest/emails",
    tag = "emails",
    params(ListEmailsParams, FlagParams),
    responses(
        (status = 200, description = "Emails", body = EmailsResponse),
        (status = 400, description = "Missing or invalid user_id", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_emails(
    State(state): State<AppState>,
    resp: Resp,
    query: std::result::Result<Query<ListEmailsParams>, QueryRejection>,
) -> Response {
    let params = match parse_query(query) {
        Ok(params) => params,
        Err(err) => return resp.fail(err),
    };
    let Some(raw) = params.user_id else {
        return failf!(resp, ERR_INVALID_ID.clone() => "missing URL query user_id");
    };
    let user_id = match parse_id(&raw) {
        Ok(id) => id,
        Err(err) => return failf!(resp, err => "invalid URL query user_id"),
    };

    let filter = FilterEmails {
        user_id: Some(user_id),
        ..Default::default()
    };
    match state.service.filter_emails(filter).await {
        Ok(emails) => resp.json(&EmailsResponse { emails }),
        Err(err) => failf!(resp, err => "could not filter emails"),
    }
}

/// Add an email to a user
#[utoipa::path(
    post,
    path = "/rest/emails",
    tag = "emails",
    params(FlagParams),
    request_body = AddEmailRequest,
    responses(
        (status = 200, description = "Email created", body = EmailIdResponse),
        (status = 400, description = "Invalid payload, address or user", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn add_email(State(state): State<AppState>, resp: Resp, body: Bytes) -> Response {
    let payload: AddEmailRequest = match decode(&body) {
        Ok(payload) => payload,
        Err(err) => return resp.fail(err),
    };

    let Some(address) = parse_address(&payload.address) else {
        return resp.fail(ERR_INVALID_EMAIL_ADDRESS.clone());
    };
    if payload.user_id < 1 {
        return resp.fail(ERR_INVALID_ID.clone());
    }

    match state.service.add_email(payload.user_id, &address).await {
        Ok(email_id) => resp.json(&EmailIdResponse { email_id }),
        Err(err) => resp.fail(err),
    }
}

/// Schedule an email for deletion
#[utoipa::path(
    delete,
    path = "/rest/emails/{id}",
    tag = "emails",
    params(
        ("id" = i64, Path, description = "Email ID"),
        FlagParams
    ),
    responses(
        (status = 200, description = "Deletion enqueued", body = serde_json::Value),
        (status = 400, description = "Invalid ID", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn delete_email(
    State(state): State<AppState>,
    resp: Resp,
    Path(raw_id): Path<String>,
) -> Response {
    let email_id = match parse_id(&raw_id) {
        Ok(id) => id,
        Err(err) => return resp.fail(err),
    };

    match state.service.enqueue_delete_email(email_id).await {
        Ok(()) => resp.json(&serde_json::Value::Null),
        Err(err) => failf!(resp, err => "could not delete email {}", email_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ERR_BAD_REQUEST;

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(None).unwrap(), 0);
        assert_eq!(parse_limit(Some("2")).unwrap(), 2);

        let err = parse_limit(Some("-3")).unwrap_err();
        assert!(err.is(&ERR_INVALID_LIMIT));
        assert!(err.is(&ERR_BAD_REQUEST));
        assert_eq!(err.to_string(), "limit \"-3\"; invalid limit");
        assert!(parse_limit(Some("0")).is_err());
    }

    #[test]
    fn test_decode_rejects_malformed_json() {
        let err = decode::<AddUserRequest>(&Bytes::from_static(b"{not json")).unwrap_err();
        assert!(err.is(&ERR_INVALID_PAYLOAD));
    }
}
