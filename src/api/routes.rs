use async_graphql::{Request as GraphQLRequest, Variables};
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    middleware,
    response::Response,
    routing::{delete, get, post},
    Extension, Router,
};
use serde::Deserialize;
use std::time::Duration;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    add_email, add_user, delete_email, delete_user, get_user, graphql_playground, health,
    list_emails, list_users, login, parse_query, AppState,
};
use super::middleware::{auth_middleware, flags_middleware, handle_panic, logging_middleware};
use super::openapi::ApiDoc;
use super::response::Resp;
use crate::errors::{Error, Result, ERR_INVALID_PAYLOAD};
use crate::graphql;
use crate::metrics;
use crate::models::AuthUser;

pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let rest = Router::new()
        .route("/users", get(list_users).post(add_user))
        .route("/users/login", post(login))
        .route("/users/:id", get(get_user).delete(delete_user))
        .route("/emails", get(list_emails).post(add_email))
        .route("/emails/:id", delete(delete_email));

    Router::new()
        // Health check
        .route("/health", get(health))
        .nest("/rest", rest)
        .route(
            "/graphql/query",
            get(graphql_get_handler).post(graphql_post_handler),
        )
        .route("/graphql/play", get(graphql_playground))
        // Metrics endpoint (Prometheus)
        .route("/metrics", get(metrics::metrics_handler))
        // OpenAPI documentation
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware (innermost first: auth -> flags -> panic -> timeout ->
        // compression -> logging -> metrics -> cors -> trace)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(middleware::from_fn(flags_middleware))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics::middleware::track_metrics))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // Add shared state
        .with_state(state)
}

/// GraphQL over GET: `?query=...&operationName=...&variables={...}`
#[derive(Debug, Deserialize)]
struct GraphQLGetParams {
    query: Option<String>,
    #[serde(rename = "operationName")]
    operation_name: Option<String>,
    variables: Option<String>,
}

impl GraphQLGetParams {
    fn into_request(self) -> Result<GraphQLRequest> {
        let query = self.query.ok_or_else(|| {
            Error::wrap(ERR_INVALID_PAYLOAD.clone(), "missing URL query query")
        })?;

        let mut request = GraphQLRequest::new(query);
        if let Some(name) = self.operation_name {
            request = request.operation_name(name);
        }
        if let Some(raw) = self.variables {
            let value: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
                Error::wrap(ERR_INVALID_PAYLOAD.clone(), format!("invalid variables ({})", e))
            })?;
            request = request.variables(Variables::from_json(value));
        }
        Ok(request)
    }
}

async fn graphql_get_handler(
    State(state): State<AppState>,
    resp: Resp,
    user: Option<Extension<AuthUser>>,
    query: std::result::Result<Query<GraphQLGetParams>, QueryRejection>,
) -> Response {
    match parse_query(query).and_then(GraphQLGetParams::into_request) {
        Ok(request) => run_graphql(&state, resp, user, request).await,
        Err(err) => resp.json(&graphql::error_response(&err, resp.flags().debug)),
    }
}

async fn graphql_post_handler(
    State(state): State<AppState>,
    resp: Resp,
    user: Option<Extension<AuthUser>>,
    body: Bytes,
) -> Response {
    match serde_json::from_slice::<GraphQLRequest>(&body) {
        Ok(request) => run_graphql(&state, resp, user, request).await,
        Err(e) => {
            let err = Error::wrap(
                ERR_INVALID_PAYLOAD.clone(),
                format!("could not parse payload ({})", e),
            );
            resp.json(&graphql::error_response(&err, resp.flags().debug))
        }
    }
}

async fn run_graphql(
    state: &AppState,
    resp: Resp,
    user: Option<Extension<AuthUser>>,
    request: GraphQLRequest,
) -> Response {
    let mut request = request.data(resp.flags());
    if let Some(Extension(user)) = user {
        request = request.data(user);
    }

    let response = graphql::execute(&state.graphql_schema, request).await;
    resp.json(&response)
}
