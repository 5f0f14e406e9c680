use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::Service;

use boiler::background::Workers;

// Helper to create test app backed by a private in-memory database
fn create_test_app() -> (axum::Router, Workers) {
    use boiler::config::{DatabaseConfig, JwtConfig, WorkerConfig};
    use boiler::service::ServiceApi;
    use boiler::{api, background, db, graphql, service};

    let store = db::init_database(&DatabaseConfig {
        path: ":memory:".to_string(),
        max_connections: 1,
    })
    .expect("Failed to create in-memory database");

    let jwt = JwtConfig {
        secret: "integration-test-secret".to_string(),
        expire_in: Duration::from_secs(30),
        issuer: "boiler".to_string(),
    };
    let worker_config = WorkerConfig {
        concurrency: 2,
        queue_capacity: 16,
    };

    let (queue, jobs) = background::JobQueue::new(worker_config.queue_capacity);
    let service: Arc<dyn ServiceApi> =
        Arc::new(service::Service::new(store.clone(), jwt.clone(), queue));
    let workers = background::start_workers(service.clone(), &worker_config, jobs);

    let state = Arc::new(api::AppStateInner {
        graphql_schema: graphql::create_schema(service.clone()),
        service,
        store,
        jwt,
    });

    (api::create_router(state, Duration::from_secs(5)), workers)
}

async fn send(app: &mut axum::Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.call(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, body.to_vec())
}

// Helper to send request and parse JSON response
async fn send_json_request(app: &mut axum::Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;
    let json: Value = serde_json::from_slice(&body).unwrap_or(json!({}));

    (status, json)
}

// Helper to send JSON request with JSON body
async fn send_json_body_request(
    app: &mut axum::Router,
    method: &str,
    uri: &str,
    body: Value,
) -> (StatusCode, Value) {
    let bytes = serde_json::to_vec(&body).unwrap();
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(bytes))
        .unwrap();

    let (status, body) = send(app, request).await;
    let json: Value = serde_json::from_slice(&body).unwrap_or(json!({}));

    (status, json)
}

async fn graphql(app: &mut axum::Router, query: &str, token: Option<&str>) -> Value {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/graphql/query")
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = builder
        .body(Body::from(serde_json::to_vec(&json!({ "query": query })).unwrap()))
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&body).unwrap()
}

async fn add_user(app: &mut axum::Router, name: &str, password: &str) -> i64 {
    let (status, body) = send_json_body_request(
        app,
        "POST",
        "/rest/users",
        json!({"name": name, "password": password}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["user_id"].as_i64().unwrap()
}

async fn add_email(app: &mut axum::Router, user_id: i64, address: &str) -> (StatusCode, Value) {
    send_json_body_request(
        app,
        "POST",
        "/rest/emails",
        json!({"user_id": user_id, "address": address}),
    )
    .await
}

#[tokio::test]
async fn test_health_endpoint() {
    let (mut app, _workers) = create_test_app();

    let (status, body) = send_json_request(&mut app, "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn test_add_and_get_user() {
    let (mut app, _workers) = create_test_app();
    let user_id = add_user(&mut app, "  John  ", "password123").await;

    let (status, body) =
        send_json_request(&mut app, "GET", &format!("/rest/users/{}", user_id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user_id);
    assert_eq!(body["user"]["name"], "John");
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn test_invalid_id_is_client_error() {
    let (mut app, _workers) = create_test_app();

    let (status, body) = send_json_request(&mut app, "GET", "/rest/users/abc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": {"codes": ["BAD_REQUEST", "INVALID_ID"], "msg": "invalid ID"}})
    );
}

#[tokio::test]
async fn test_missing_user_is_not_found() {
    let (mut app, _workers) = create_test_app();

    let (status, body) = send_json_request(&mut app, "GET", "/rest/users/999").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["codes"], json!(["BAD_REQUEST", "NOT_FOUND"]));
    assert_eq!(body["error"]["msg"], "not found");
}

#[tokio::test]
async fn test_add_user_validation() {
    let (mut app, _workers) = create_test_app();

    let (status, body) = send_json_body_request(
        &mut app,
        "POST",
        "/rest/users",
        json!({"name": "   ", "password": "pw"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["codes"], json!(["BAD_REQUEST", "INVALID_NAME"]));

    let request = Request::builder()
        .method("POST")
        .uri("/rest/users")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&mut app, request).await;
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["codes"], json!(["BAD_REQUEST", "INVALID_PAYLOAD"]));
}

#[tokio::test]
async fn test_list_users_with_limit() {
    let (mut app, _workers) = create_test_app();
    add_user(&mut app, "John", "pw").await;
    add_user(&mut app, "Jane", "pw").await;

    let (status, body) = send_json_request(&mut app, "GET", "/rest/users").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().unwrap().len(), 2);

    let (status, body) = send_json_request(&mut app, "GET", "/rest/users?limit=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().unwrap().len(), 1);
    assert_eq!(body["users"][0]["name"], "John");

    let (status, body) = send_json_request(&mut app, "GET", "/rest/users?limit=-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["codes"], json!(["BAD_REQUEST", "INVALID_LIMIT"]));
}

#[tokio::test]
async fn test_emails_lifecycle() {
    let (mut app, _workers) = create_test_app();
    let user_id = add_user(&mut app, "John", "pw").await;

    let (status, body) = add_email(&mut app, user_id, "john@example.com").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["email_id"].as_i64().unwrap() > 0);

    let (status, body) = add_email(&mut app, user_id, "john@example.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["codes"], json!(["BAD_REQUEST", "ALREADY_EXISTS"]));
    assert_eq!(body["error"]["msg"], "could not add email; already exists");

    let (status, body) = add_email(&mut app, user_id, "not an address").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["codes"],
        json!(["BAD_REQUEST", "INVALID_EMAIL_ADDRESS"])
    );

    let (status, body) = add_email(&mut app, 4242, "ghost@example.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["codes"], json!(["BAD_REQUEST", "NOT_FOUND"]));

    let (status, body) = send_json_request(
        &mut app,
        "GET",
        &format!("/rest/emails?user_id={}", user_id),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["emails"][0]["address"], "john@example.com");

    let (status, body) = send_json_request(&mut app, "GET", "/rest/emails").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["codes"], json!(["BAD_REQUEST", "INVALID_ID"]));
}

#[tokio::test]
async fn test_deferred_delete_user() {
    let (mut app, workers) = create_test_app();
    let user_id = add_user(&mut app, "John", "pw").await;
    add_email(&mut app, user_id, "john@example.com").await;

    let (status, body) =
        send_json_request(&mut app, "DELETE", &format!("/rest/users/{}", user_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);

    // wait for the queued job to run
    workers.shutdown().await;

    let (status, body) =
        send_json_request(&mut app, "GET", &format!("/rest/users/{}", user_id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["codes"], json!(["BAD_REQUEST", "NOT_FOUND"]));

    let (_, body) = send_json_request(
        &mut app,
        "GET",
        &format!("/rest/emails?user_id={}", user_id),
    )
    .await;
    assert_eq!(body["emails"], json!([]));
}

#[tokio::test]
async fn test_login_and_viewer() {
    let (mut app, _workers) = create_test_app();
    let user_id = add_user(&mut app, "John", "password123").await;
    add_email(&mut app, user_id, "john@example.com").await;

    let (status, body) = send_json_body_request(
        &mut app,
        "POST",
        "/rest/users/login",
        json!({"email": "john@example.com", "password": "wrong"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["codes"], json!(["BAD_REQUEST", "INVALID_PASSWORD"]));

    let (status, body) = send_json_body_request(
        &mut app,
        "POST",
        "/rest/users/login",
        json!({"email": "john@example.com", "password": "password123"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user_id);
    let token = body["token"].as_str().unwrap().to_string();

    let anonymous = graphql(&mut app, "{ viewer { name } }", None).await;
    assert_eq!(anonymous["data"]["viewer"], Value::Null);

    let viewer = graphql(&mut app, "{ viewer { name emails { address } } }", Some(&token)).await;
    assert_eq!(viewer["data"]["viewer"]["name"], "John");
    assert_eq!(
        viewer["data"]["viewer"]["emails"][0]["address"],
        "john@example.com"
    );
}

#[tokio::test]
async fn test_pretty_flag_indents_errors() {
    let (mut app, _workers) = create_test_app();

    let request = Request::builder()
        .uri("/rest/users/0?pretty")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&mut app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let text = String::from_utf8(body).unwrap();
    assert!(text.starts_with("{\n \"error\": {\n  \"codes\""), "{}", text);
}

#[tokio::test]
async fn test_graphql_errors_carry_codes() {
    let (mut app, _workers) = create_test_app();

    let body = graphql(&mut app, r#"{ user(id: "999") { name } }"#, None).await;
    assert_eq!(body["errors"][0]["message"], "not found");
    assert_eq!(
        body["errors"][0]["extensions"]["codes"],
        json!(["BAD_REQUEST", "NOT_FOUND"])
    );

    let body = graphql(&mut app, r#"{ user(id: "x") { name } }"#, None).await;
    assert_eq!(
        body["errors"][0]["extensions"]["codes"],
        json!(["BAD_REQUEST", "INVALID_ID"])
    );
}

#[tokio::test]
async fn test_graphql_mutations() {
    let (mut app, _workers) = create_test_app();

    let body = graphql(
        &mut app,
        r#"mutation { addUser(input: {name: "Jane", password: "pw"}) { user { id name } } }"#,
        None,
    )
    .await;
    assert_eq!(body["data"]["addUser"]["user"]["name"], "Jane");
    let user_id = body["data"]["addUser"]["user"]["id"].as_str().unwrap().to_string();

    let query = format!(
        r#"mutation {{ addEmail(input: {{userId: "{}", address: "jane@example.com"}}) {{ email {{ address user {{ name }} }} }} }}"#,
        user_id
    );
    let body = graphql(&mut app, &query, None).await;
    assert_eq!(body["data"]["addEmail"]["email"]["address"], "jane@example.com");
    assert_eq!(body["data"]["addEmail"]["email"]["user"]["name"], "Jane");

    let body = graphql(&mut app, &query, None).await;
    assert_eq!(
        body["errors"][0]["extensions"]["codes"],
        json!(["BAD_REQUEST", "ALREADY_EXISTS"])
    );

    let body = graphql(
        &mut app,
        r#"mutation { authUser(input: {email: "jane@example.com", password: "pw"}) { token user { name } } }"#,
        None,
    )
    .await;
    assert!(!body["data"]["authUser"]["token"].as_str().unwrap().is_empty());
    assert_eq!(body["data"]["authUser"]["user"]["name"], "Jane");
}

#[tokio::test]
async fn test_graphql_malformed_body() {
    let (mut app, _workers) = create_test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/graphql/query")
        .header("content-type", "application/json")
        .body(Body::from("{"))
        .unwrap();
    let (status, body) = send(&mut app, request).await;
    let body: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["errors"][0]["extensions"]["codes"],
        json!(["BAD_REQUEST", "INVALID_PAYLOAD"])
    );
}

#[tokio::test]
async fn test_graphql_over_get() {
    let (mut app, _workers) = create_test_app();
    add_user(&mut app, "John", "pw").await;

    let (status, body) =
        send_json_request(&mut app, "GET", "/graphql/query?query=%7Busers%7Bname%7D%7D").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["users"][0]["name"], "John");
}

#[tokio::test]
async fn test_rest_panic_is_generic_server_error() {
    use axum::routing::get;
    use tower_http::catch_panic::CatchPanicLayer;

    async fn boom() -> &'static str {
        panic!("secret state")
    }

    let mut app = axum::Router::new()
        .route("/boom", get(boom))
        .layer(CatchPanicLayer::custom(boiler::api::middleware::handle_panic));

    let (status, body) = send_json_request(&mut app, "GET", "/boom").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"error": {"codes": ["INTERNAL_SERVER_ERROR"], "msg": "Internal Server Error"}})
    );
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (mut app, _workers) = create_test_app();
    send_json_request(&mut app, "GET", "/rest/users/abc").await;

    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&mut app, request).await;
    let text = String::from_utf8(body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert!(text.contains("errors_presented_total"));
    assert!(text.contains("http_requests_total"));
}

#[tokio::test]
async fn test_openapi_document() {
    let (mut app, _workers) = create_test_app();

    let (status, body) = send_json_request(&mut app, "GET", "/api-docs/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/rest/users"].is_object());
}

#[tokio::test]
async fn test_malformed_query_string_uses_error_envelope() {
    let (mut app, _workers) = create_test_app();

    let (status, body) =
        send_json_request(&mut app, "GET", "/rest/emails?user_id=1&user_id=2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["codes"], json!(["BAD_REQUEST", "INVALID_PAYLOAD"]));
    assert!(body["error"]["msg"]
        .as_str()
        .unwrap()
        .starts_with("could not parse URL query"));

    let (status, body) = send_json_request(&mut app, "GET", "/rest/users?limit=1&limit=2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["codes"], json!(["BAD_REQUEST", "INVALID_PAYLOAD"]));

    let (status, body) =
        send_json_request(&mut app, "GET", "/graphql/query?query=a&query=b").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["errors"][0]["extensions"]["codes"],
        json!(["BAD_REQUEST", "INVALID_PAYLOAD"])
    );
}
