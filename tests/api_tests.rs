use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use gatehouse::api::AppState;
use gatehouse::config::Config;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

async fn spawn_app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    // A single pooled connection keeps the in-memory database alive and
    // shared for the whole test.
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.auth.secret = "test-secret-key".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = gatehouse::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    (gatehouse::api::router(state.clone()), state)
}

async fn post_json(app: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn get(app: &Router, uri: &str, bearer: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = bearer {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_home_and_health() {
    let (app, _state) = spawn_app().await;

    let (status, body) = get(&app, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert!(body["version"].is_string());

    let (status, body) = get(&app, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_register_login_me_flow() {
    let (app, _state) = spawn_app().await;

    let (status, body) = post_json(
        &app,
        "/api/auth/register",
        &json!({"username": "alice", "email": "alice@x.com", "password": "secret1"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["email"], "alice@x.com");
    assert_eq!(body["user"]["is_active"], true);
    assert_eq!(body["user"]["is_verified"], false);
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["token"].is_string());

    // Wrong password: generic failure, no hint which part was wrong.
    let (status, body) = post_json(
        &app,
        "/api/auth/login",
        &json!({"email": "alice@x.com", "password": "wrongpassword"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
    assert_eq!(body["message"], "Email or password is incorrect");

    let (status, body) = post_json(
        &app,
        "/api/auth/login",
        &json!({"email": "alice@x.com", "password": "secret1"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = get(&app, "/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["is_verified"], false);

    let (status, body) = get(&app, "/api/protected", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "This is a protected route");
    assert_eq!(body["user"]["username"], "alice");

    let (status, body) = post_json_with_token(&app, "/api/auth/logout", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");
}

async fn post_json_with_token(app: &Router, uri: &str, bearer: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Authorization", format!("Bearer {bearer}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_register_validation_failures() {
    let (app, _state) = spawn_app().await;

    let cases = [
        json!({"username": "ab", "email": "ok@x.com", "password": "secret1"}),
        json!({"username": "has space", "email": "ok@x.com", "password": "secret1"}),
        json!({"username": "alice", "email": "not-an-email", "password": "secret1"}),
        json!({"username": "alice", "email": "ok@x.com", "password": "123"}),
    ];

    for case in &cases {
        let (status, body) = post_json(&app, "/api/auth/register", case).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "case: {case}");
        assert_eq!(body["error"], "Validation error", "case: {case}");
        assert!(body["message"].is_string());
    }
}

#[tokio::test]
async fn test_register_duplicates() {
    let (app, _state) = spawn_app().await;

    let (status, _) = post_json(
        &app,
        "/api/auth/register",
        &json!({"username": "alice", "email": "alice@x.com", "password": "secret1"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Same email, different username.
    let (status, body) = post_json(
        &app,
        "/api/auth/register",
        &json!({"username": "alice2", "email": "alice@x.com", "password": "secret1"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User already exists");

    // Same username, different email.
    let (status, body) = post_json(
        &app,
        "/api/auth/register",
        &json!({"username": "alice", "email": "other@x.com", "password": "secret1"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username taken");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let (app, _state) = spawn_app().await;

    for uri in ["/api/auth/me", "/api/protected"] {
        let (status, body) = get(&app, uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "uri: {uri}");
        assert_eq!(body["error"], "Unauthorized");

        let (status, _) = get(&app, uri, Some("not-a-real-token")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "uri: {uri}");
    }
}

#[tokio::test]
async fn test_login_unknown_email_matches_wrong_password() {
    let (app, _state) = spawn_app().await;

    post_json(
        &app,
        "/api/auth/register",
        &json!({"username": "alice", "email": "alice@x.com", "password": "secret1"}),
    )
    .await;

    let (status_unknown, body_unknown) = post_json(
        &app,
        "/api/auth/login",
        &json!({"email": "nobody@x.com", "password": "secret1"}),
    )
    .await;
    let (status_wrong, body_wrong) = post_json(
        &app,
        "/api/auth/login",
        &json!({"email": "alice@x.com", "password": "wrongpassword"}),
    )
    .await;

    assert_eq!(status_unknown, StatusCode::UNAUTHORIZED);
    assert_eq!(status_wrong, StatusCode::UNAUTHORIZED);
    assert_eq!(body_unknown, body_wrong);
}

#[tokio::test]
async fn test_expired_session_token_is_rejected() {
    let (app, state) = spawn_app().await;

    let (_, body) = post_json(
        &app,
        "/api/auth/register",
        &json!({"username": "alice", "email": "alice@x.com", "password": "secret1"}),
    )
    .await;
    let user_id = i32::try_from(body["user"]["id"].as_i64().unwrap()).unwrap();

    let codec = gatehouse::services::TokenCodec::new(
        state.config().auth.secret.as_bytes(),
        state.config().auth.session_token_ttl_minutes,
    );
    let expired = codec.issue_with_ttl(user_id, "alice", -1).unwrap();

    let (status, _) = get(&app, "/api/auth/me", Some(&expired)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
