mod common;

use axum::http::StatusCode;
use common::{ADMIN_SECRET, TestApp, test_config};
use inventory_backend::{infrastructure::TokenService, models::Role};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn register_returns_token_and_public_user() {
    let app = TestApp::new();
    let (status, body) = app
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"name": "Ada", "email": "ada@example.com", "password": "password123"})),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let app = TestApp::new();
    app.register("dup@example.com", None).await;

    let (status, body) = app
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"name": "Again", "email": "dup@example.com", "password": "password123"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "error": "Email already exists"}));
}

#[tokio::test]
async fn wrong_admin_secret_looks_like_a_normal_registration() {
    let app = TestApp::new();

    let (good_status, good) = app
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"name": "A", "email": "a@example.com", "password": "password123", "adminSecret": ADMIN_SECRET})),
        )
        .await;
    let (bad_status, bad) = app
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"name": "B", "email": "b@example.com", "password": "password123", "adminSecret": "guess"})),
        )
        .await;

    assert_eq!(good_status, StatusCode::CREATED);
    assert_eq!(bad_status, StatusCode::CREATED);
    assert_eq!(good["user"]["role"], "admin");
    assert_eq!(bad["user"]["role"], "user");
    assert_eq!(bad["success"], true);
}

#[tokio::test]
async fn login_round_trip() {
    let app = TestApp::new();
    app.register("login@example.com", None).await;

    let (status, body) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "login@example.com", "password": "password123"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "login@example.com");

    let tokens = TokenService::from_config(&test_config());
    let identity = tokens.verify(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(identity.role, Role::User);
    assert_eq!(
        identity.subject_id,
        body["user"]["id"].as_str().unwrap().parse::<Uuid>().unwrap()
    );
}

#[tokio::test]
async fn login_failures() {
    let app = TestApp::new();
    app.register("login@example.com", None).await;

    let (status, body) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "login@example.com", "password": "wrong-password"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, _) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "ghost@example.com", "password": "password123"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .request("POST", "/api/auth/login", None, Some(json!({"email": "login@example.com"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please provide email and password");
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = TestApp::new();
    let id = Uuid::new_v4();

    let (status, body) = app
        .request("GET", &format!("/api/products/{id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .request("GET", &format!("/api/products/{id}"), Some("garbage"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let expired = TokenService::new("integration-test-secret", chrono::Duration::hours(-3))
        .issue(Uuid::new_v4(), Role::Admin)
        .unwrap();
    let (status, _) = app
        .request("GET", &format!("/api/products/{id}"), Some(&expired), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = TokenService::new("someone-elses-secret", chrono::Duration::hours(1))
        .issue(Uuid::new_v4(), Role::Admin)
        .unwrap();
    let (status, _) = app
        .request("POST", "/api/products", Some(&forged), Some(json!({"name": "X", "price": 1})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_forbid_plain_users() {
    let app = TestApp::new();
    let user = app.user_token().await;
    let admin = app.admin_token().await;
    let id = app.create_product(&admin, "Chair", 2).await;

    let (status, body) = app
        .request("POST", "/api/products", Some(&user), Some(json!({"name": "X", "price": 1})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "User role user is not authorized to access this route");

    let (status, _) = app
        .request("PUT", &format!("/api/products/{id}"), Some(&user), Some(json!({"stock": 100})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request("DELETE", &format!("/api/products/{id}"), Some(&user), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.stock_of(&id).await, 2);
}
