#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use inventory_backend::{
    AppState, build_router,
    cache::MemoryCacheStore,
    config::Config,
    database::{InventoryStore, MemoryInventoryStore},
};
use serde_json::{Value, json};
use tower::ServiceExt;

pub const ADMIN_SECRET: &str = "open-sesame";

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".into(),
        database_max_connections: 1,
        redis_url: "redis://unused".into(),
        jwt_secret: "integration-test-secret".into(),
        jwt_expiration_secs: 24 * 3600,
        admin_secret: Some(ADMIN_SECRET.into()),
        bcrypt_cost: 4,
        product_cache_ttl_secs: 60,
        rate_limit_window_secs: 900,
        rate_limit_requests: 10_000,
        trust_proxy_headers: false,
        server_host: "127.0.0.1".into(),
        server_port: 0,
        api_base_uri: "/api".into(),
    }
}

/// Drives `router` in process and decodes the body as JSON, falling back to
/// a JSON string for plain-text responses.
pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryInventoryStore>,
    pub cache: Arc<MemoryCacheStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryInventoryStore::new());
        let cache = Arc::new(MemoryCacheStore::new());
        let state = AppState::new(config, store.clone(), cache.clone());
        Self {
            router: build_router(state),
            store,
            cache,
        }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        send(&self.router, method, uri, token, &[], body).await
    }

    pub async fn request_with_headers(
        &self,
        method: &str,
        uri: &str,
        headers: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        send(&self.router, method, uri, None, headers, None).await
    }

    pub async fn register(&self, email: &str, admin_secret: Option<&str>) -> String {
        let mut body = json!({
            "name": "Test User",
            "email": email,
            "password": "password123",
        });
        if let Some(secret) = admin_secret {
            body["adminSecret"] = json!(secret);
        }
        let (status, body) = self
            .request("POST", "/api/auth/register", None, Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.register("admin@example.com", Some(ADMIN_SECRET)).await
    }

    pub async fn user_token(&self) -> String {
        self.register("user@example.com", None).await
    }

    pub async fn create_product(&self, admin: &str, name: &str, stock: i32) -> String {
        let (status, body) = self
            .request(
                "POST",
                "/api/products",
                Some(admin),
                Some(json!({ "name": name, "price": 12.5, "stock": stock })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    pub async fn stock_of(&self, id: &str) -> i32 {
        self.store
            .find_product(id.parse().unwrap())
            .await
            .unwrap()
            .stock
    }
}
