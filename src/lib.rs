use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
};

use cache::{CacheStore, ResponseCache};
use config::Config;
use database::InventoryStore;
use infrastructure::TokenService;
use middleware::{RateLimiter, admin_only, auth_middleware, log_errors, rate_limit};
use services::{AccountService, CheckoutService};

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod infrastructure;
pub mod middleware;
pub mod models;
pub mod result;
pub mod routes;
pub mod services;
pub mod utils;

/// Request bodies above this size are rejected before parsing.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn InventoryStore>,
    pub cache: ResponseCache,
    pub tokens: TokenService,
    pub accounts: AccountService,
    pub checkout: CheckoutService,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn InventoryStore>,
        cache_store: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            tokens: TokenService::from_config(&config),
            accounts: AccountService::from_config(store.clone(), &config),
            checkout: CheckoutService::new(store.clone()),
            cache: ResponseCache::new(cache_store),
            store,
            config,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let rate_limiter = Arc::new(RateLimiter::new(state.cache.store(), &state.config));

    let public_routes = Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        // Cached catalog listing, open to anonymous callers
        .route("/products", get(routes::product::list_products));

    let protected_routes = Router::new()
        .route("/products/{id}", get(routes::product::get_product))
        .route("/products/{id}/checkout", post(routes::product::checkout))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    // admin_only runs after auth_middleware has attached the identity
    let admin_routes = Router::new()
        .route("/products", post(routes::product::create_product))
        .route(
            "/products/{id}",
            put(routes::product::update_product).delete(routes::product::delete_product),
        )
        .layer(from_fn(admin_only))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let api_routes = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .layer(from_fn_with_state(rate_limiter, rate_limit));

    let base = state.config.api_base_uri.trim_matches('/');
    let router = Router::new().route("/", get(routes::welcome));
    let router = if base.is_empty() {
        router.merge(api_routes)
    } else {
        router.nest(&format!("/{base}"), api_routes)
    };

    let router = router
        .fallback(routes::not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(from_fn(log_errors));

    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    router.with_state(state)
}
