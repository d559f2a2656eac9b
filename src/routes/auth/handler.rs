use axum::{Json, extract::State, http::StatusCode};

use crate::{AppState, error::AppError, routes::ApiJson};

use super::model::{AuthResponse, LoginRequest, RegisterRequest};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let user = state
        .accounts
        .register(
            &req.name,
            &req.email,
            &req.password,
            req.admin_secret.as_deref(),
        )
        .await?;

    let token = state.tokens.issue(user.id, user.role)?;
    Ok((StatusCode::CREATED, Json(AuthResponse::new(token, &user))))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state.accounts.login(&req.email, &req.password).await?;

    let token = state.tokens.issue(user.id, user.role)?;
    Ok(Json(AuthResponse::new(token, &user)))
}
