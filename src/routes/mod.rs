use axum::extract::FromRequest;
use uuid::Uuid;

use crate::error::AppError;

pub mod auth;
pub mod product;

/// `Json` whose rejection uses the API error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

pub(crate) fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation("Invalid ID".into()))
}

pub async fn welcome() -> &'static str {
    "Welcome to the inventory API!"
}

pub async fn not_found() -> AppError {
    AppError::NotFound("Route not found".into())
}
