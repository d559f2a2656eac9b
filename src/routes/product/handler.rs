use axum::{
    Extension, Json,
    body::Bytes,
    extract::{OriginalUri, Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    cache::keys::response_key,
    error::AppError,
    infrastructure::Identity,
    models::{NewProduct, Product, ProductPatch},
    result::ApiResult,
    routes::{ApiJson, parse_id},
};

use super::model::{CheckoutRequest, CheckoutResponse, ProductListResponse};

#[axum::debug_handler]
pub async fn list_products(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<ProductListResponse>, AppError> {
    let key = response_key(
        uri.path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| uri.path()),
    );
    let store = state.store.clone();

    let body = state
        .cache
        .read(&key, state.config.product_cache_ttl_secs, || async move {
            let products = store.list_products().await?;
            Ok::<_, AppError>(ProductListResponse::new(products))
        })
        .await?;

    Ok(Json(body))
}

#[axum::debug_handler]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResult<Product>>, AppError> {
    let product = state.store.find_product(parse_id(&id)?).await?;
    Ok(Json(ApiResult::success(product)))
}

#[axum::debug_handler]
pub async fn create_product(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(new): ApiJson<NewProduct>,
) -> Result<(StatusCode, Json<ApiResult<Product>>), AppError> {
    let product = state.store.create_product(new).await?;
    tracing::info!(
        admin_id = %identity.subject_id,
        product_id = %product.id,
        "Product created: {}",
        product.name
    );
    Ok((StatusCode::CREATED, Json(ApiResult::success(product))))
}

#[axum::debug_handler]
pub async fn update_product(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> Result<Json<ApiResult<Product>>, AppError> {
    let product = state.store.update_product(parse_id(&id)?, patch).await?;
    tracing::info!(
        admin_id = %identity.subject_id,
        product_id = %product.id,
        "Product updated"
    );
    Ok(Json(ApiResult::success(product)))
}

#[axum::debug_handler]
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<ApiResult<serde_json::Value>>, AppError> {
    let id = parse_id(&id)?;
    state.store.delete_product(id).await?;
    tracing::info!(admin_id = %identity.subject_id, product_id = %id, "Product deleted");
    Ok(Json(ApiResult::success(serde_json::json!({}))))
}

/// The body is optional; an empty body buys one unit.
#[axum::debug_handler]
pub async fn checkout(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<CheckoutResponse>, AppError> {
    let id = parse_id(&id)?;
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        CheckoutRequest::default()
    } else {
        serde_json::from_slice::<CheckoutRequest>(&body)
            .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))?
    };

    let receipt = state.checkout.checkout(id, req.quantity, &identity).await?;
    Ok(Json(receipt.into()))
}
