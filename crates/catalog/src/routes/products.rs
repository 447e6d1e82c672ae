//! Product route handlers.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use camerazon_core::ProductId;

use crate::db::{ProductRepository, VariantRepository};
use crate::error::AppError;
use crate::models::{Product, Variant};
use crate::state::AppState;

const MISSING_ID: &str = "You must specify a product ID.";
const UNKNOWN_ID: &str = "Product ID not found.";

/// Product ids are positive decimal integers; anything else counts as missing.
fn parse_id(raw: &str) -> Result<ProductId, AppError> {
    let raw = raw.trim();
    raw.bytes()
        .all(|b| b.is_ascii_digit())
        .then(|| raw.parse::<i64>().ok())
        .flatten()
        .filter(|&id| id > 0)
        .map(ProductId::new)
        .ok_or_else(|| AppError::NotFound(MISSING_ID.to_string()))
}

/// List every product with its variants, from the catalog cache.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(state.cache().all().await?))
}

/// Sync the catalog from Shopify and return the refreshed product list.
///
/// The request body may be empty or any JSON document; it is not used yet.
pub async fn sync(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Vec<Product>>), AppError> {
    if !body.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_slice::<serde_json::Value>(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))?;
    }

    state.sync_catalog().await?;
    Ok((StatusCode::CREATED, Json(state.cache().all().await?)))
}

/// Show one product with its variants, read from the store.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    let id = parse_id(&id)?;

    let mut product = ProductRepository::new(state.pool())
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound(UNKNOWN_ID.to_string()))?;
    product.variants = VariantRepository::new(state.pool())
        .list_for_product_by_position(id)
        .await?;

    Ok(Json(product))
}

/// List a product's variants in position order.
///
/// An unknown product has no variants.
pub async fn variants(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Variant>>, AppError> {
    let id = parse_id(&id)?;
    let variants = VariantRepository::new(state.pool())
        .list_for_product_by_position(id)
        .await?;
    Ok(Json(variants))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("632910392").ok(), Some(ProductId::new(632_910_392)));
        assert!(matches!(parse_id("abc"), Err(AppError::NotFound(m)) if m == MISSING_ID));
        assert!(parse_id("").is_err());
        assert!(matches!(parse_id("0"), Err(AppError::NotFound(m)) if m == MISSING_ID));
        assert!(matches!(parse_id("-5"), Err(AppError::NotFound(m)) if m == MISSING_ID));
        assert!(parse_id("+5").is_err());
    }
}
