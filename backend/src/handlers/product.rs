//! HTTP handlers for products and their costing

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::Product;
use crate::services::product::ProductInput;
use crate::services::ProductService;
use crate::AppState;
use shared::ProductCosting;

/// Create a product with its recipe
pub async fn create_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ProductInput>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let service = ProductService::new(state.db);
    let product = service.create(current_user.0.business_id, input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// List products
pub async fn list_products(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Product>>> {
    let service = ProductService::new(state.db);
    let products = service.list(current_user.0.business_id).await?;
    Ok(Json(products))
}

/// Get a product
pub async fn get_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.db);
    let product = service.get(current_user.0.business_id, product_id).await?;
    Ok(Json(product))
}

/// Replace a product and its recipe
pub async fn update_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<ProductInput>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.db);
    let product = service
        .update(current_user.0.business_id, product_id, input)
        .await?;
    Ok(Json(product))
}

/// Delete a product
pub async fn delete_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = ProductService::new(state.db);
    service.delete(current_user.0.business_id, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Cost breakdown and margin of a product
pub async fn get_product_costing(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductCosting>> {
    let service = ProductService::new(state.db);
    let costing = service
        .get_costing(current_user.0.business_id, product_id)
        .await?;
    Ok(Json(costing))
}

/// Costing of every product
pub async fn list_product_costings(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<ProductCosting>>> {
    let service = ProductService::new(state.db);
    let costings = service.list_costings(current_user.0.business_id).await?;
    Ok(Json(costings))
}
