//! HTTP handlers for customer orders

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{Order, OrderStatus};
use crate::services::order::{CreateOrderInput, KanbanColumn, OrderFilter, StatusChange};
use crate::services::OrderService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Create an order
pub async fn create_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<(StatusCode, Json<Order>)> {
    let service = OrderService::new(state.db);
    let order = service.create(current_user.0.business_id, input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List orders by date range and status
pub async fn list_orders(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<OrderFilter>,
) -> AppResult<Json<Vec<Order>>> {
    let service = OrderService::new(state.db);
    let orders = service.list(current_user.0.business_id, &filter).await?;
    Ok(Json(orders))
}

/// Orders grouped by status
pub async fn get_order_board(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<OrderFilter>,
) -> AppResult<Json<Vec<KanbanColumn>>> {
    let service = OrderService::new(state.db);
    let board = service.board(current_user.0.business_id, &filter).await?;
    Ok(Json(board))
}

/// Get an order
pub async fn get_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<Order>> {
    let service = OrderService::new(state.db);
    let order = service.get(current_user.0.business_id, order_id).await?;
    Ok(Json(order))
}

/// Move an order to another status
pub async fn update_order_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(body): Json<UpdateStatusRequest>,
) -> AppResult<Json<StatusChange>> {
    let service = OrderService::new(state.db);
    let change = service
        .update_status(current_user.0.business_id, order_id, body.status)
        .await?;
    Ok(Json(change))
}

/// Delete an order
pub async fn delete_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = OrderService::new(state.db);
    service.delete(current_user.0.business_id, order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
