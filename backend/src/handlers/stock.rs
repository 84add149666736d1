//! HTTP handlers for stock movements, analysis and reconciliation

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::RangeQuery;
use crate::middleware::CurrentUser;
use crate::models::StockMovement;
use crate::services::stock::{
    MovementQuery, ReconciliationResult, RecordMovementInput, StockAnalysis,
};
use crate::services::StockService;
use crate::AppState;
use shared::PendingReconciliation;

fn stock_service(state: &AppState) -> StockService {
    StockService::new(state.db.clone(), state.config.stock.policy())
}

/// Record a manual stock movement
pub async fn record_movement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RecordMovementInput>,
) -> AppResult<(StatusCode, Json<StockMovement>)> {
    let movement = stock_service(&state)
        .record_movement(current_user.0.business_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// List movements for the business, optionally for one ingredient
pub async fn list_movements(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<MovementQuery>,
) -> AppResult<Json<Vec<StockMovement>>> {
    let movements = stock_service(&state)
        .list_movements(current_user.0.business_id, &query)
        .await?;
    Ok(Json(movements))
}

/// Movements of one ingredient
pub async fn list_ingredient_movements(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(ingredient_id): Path<Uuid>,
) -> AppResult<Json<Vec<StockMovement>>> {
    let query = MovementQuery {
        ingredient_id: Some(ingredient_id),
        limit: None,
    };
    let movements = stock_service(&state)
        .list_movements(current_user.0.business_id, &query)
        .await?;
    Ok(Json(movements))
}

/// Stock against open-order demand
pub async fn get_stock_analysis(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<StockAnalysis>> {
    let range = query.resolve(state.config.stock.analysis_window_days)?;
    let analysis = stock_service(&state)
        .analyze(current_user.0.business_id, range)
        .await?;
    Ok(Json(analysis))
}

/// Open orders waiting for a stock regularization
pub async fn list_pending_reconciliations(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<PendingReconciliation>>> {
    let pending = stock_service(&state)
        .pending_reconciliations(current_user.0.business_id)
        .await?;
    Ok(Json(pending))
}

/// Regularize the negative stock touched by an order
pub async fn reconcile_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ReconciliationResult>> {
    let result = stock_service(&state)
        .reconcile_order(current_user.0.business_id, order_id)
        .await?;
    Ok(Json(result))
}
