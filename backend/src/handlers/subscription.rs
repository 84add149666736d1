//! Subscription plan handlers

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::SubscriptionService;
use crate::AppState;
use shared::PlanUsage;

/// Current plan, its limits and usage
pub async fn get_subscription(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<PlanUsage>> {
    let service = SubscriptionService::new(state.db);
    let usage = service.get_usage(current_user.0.business_id).await?;
    Ok(Json(usage))
}
