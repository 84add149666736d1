//! Reporting handlers for the dashboard and data export

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::handlers::RangeQuery;
use crate::middleware::CurrentUser;
use crate::services::reporting::DashboardSummary;
use crate::services::ReportingService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>, // "json" or "csv"
}

/// Dashboard summary for a date range
pub async fn get_dashboard_summary(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<DashboardSummary>> {
    let range = query.resolve(state.config.stock.analysis_window_days)?;
    let service = ReportingService::new(state.db);
    let summary = service
        .get_dashboard_summary(current_user.0.business_id, range)
        .await?;
    Ok(Json(summary))
}

/// Product costings as JSON or CSV
pub async fn export_costings(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    let service = ReportingService::new(state.db);
    let data = service.costing_export(current_user.0.business_id).await?;

    if query.format.as_deref() == Some("csv") {
        let csv = ReportingService::export_to_csv(&data)?;
        return Ok((
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"custos_produtos.csv\"",
                ),
            ],
            csv,
        )
            .into_response());
    }

    Ok(Json(data).into_response())
}
