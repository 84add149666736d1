//! CSV import handlers

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::import::{ImportResult, ImportSource};
use crate::services::ImportService;
use crate::AppState;

/// Import a CSV body as ingredients or products
pub async fn import_csv(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(source): Path<ImportSource>,
    body: String,
) -> AppResult<Json<ImportResult>> {
    let service = ImportService::new(state.db);
    let result = service
        .import(current_user.0.business_id, source, &body)
        .await?;
    Ok(Json(result))
}
