//! HTTP handlers

use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use shared::DateRange;

pub mod auth;
pub mod health;
pub mod import;
pub mod ingredient;
pub mod order;
pub mod product;
pub mod reporting;
pub mod stock;
pub mod subscription;

pub use auth::*;
pub use health::*;
pub use import::*;
pub use ingredient::*;
pub use order::*;
pub use product::*;
pub use reporting::*;
pub use stock::*;
pub use subscription::*;

/// Optional date range in query strings
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl RangeQuery {
    /// Fill missing bounds from a window of `default_days` ending today
    pub fn resolve(&self, default_days: u32) -> AppResult<DateRange> {
        let end = self.end_date.unwrap_or_else(|| Utc::now().date_naive());
        let start = self
            .start_date
            .unwrap_or_else(|| DateRange::last_days(end, default_days).start);
        let range = DateRange { start, end };

        if !range.is_valid() {
            return Err(AppError::validation(
                "start_date",
                "Start date must not be after end date",
                "A data inicial não pode ser posterior à data final",
            ));
        }
        Ok(range)
    }
}
