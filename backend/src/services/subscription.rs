//! Subscription plan lookup and limit enforcement

use chrono::{Datelike, TimeZone, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{PlanResource, PlanTier, PlanUsage};

/// Subscription service for plan gating
#[derive(Clone)]
pub struct SubscriptionService {
    db: PgPool,
}

impl SubscriptionService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Current plan tier of a business
    pub async fn get_tier(&self, business_id: Uuid) -> AppResult<PlanTier> {
        let plan = sqlx::query_scalar::<_, String>("SELECT plan FROM businesses WHERE id = $1")
            .bind(business_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Business".to_string()))?;

        Ok(plan.parse()?)
    }

    /// Number of existing records counted against `resource`
    pub async fn count(&self, business_id: Uuid, resource: PlanResource) -> AppResult<u64> {
        let count = match resource {
            PlanResource::Products => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE business_id = $1")
                    .bind(business_id)
                    .fetch_one(&self.db)
                    .await?
            }
            PlanResource::Ingredients => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM ingredients WHERE business_id = $1",
                )
                .bind(business_id)
                .fetch_one(&self.db)
                .await?
            }
            PlanResource::MonthlyOrders => {
                let now = Utc::now();
                let month_start = Utc
                    .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
                    .single()
                    .ok_or_else(|| AppError::Internal("Invalid month start".to_string()))?;

                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM orders WHERE business_id = $1 AND created_at >= $2",
                )
                .bind(business_id)
                .bind(month_start)
                .fetch_one(&self.db)
                .await?
            }
        };

        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Fail with `PlanLimitReached` when creating one more `resource` would exceed the plan
    pub async fn ensure_can_create(&self, business_id: Uuid, resource: PlanResource) -> AppResult<()> {
        let tier = self.get_tier(business_id).await?;
        let limits = tier.limits();

        if limits.limit_for(resource).is_none() {
            return Ok(());
        }

        let current = self.count(business_id, resource).await?;
        limits.check(resource, current).map_err(|e| {
            tracing::info!(%business_id, plan = tier.as_str(), %resource, current, "Plan limit reached");
            AppError::from(e)
        })
    }

    /// Plan tier, limits and current usage
    pub async fn get_usage(&self, business_id: Uuid) -> AppResult<PlanUsage> {
        let tier = self.get_tier(business_id).await?;

        Ok(PlanUsage {
            tier,
            limits: tier.limits(),
            products: self.count(business_id, PlanResource::Products).await?,
            ingredients: self.count(business_id, PlanResource::Ingredients).await?,
            orders_this_month: self.count(business_id, PlanResource::MonthlyOrders).await?,
        })
    }
}
