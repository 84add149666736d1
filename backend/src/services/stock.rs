//! Stock ledger, demand analysis and negative-stock reconciliation

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{MovementType, NewStockMovement, StockMovement, StockMovementRow};
use crate::services::ingredient::IngredientService;
use crate::services::order::{OrderFilter, OrderService};
use crate::services::product::ProductService;
use shared::{
    analyze_stock, count_statuses, index_ingredients, index_products, pending_reconciliations,
    plan_reconciliation, DateRange, IngredientBalance, PendingReconciliation, StockPolicy,
    StockStatusCounts,
};

const MOVEMENT_COLUMNS: &str =
    "id, business_id, ingredient_id, movement_type, quantity, reason, order_id, created_at";

const DEFAULT_MOVEMENT_LIMIT: i64 = 100;

/// Stock service for movements, analysis and reconciliation
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
    policy: StockPolicy,
}

/// Input for recording a manual stock movement
#[derive(Debug, Deserialize)]
pub struct RecordMovementInput {
    pub ingredient_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub reason: Option<String>,
}

/// Query for listing movements
#[derive(Debug, Default, Deserialize)]
pub struct MovementQuery {
    pub ingredient_id: Option<Uuid>,
    pub limit: Option<i64>,
}

/// Stock against demand for one analysis window
#[derive(Debug, Serialize)]
pub struct StockAnalysis {
    pub range: DateRange,
    pub critical_ratio: Decimal,
    pub counts: StockStatusCounts,
    pub balances: Vec<IngredientBalance>,
}

/// What happened to one ingredient during reconciliation
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconciliationOutcome {
    Applied { movement_id: Uuid, quantity: Decimal },
    AlreadyBalanced,
    Failed { message: String },
}

/// Per-ingredient reconciliation entry
#[derive(Debug, Clone, Serialize)]
pub struct ReconciledIngredient {
    pub ingredient_id: Uuid,
    pub planned_quantity: Decimal,
    #[serde(flatten)]
    pub outcome: ReconciliationOutcome,
}

/// Result of reconciling one order
#[derive(Debug, Serialize)]
pub struct ReconciliationResult {
    pub order_id: Uuid,
    pub applied: usize,
    pub failed: usize,
    pub ingredients: Vec<ReconciledIngredient>,
}

impl ReconciliationResult {
    fn new(order_id: Uuid, ingredients: Vec<ReconciledIngredient>) -> Self {
        let applied = ingredients
            .iter()
            .filter(|i| matches!(i.outcome, ReconciliationOutcome::Applied { .. }))
            .count();
        let failed = ingredients
            .iter()
            .filter(|i| matches!(i.outcome, ReconciliationOutcome::Failed { .. }))
            .count();
        Self {
            order_id,
            applied,
            failed,
            ingredients,
        }
    }

    pub fn is_partial(&self) -> bool {
        self.failed > 0 && self.applied > 0
    }
}

impl StockService {
    pub fn new(db: PgPool, policy: StockPolicy) -> Self {
        Self { db, policy }
    }

    /// Insert a ledger entry and move the ingredient's balance by the same
    /// signed amount. Runs on the caller's connection so it joins the
    /// caller's transaction.
    pub async fn write_movement(
        conn: &mut PgConnection,
        business_id: Uuid,
        movement: &NewStockMovement,
    ) -> AppResult<StockMovement> {
        let updated = sqlx::query(
            r#"
            UPDATE ingredients
            SET stock_quantity = stock_quantity + $1, updated_at = NOW()
            WHERE id = $2 AND business_id = $3
            "#,
        )
        .bind(movement.signed_quantity())
        .bind(movement.ingredient_id)
        .bind(business_id)
        .execute(&mut *conn)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Ingredient {}",
                movement.ingredient_id
            )));
        }

        let row = sqlx::query_as::<_, StockMovementRow>(&format!(
            r#"
            INSERT INTO stock_movements (business_id, ingredient_id, movement_type, quantity, reason, order_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {MOVEMENT_COLUMNS}
            "#
        ))
        .bind(business_id)
        .bind(movement.ingredient_id)
        .bind(movement.movement_type.as_str())
        .bind(movement.quantity)
        .bind(&movement.reason)
        .bind(movement.order_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(StockMovement::try_from(row)?)
    }

    /// Record a manual purchase, loss or adjustment
    pub async fn record_movement(
        &self,
        business_id: Uuid,
        input: RecordMovementInput,
    ) -> AppResult<StockMovement> {
        AppError::check("quantity", shared::validate_quantity(input.quantity))?;

        let reason = match input.reason.as_deref().map(str::trim) {
            Some(r) if !r.is_empty() => r.to_string(),
            _ => match input.movement_type {
                MovementType::In => "Entrada manual".to_string(),
                MovementType::Out => "Saída manual".to_string(),
            },
        };

        let movement = NewStockMovement {
            ingredient_id: input.ingredient_id,
            movement_type: input.movement_type,
            quantity: input.quantity,
            reason,
            order_id: None,
        };

        let mut tx = self.db.begin().await?;
        let recorded = Self::write_movement(&mut *tx, business_id, &movement).await?;
        tx.commit().await?;

        tracing::info!(
            %business_id,
            ingredient_id = %recorded.ingredient_id,
            movement_type = %recorded.movement_type.as_str(),
            quantity = %recorded.quantity,
            "Stock movement recorded"
        );

        Ok(recorded)
    }

    /// Most recent movements, for one ingredient or the whole business
    pub async fn list_movements(
        &self,
        business_id: Uuid,
        query: &MovementQuery,
    ) -> AppResult<Vec<StockMovement>> {
        let limit = query.limit.unwrap_or(DEFAULT_MOVEMENT_LIMIT).clamp(1, 1000);

        let rows = sqlx::query_as::<_, StockMovementRow>(&format!(
            r#"
            SELECT {MOVEMENT_COLUMNS}
            FROM stock_movements
            WHERE business_id = $1
              AND ($2::uuid IS NULL OR ingredient_id = $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#
        ))
        .bind(business_id)
        .bind(query.ingredient_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| StockMovement::try_from(row).map_err(AppError::from))
            .collect()
    }

    /// Compare stock with the demand of open orders created within `range`
    pub async fn analyze(&self, business_id: Uuid, range: DateRange) -> AppResult<StockAnalysis> {
        let ingredients = IngredientService::new(self.db.clone()).list(business_id).await?;
        let products = ProductService::new(self.db.clone()).list(business_id).await?;
        let orders = OrderService::new(self.db.clone())
            .list(business_id, &OrderFilter::for_range(range))
            .await?;

        let balances = analyze_stock(&ingredients, &orders, &products, &self.policy)?;
        let counts = count_statuses(&balances);

        tracing::debug!(
            %business_id,
            ingredients = balances.len(),
            low = counts.low,
            critical = counts.critical,
            "Stock analysis computed"
        );

        Ok(StockAnalysis {
            range,
            critical_ratio: self.policy.critical_ratio,
            counts,
            balances,
        })
    }

    /// Open orders touching an ingredient that is currently below zero
    pub async fn pending_reconciliations(
        &self,
        business_id: Uuid,
    ) -> AppResult<Vec<PendingReconciliation>> {
        let ingredients = IngredientService::new(self.db.clone()).list(business_id).await?;
        let products = ProductService::new(self.db.clone()).list(business_id).await?;
        let orders = OrderService::new(self.db.clone()).list_open(business_id).await?;

        Ok(pending_reconciliations(
            &orders,
            &index_products(&products),
            &index_ingredients(&ingredients),
        ))
    }

    /// Bring every negative ingredient used by an open order back to zero.
    ///
    /// Each ingredient is corrected in its own transaction; the deficit is
    /// re-read under a row lock, so a rerun or a concurrent correction
    /// results in `already_balanced` instead of over-crediting.
    pub async fn reconcile_order(
        &self,
        business_id: Uuid,
        order_id: Uuid,
    ) -> AppResult<ReconciliationResult> {
        let order = OrderService::new(self.db.clone()).get(business_id, order_id).await?;
        if !order.is_open() {
            return Err(AppError::InvalidStateTransition(format!(
                "Order in status {} cannot be reconciled",
                order.status
            )));
        }

        let ingredients = IngredientService::new(self.db.clone()).list(business_id).await?;
        let products = ProductService::new(self.db.clone()).list(business_id).await?;

        let planned = plan_reconciliation(
            &order,
            &index_products(&products),
            &index_ingredients(&ingredients),
        );

        let mut results = Vec::with_capacity(planned.len());
        for movement in planned {
            let outcome = match self.apply_regularization(business_id, &movement).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(
                        %business_id,
                        %order_id,
                        ingredient_id = %movement.ingredient_id,
                        error = %e,
                        "Stock regularization failed"
                    );
                    ReconciliationOutcome::Failed {
                        message: e.to_string(),
                    }
                }
            };
            results.push(ReconciledIngredient {
                ingredient_id: movement.ingredient_id,
                planned_quantity: movement.quantity,
                outcome,
            });
        }

        let result = ReconciliationResult::new(order_id, results);

        if result.is_partial() {
            tracing::warn!(
                %business_id,
                %order_id,
                applied = result.applied,
                failed = result.failed,
                "Reconciliation partially applied"
            );
        } else {
            tracing::info!(
                %business_id,
                %order_id,
                applied = result.applied,
                failed = result.failed,
                "Reconciliation finished"
            );
        }

        Ok(result)
    }

    async fn apply_regularization(
        &self,
        business_id: Uuid,
        planned: &NewStockMovement,
    ) -> AppResult<ReconciliationOutcome> {
        let mut tx = self.db.begin().await?;

        let stock: Decimal = sqlx::query_scalar(
            "SELECT stock_quantity FROM ingredients WHERE id = $1 AND business_id = $2 FOR UPDATE",
        )
        .bind(planned.ingredient_id)
        .bind(business_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Ingredient {}", planned.ingredient_id)))?;

        if stock >= Decimal::ZERO {
            tx.rollback().await?;
            return Ok(ReconciliationOutcome::AlreadyBalanced);
        }

        let movement = NewStockMovement {
            quantity: -stock,
            ..planned.clone()
        };
        let recorded = Self::write_movement(&mut *tx, business_id, &movement).await?;
        tx.commit().await?;

        Ok(ReconciliationOutcome::Applied {
            movement_id: recorded.id,
            quantity: recorded.quantity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(outcome: ReconciliationOutcome) -> ReconciledIngredient {
        ReconciledIngredient {
            ingredient_id: Uuid::new_v4(),
            planned_quantity: Decimal::ONE,
            outcome,
        }
    }

    #[test]
    fn test_result_counts_outcomes() {
        let result = ReconciliationResult::new(
            Uuid::new_v4(),
            vec![
                entry(ReconciliationOutcome::Applied {
                    movement_id: Uuid::new_v4(),
                    quantity: Decimal::ONE,
                }),
                entry(ReconciliationOutcome::Failed {
                    message: "Database error".to_string(),
                }),
                entry(ReconciliationOutcome::AlreadyBalanced),
            ],
        );

        assert_eq!(result.applied, 1);
        assert_eq!(result.failed, 1);
        assert!(result.is_partial());
    }

    #[test]
    fn test_outcome_serializes_with_tag() {
        let json = serde_json::to_value(entry(ReconciliationOutcome::AlreadyBalanced)).unwrap();
        assert_eq!(json["outcome"], "already_balanced");

        let json = serde_json::to_value(entry(ReconciliationOutcome::Failed {
            message: "boom".to_string(),
        }))
        .unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["message"], "boom");
    }
}
