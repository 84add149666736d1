//! Ingredient catalog service

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Ingredient, IngredientRow, NewStockMovement, Unit};
use crate::services::stock::StockService;
use crate::services::subscription::SubscriptionService;
use shared::PlanResource;

const INGREDIENT_COLUMNS: &str = "id, business_id, name, unit, cost_per_unit, stock_quantity, min_stock, created_at, updated_at";

/// Ingredient service for managing the ingredient catalog
#[derive(Clone)]
pub struct IngredientService {
    db: PgPool,
}

/// Input for creating an ingredient
#[derive(Debug, Deserialize)]
pub struct CreateIngredientInput {
    pub name: String,
    pub unit: Unit,
    pub cost_per_unit: Decimal,
    /// Recorded as an opening stock-in movement when positive
    pub initial_stock: Option<Decimal>,
    pub min_stock: Option<Decimal>,
}

/// Input for updating an ingredient. Stock is only changed through movements.
#[derive(Debug, Deserialize)]
pub struct UpdateIngredientInput {
    pub name: Option<String>,
    pub unit: Option<Unit>,
    pub cost_per_unit: Option<Decimal>,
    pub min_stock: Option<Decimal>,
}

impl IngredientService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub(crate) fn validate_create(input: &CreateIngredientInput) -> AppResult<()> {
        AppError::check("name", shared::validate_name(&input.name))?;
        AppError::check("cost_per_unit", shared::validate_cost_per_unit(input.cost_per_unit))?;
        AppError::check("min_stock", shared::validate_min_stock(input.min_stock))?;
        if let Some(initial) = input.initial_stock {
            if initial < Decimal::ZERO {
                return Err(AppError::validation(
                    "initial_stock",
                    "Initial stock cannot be negative",
                    "Estoque inicial não pode ser negativo",
                ));
            }
        }
        Ok(())
    }

    /// Create an ingredient, recording any initial stock in the ledger
    pub async fn create(&self, business_id: Uuid, input: CreateIngredientInput) -> AppResult<Ingredient> {
        Self::validate_create(&input)?;

        SubscriptionService::new(self.db.clone())
            .ensure_can_create(business_id, PlanResource::Ingredients)
            .await?;

        self.ensure_unique_name(business_id, &input.name, None).await?;

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, IngredientRow>(&format!(
            r#"
            INSERT INTO ingredients (business_id, name, unit, cost_per_unit, min_stock)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {INGREDIENT_COLUMNS}
            "#
        ))
        .bind(business_id)
        .bind(input.name.trim())
        .bind(input.unit.as_str())
        .bind(input.cost_per_unit)
        .bind(input.min_stock)
        .fetch_one(&mut *tx)
        .await?;

        let mut ingredient = Ingredient::try_from(row)?;

        if let Some(initial) = input.initial_stock.filter(|q| *q > Decimal::ZERO) {
            let movement = NewStockMovement::stock_in(ingredient.id, initial, "Estoque inicial");
            StockService::write_movement(&mut *tx, business_id, &movement).await?;
            ingredient.stock_quantity = initial;
        }

        tx.commit().await?;

        tracing::info!(%business_id, ingredient_id = %ingredient.id, "Ingredient created");

        Ok(ingredient)
    }

    /// Get a single ingredient
    pub async fn get(&self, business_id: Uuid, ingredient_id: Uuid) -> AppResult<Ingredient> {
        let row = sqlx::query_as::<_, IngredientRow>(&format!(
            "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE id = $1 AND business_id = $2"
        ))
        .bind(ingredient_id)
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ingredient".to_string()))?;

        Ok(Ingredient::try_from(row)?)
    }

    /// List all ingredients of a business, by name
    pub async fn list(&self, business_id: Uuid) -> AppResult<Vec<Ingredient>> {
        let rows = sqlx::query_as::<_, IngredientRow>(&format!(
            "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE business_id = $1 ORDER BY name"
        ))
        .bind(business_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| Ingredient::try_from(row).map_err(AppError::from))
            .collect()
    }

    /// Update catalog fields of an ingredient
    pub async fn update(
        &self,
        business_id: Uuid,
        ingredient_id: Uuid,
        input: UpdateIngredientInput,
    ) -> AppResult<Ingredient> {
        let existing = self.get(business_id, ingredient_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let unit = input.unit.unwrap_or(existing.unit);
        let cost_per_unit = input.cost_per_unit.unwrap_or(existing.cost_per_unit);
        let min_stock = input.min_stock.or(existing.min_stock);

        AppError::check("name", shared::validate_name(&name))?;
        AppError::check("cost_per_unit", shared::validate_cost_per_unit(cost_per_unit))?;
        AppError::check("min_stock", shared::validate_min_stock(min_stock))?;
        self.ensure_unique_name(business_id, &name, Some(ingredient_id)).await?;

        let row = sqlx::query_as::<_, IngredientRow>(&format!(
            r#"
            UPDATE ingredients
            SET name = $1, unit = $2, cost_per_unit = $3, min_stock = $4, updated_at = NOW()
            WHERE id = $5 AND business_id = $6
            RETURNING {INGREDIENT_COLUMNS}
            "#
        ))
        .bind(name.trim())
        .bind(unit.as_str())
        .bind(cost_per_unit)
        .bind(min_stock)
        .bind(ingredient_id)
        .bind(business_id)
        .fetch_one(&self.db)
        .await?;

        Ok(Ingredient::try_from(row)?)
    }

    /// Delete an ingredient. Recipes that used it keep the dangling line, which
    /// costing skips.
    pub async fn delete(&self, business_id: Uuid, ingredient_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM ingredients WHERE id = $1 AND business_id = $2")
            .bind(ingredient_id)
            .bind(business_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Ingredient".to_string()));
        }

        tracing::info!(%business_id, %ingredient_id, "Ingredient deleted");
        Ok(())
    }

    async fn ensure_unique_name(
        &self,
        business_id: Uuid,
        name: &str,
        exclude_id: Option<Uuid>,
    ) -> AppResult<()> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM ingredients
                WHERE business_id = $1 AND LOWER(name) = LOWER($2)
                  AND ($3::uuid IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(business_id)
        .bind(name.trim())
        .bind(exclude_id)
        .fetch_one(&self.db)
        .await?;

        if taken {
            return Err(AppError::DuplicateEntry("name".to_string()));
        }
        Ok(())
    }
}
