//! Database models for Cozinha ao Lucro
//!
//! Re-exports models from the shared crate and adds the row shapes read from
//! PostgreSQL, with conversions into the shared domain types.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

pub use shared::models::*;
use shared::DomainError;

/// Row of the `ingredients` table
#[derive(Debug, Clone, FromRow)]
pub struct IngredientRow {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub unit: String,
    pub cost_per_unit: Decimal,
    pub stock_quantity: Decimal,
    pub min_stock: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<IngredientRow> for Ingredient {
    type Error = DomainError;

    fn try_from(row: IngredientRow) -> Result<Self, Self::Error> {
        Ok(Ingredient {
            id: row.id,
            business_id: row.business_id,
            name: row.name,
            unit: row.unit.parse()?,
            cost_per_unit: row.cost_per_unit,
            stock_quantity: row.stock_quantity,
            min_stock: row.min_stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Row of the `products` table
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub selling_price: Decimal,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row of the `product_ingredients` table (one bill-of-materials line)
#[derive(Debug, Clone, FromRow)]
pub struct RecipeItemRow {
    pub product_id: Uuid,
    pub ingredient_id: Uuid,
    pub quantity: Decimal,
}

/// Attach recipe lines to their products, keeping the product order
pub fn assemble_products(rows: Vec<ProductRow>, items: Vec<RecipeItemRow>) -> Vec<Product> {
    let mut recipes: HashMap<Uuid, Vec<RecipeItem>> = HashMap::new();
    for item in items {
        recipes
            .entry(item.product_id)
            .or_default()
            .push(RecipeItem::new(item.ingredient_id, item.quantity));
    }

    rows.into_iter()
        .map(|row| Product {
            recipe: recipes.remove(&row.id).unwrap_or_default(),
            id: row.id,
            business_id: row.business_id,
            name: row.name,
            selling_price: row.selling_price,
            category: row.category,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .collect()
}

/// Row of the `orders` table
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub business_id: Uuid,
    pub customer_name: String,
    pub status: String,
    pub delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row of the `order_items` table
#[derive(Debug, Clone, FromRow)]
pub struct OrderItemRow {
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

/// Attach line items to their orders, keeping the order sequence
pub fn assemble_orders(
    rows: Vec<OrderRow>,
    items: Vec<OrderItemRow>,
) -> Result<Vec<Order>, DomainError> {
    let mut lines: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in items {
        lines.entry(item.order_id).or_default().push(OrderItem {
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
        });
    }

    rows.into_iter()
        .map(|row| {
            Ok(Order {
                status: row.status.parse()?,
                items: lines.remove(&row.id).unwrap_or_default(),
                id: row.id,
                business_id: row.business_id,
                customer_name: row.customer_name,
                delivery_date: row.delivery_date,
                notes: row.notes,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
        })
        .collect()
}

/// Row of the `stock_movements` table
#[derive(Debug, Clone, FromRow)]
pub struct StockMovementRow {
    pub id: Uuid,
    pub business_id: Uuid,
    pub ingredient_id: Uuid,
    pub movement_type: String,
    pub quantity: Decimal,
    pub reason: String,
    pub order_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<StockMovementRow> for StockMovement {
    type Error = DomainError;

    fn try_from(row: StockMovementRow) -> Result<Self, Self::Error> {
        Ok(StockMovement {
            id: row.id,
            business_id: row.business_id,
            ingredient_id: row.ingredient_id,
            movement_type: row.movement_type.parse()?,
            quantity: row.quantity,
            reason: row.reason,
            order_id: row.order_id,
            created_at: row.created_at,
        })
    }
}
