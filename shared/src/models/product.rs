//! Product (recipe) models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::costing::add_or_overflow;
use crate::DomainError;

/// A product sold by the business, together with its bill of materials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub selling_price: Decimal,
    pub category: Option<String>,
    pub recipe: Vec<RecipeItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of a bill of materials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipeItem {
    pub ingredient_id: Uuid,
    /// Amount of the ingredient consumed per unit of product sold
    pub quantity: Decimal,
}

impl RecipeItem {
    pub fn new(ingredient_id: Uuid, quantity: Decimal) -> Self {
        Self {
            ingredient_id,
            quantity,
        }
    }
}

/// Merge recipe lines that reference the same ingredient, keeping first-seen order
pub fn merge_recipe_items(items: Vec<RecipeItem>) -> Result<Vec<RecipeItem>, DomainError> {
    let mut merged: Vec<RecipeItem> = Vec::with_capacity(items.len());
    for item in items {
        match merged
            .iter_mut()
            .find(|m| m.ingredient_id == item.ingredient_id)
        {
            Some(existing) => {
                existing.quantity =
                    add_or_overflow(existing.quantity, item.quantity, "recipe quantity")?;
            }
            None => merged.push(item),
        }
    }
    Ok(merged)
}
