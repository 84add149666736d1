//! WebAssembly module for Cozinha ao Lucro
//!
//! Provides client-side computation for:
//! - Recipe cost and margin previews while editing a product
//! - Stock status previews
//! - Form validation before submit

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

use shared::{index_ingredients, margin_percent, roll_up_cost, CostBreakdown, StockPolicy};

#[derive(Serialize)]
struct RecipePreview {
    #[serde(flatten)]
    breakdown: CostBreakdown,
    margin_percent: Option<Decimal>,
}

fn to_decimal(value: f64, field: &str) -> Result<Decimal, JsValue> {
    Decimal::try_from(value).map_err(|_| JsValue::from_str(&format!("Invalid {}: {}", field, value)))
}

/// Cost breakdown and margin of a draft recipe.
///
/// `recipe_json` is a list of `{ingredient_id, quantity}`; `ingredients_json`
/// is the ingredient list as returned by the API.
#[wasm_bindgen]
pub fn preview_recipe_cost(
    recipe_json: &str,
    ingredients_json: &str,
    selling_price: f64,
) -> Result<String, JsValue> {
    let recipe: Vec<RecipeItem> = serde_json::from_str(recipe_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid recipe JSON: {}", e)))?;
    let ingredients: Vec<Ingredient> = serde_json::from_str(ingredients_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid ingredients JSON: {}", e)))?;
    let price = to_decimal(selling_price, "selling price")?;

    let recipe = merge_recipe_items(recipe).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let breakdown = roll_up_cost(&recipe, &index_ingredients(&ingredients))
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let preview = RecipePreview {
        margin_percent: margin_percent(price, breakdown.total_cost),
        breakdown,
    };

    serde_json::to_string(&preview).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Margin percentage; undefined (None) for a zero price
#[wasm_bindgen]
pub fn calculate_margin(selling_price: f64, total_cost: f64) -> Option<f64> {
    let price = Decimal::try_from(selling_price).ok()?;
    let cost = Decimal::try_from(total_cost).ok()?;
    margin_percent(price, cost).and_then(|m| m.to_f64())
}

/// Stock status for one ingredient: sufficient, low, critical or unused
#[wasm_bindgen]
pub fn classify_stock(stock: f64, demand: f64, critical_ratio: f64) -> Result<String, JsValue> {
    let policy = StockPolicy {
        critical_ratio: to_decimal(critical_ratio, "critical ratio")?,
    };
    let status = policy.classify(to_decimal(stock, "stock")?, to_decimal(demand, "demand")?);

    serde_json::to_value(status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .ok_or_else(|| JsValue::from_str("Unable to encode stock status"))
}

/// Validate the required product fields; returns the first error message
#[wasm_bindgen]
pub fn validate_product_form(name: &str, selling_price: f64) -> Option<String> {
    if let Err(e) = validate_name(name) {
        return Some(e.to_string());
    }
    let price = Decimal::try_from(selling_price).unwrap_or(Decimal::ZERO);
    validate_selling_price(price).err().map(str::to_string)
}

/// Whether a stock balance needs a regularization
#[wasm_bindgen]
pub fn needs_reconciliation(stock_quantity: f64) -> bool {
    stock_quantity < 0.0
}
