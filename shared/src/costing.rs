//! Recipe cost roll-up and margin computation

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::{Ingredient, Product, RecipeItem, Unit};

/// Lookup of ingredients by id, borrowed from an already-fetched list
pub type IngredientIndex<'a> = HashMap<Uuid, &'a Ingredient>;

/// Lookup of products by id
pub type ProductIndex<'a> = HashMap<Uuid, &'a Product>;

pub fn index_ingredients(ingredients: &[Ingredient]) -> IngredientIndex<'_> {
    ingredients.iter().map(|i| (i.id, i)).collect()
}

pub fn index_products(products: &[Product]) -> ProductIndex<'_> {
    products.iter().map(|p| (p.id, p)).collect()
}

/// `a × b`, failing with `what` instead of panicking past `Decimal::MAX`
pub fn mul_or_overflow(a: Decimal, b: Decimal, what: &'static str) -> Result<Decimal, DomainError> {
    a.checked_mul(b).ok_or(DomainError::Overflow(what))
}

pub fn add_or_overflow(a: Decimal, b: Decimal, what: &'static str) -> Result<Decimal, DomainError> {
    a.checked_add(b).ok_or(DomainError::Overflow(what))
}

/// Cost contribution of one recipe line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostLine {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub unit: Unit,
    pub quantity: Decimal,
    pub cost_per_unit: Decimal,
    pub line_cost: Decimal,
}

/// Result of rolling up a bill of materials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CostBreakdown {
    pub lines: Vec<CostLine>,
    pub total_cost: Decimal,
    /// Recipe lines whose ingredient no longer exists. They are left out of
    /// `total_cost`.
    pub unresolved: Vec<Uuid>,
}

/// Sum `quantity × cost_per_unit` over the resolvable lines of a recipe
pub fn roll_up_cost(
    recipe: &[RecipeItem],
    ingredients: &IngredientIndex<'_>,
) -> Result<CostBreakdown, DomainError> {
    let mut breakdown = CostBreakdown::default();

    for item in recipe {
        let Some(ingredient) = ingredients.get(&item.ingredient_id) else {
            breakdown.unresolved.push(item.ingredient_id);
            continue;
        };

        let line_cost = mul_or_overflow(item.quantity, ingredient.cost_per_unit, "recipe line cost")?;
        breakdown.total_cost = add_or_overflow(breakdown.total_cost, line_cost, "recipe cost")?;
        breakdown.lines.push(CostLine {
            ingredient_id: ingredient.id,
            ingredient_name: ingredient.name.clone(),
            unit: ingredient.unit,
            quantity: item.quantity,
            cost_per_unit: ingredient.cost_per_unit,
            line_cost,
        });
    }

    Ok(breakdown)
}

/// Margin as a percentage of the selling price: `(price - cost) / price × 100`.
///
/// Negative when cost exceeds price. `None` for a zero price, where the
/// margin is undefined, and when the result does not fit in a `Decimal`.
pub fn margin_percent(selling_price: Decimal, total_cost: Decimal) -> Option<Decimal> {
    if selling_price.is_zero() {
        return None;
    }
    selling_price
        .checked_sub(total_cost)?
        .checked_div(selling_price)?
        .checked_mul(Decimal::ONE_HUNDRED)
}

/// Cost and margin view of a product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductCosting {
    pub product_id: Uuid,
    pub name: String,
    pub selling_price: Decimal,
    pub total_cost: Decimal,
    pub profit_per_unit: Decimal,
    pub margin_percent: Option<Decimal>,
    pub lines: Vec<CostLine>,
    pub unresolved: Vec<Uuid>,
}

pub fn cost_product(
    product: &Product,
    ingredients: &IngredientIndex<'_>,
) -> Result<ProductCosting, DomainError> {
    let breakdown = roll_up_cost(&product.recipe, ingredients)?;
    let profit_per_unit = product
        .selling_price
        .checked_sub(breakdown.total_cost)
        .ok_or(DomainError::Overflow("profit per unit"))?;

    Ok(ProductCosting {
        product_id: product.id,
        name: product.name.clone(),
        selling_price: product.selling_price,
        total_cost: breakdown.total_cost,
        profit_per_unit,
        margin_percent: margin_percent(product.selling_price, breakdown.total_cost),
        lines: breakdown.lines,
        unresolved: breakdown.unresolved,
    })
}
