//! Negative-stock reconciliation planning
//!
//! An open order whose bill of materials touches an ingredient with negative
//! stock can be regularized: one stock-in per affected ingredient brings the
//! balance back to exactly zero. Deficits are always recomputed from current
//! stock, so planning against already-corrected ingredients yields nothing.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::costing::{IngredientIndex, ProductIndex};
use crate::error::DomainError;
use crate::models::{Ingredient, NewStockMovement, Order, Unit};
use crate::stock::order_consumption;

/// A negative balance found on an ingredient used by an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deficit {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub unit: Unit,
    pub stock_quantity: Decimal,
    pub deficit: Decimal,
}

impl Deficit {
    fn from_ingredient(ingredient: &Ingredient) -> Self {
        Self {
            ingredient_id: ingredient.id,
            ingredient_name: ingredient.name.clone(),
            unit: ingredient.unit,
            stock_quantity: ingredient.stock_quantity,
            deficit: ingredient.deficit(),
        }
    }
}

pub fn regularization_reason(order_id: Uuid) -> String {
    format!("Regularização de estoque - pedido {}", order_id)
}

pub fn consumption_reason(order_id: Uuid) -> String {
    format!("Consumo - pedido {}", order_id)
}

/// Ingredients touched by `order` that currently sit below zero.
///
/// Terminal orders never trigger reconciliation. Each ingredient appears at
/// most once, in the order it is first met in the order's recipes.
pub fn find_deficits(
    order: &Order,
    products: &ProductIndex<'_>,
    ingredients: &IngredientIndex<'_>,
) -> Vec<Deficit> {
    if !order.is_open() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut deficits = Vec::new();

    for item in &order.items {
        let Some(product) = products.get(&item.product_id) else {
            continue;
        };
        for recipe_item in &product.recipe {
            if !seen.insert(recipe_item.ingredient_id) {
                continue;
            }
            match ingredients.get(&recipe_item.ingredient_id) {
                Some(ingredient) if ingredient.is_negative() => {
                    deficits.push(Deficit::from_ingredient(ingredient));
                }
                _ => {}
            }
        }
    }

    deficits
}

/// Stock-in movements that zero every deficit of `order`
pub fn plan_reconciliation(
    order: &Order,
    products: &ProductIndex<'_>,
    ingredients: &IngredientIndex<'_>,
) -> Vec<NewStockMovement> {
    find_deficits(order, products, ingredients)
        .into_iter()
        .map(|d| {
            NewStockMovement::stock_in(d.ingredient_id, d.deficit, regularization_reason(order.id))
                .for_order(order.id)
        })
        .collect()
}

/// Stock-outs for a delivered order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsumptionPlan {
    pub movements: Vec<NewStockMovement>,
    /// Recipe ingredients that no longer exist; nothing is written for them
    pub unresolved: Vec<Uuid>,
}

/// Stock-out movements recording what `order` consumed, one per ingredient
/// that still exists in `ingredients`
pub fn plan_consumption(
    order: &Order,
    products: &ProductIndex<'_>,
    ingredients: &IngredientIndex<'_>,
) -> Result<ConsumptionPlan, DomainError> {
    let mut consumption: Vec<(Uuid, Decimal)> = order_consumption(order, products)?
        .into_iter()
        .filter(|(_, quantity)| *quantity > Decimal::ZERO)
        .collect();
    consumption.sort_by_key(|(ingredient_id, _)| *ingredient_id);

    let mut plan = ConsumptionPlan::default();
    for (ingredient_id, quantity) in consumption {
        if !ingredients.contains_key(&ingredient_id) {
            plan.unresolved.push(ingredient_id);
            continue;
        }
        plan.movements.push(
            NewStockMovement::stock_out(ingredient_id, quantity, consumption_reason(order.id))
                .for_order(order.id),
        );
    }

    Ok(plan)
}

/// An open order together with the deficits it would reconcile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingReconciliation {
    pub order_id: Uuid,
    pub customer_name: String,
    pub deficits: Vec<Deficit>,
}

pub fn pending_reconciliations<'a, I>(
    orders: I,
    products: &ProductIndex<'_>,
    ingredients: &IngredientIndex<'_>,
) -> Vec<PendingReconciliation>
where
    I: IntoIterator<Item = &'a Order>,
{
    orders
        .into_iter()
        .filter_map(|order| {
            let deficits = find_deficits(order, products, ingredients);
            (!deficits.is_empty()).then(|| PendingReconciliation {
                order_id: order.id,
                customer_name: order.customer_name.clone(),
                deficits,
            })
        })
        .collect()
}
