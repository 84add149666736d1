//! Cost roll-up tests
//!
//! Tests for recipe costing including:
//! - Total cost is the sum of quantity × cost over resolvable ingredients
//! - Margin is (price - cost) / price, negative when cost exceeds price
//! - Deleted ingredients are skipped and reported

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    cost_product, index_ingredients, margin_percent, roll_up_cost, Ingredient, Product,
    RecipeItem, Unit,
};
use std::str::FromStr;
use uuid::Uuid;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn ingredient(name: &str, unit: Unit, cost: Decimal) -> Ingredient {
    Ingredient {
        id: Uuid::new_v4(),
        business_id: Uuid::nil(),
        name: name.to_string(),
        unit,
        cost_per_unit: cost,
        stock_quantity: Decimal::ZERO,
        min_stock: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn product(name: &str, price: Decimal, recipe: Vec<RecipeItem>) -> Product {
    Product {
        id: Uuid::new_v4(),
        business_id: Uuid::nil(),
        name: name.to_string(),
        selling_price: price,
        category: None,
        recipe,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Brownie: flour 0.03kg at R$5/kg plus one egg at R$1
    #[test]
    fn test_brownie_cost_and_margin() {
        let flour = ingredient("Farinha", Unit::Kg, dec("5"));
        let egg = ingredient("Ovo", Unit::Un, dec("1"));
        let brownie = product(
            "Brownie",
            dec("8.00"),
            vec![
                RecipeItem::new(flour.id, dec("0.03")),
                RecipeItem::new(egg.id, dec("1")),
            ],
        );

        let ingredients = vec![flour, egg];
        let costing = cost_product(&brownie, &index_ingredients(&ingredients)).unwrap();

        assert_eq!(costing.total_cost, dec("1.15"));
        assert_eq!(costing.profit_per_unit, dec("6.85"));
        assert_eq!(costing.margin_percent.map(|m| m.round_dp(1)), Some(dec("85.6")));
        assert_eq!(costing.lines.len(), 2);
        assert_eq!(costing.lines[0].line_cost, dec("0.15"));
    }

    #[test]
    fn test_margin_negative_when_cost_exceeds_price() {
        let margin = margin_percent(dec("10"), dec("15")).unwrap();
        assert_eq!(margin, dec("-50"));
    }

    #[test]
    fn test_margin_undefined_for_zero_price() {
        assert_eq!(margin_percent(Decimal::ZERO, dec("3")), None);
    }

    #[test]
    fn test_deleted_ingredient_is_skipped_and_reported() {
        let sugar = ingredient("Açúcar", Unit::Kg, dec("4"));
        let deleted = Uuid::new_v4();
        let recipe = vec![
            RecipeItem::new(sugar.id, dec("0.5")),
            RecipeItem::new(deleted, dec("2")),
        ];

        let ingredients = vec![sugar];
        let breakdown = roll_up_cost(&recipe, &index_ingredients(&ingredients)).unwrap();

        assert_eq!(breakdown.total_cost, dec("2.0"));
        assert_eq!(breakdown.lines.len(), 1);
        assert_eq!(breakdown.unresolved, vec![deleted]);
    }

    #[test]
    fn test_empty_recipe_costs_nothing() {
        let bread = product("Pão", dec("12"), vec![]);
        let costing = cost_product(&bread, &index_ingredients(&[])).unwrap();

        assert_eq!(costing.total_cost, Decimal::ZERO);
        assert_eq!(costing.margin_percent, Some(dec("100")));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating recipe quantities (0.001 to 10.000)
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10000i64).prop_map(|n| Decimal::new(n, 3))
    }

    /// Strategy for generating unit costs (0.00 to 500.00)
    fn cost_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=50000i64).prop_map(|n| Decimal::new(n, 2))
    }

    /// Strategy for generating selling prices (0.01 to 1000.00)
    fn price_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Total cost equals Σ cost_per_unit × quantity over resolvable lines
        #[test]
        fn prop_total_cost_is_sum_of_resolvable_lines(
            lines in prop::collection::vec((quantity_strategy(), cost_strategy(), any::<bool>()), 0..12)
        ) {
            let mut ingredients = Vec::new();
            let mut recipe = Vec::new();
            let mut expected = Decimal::ZERO;
            let mut missing = 0;

            for (quantity, cost, resolvable) in &lines {
                let item = ingredient("x", Unit::G, *cost);
                recipe.push(RecipeItem::new(item.id, *quantity));
                if *resolvable {
                    expected += *quantity * *cost;
                    ingredients.push(item);
                } else {
                    missing += 1;
                }
            }

            let breakdown = roll_up_cost(&recipe, &index_ingredients(&ingredients)).unwrap();

            prop_assert_eq!(breakdown.total_cost, expected);
            prop_assert_eq!(breakdown.unresolved.len(), missing);
            prop_assert_eq!(breakdown.lines.len() + missing, lines.len());
        }

        /// Margin has the sign of the profit and never fails for a positive price
        #[test]
        fn prop_margin_sign_follows_profit(
            price in price_strategy(),
            cost in cost_strategy()
        ) {
            let margin = margin_percent(price, cost);
            prop_assert!(margin.is_some());
            let margin = margin.unwrap();

            if cost > price {
                prop_assert!(margin < Decimal::ZERO);
            } else if cost == price {
                prop_assert_eq!(margin, Decimal::ZERO);
            } else {
                prop_assert!(margin > Decimal::ZERO);
                prop_assert!(margin <= Decimal::ONE_HUNDRED);
            }
        }
    }
}
