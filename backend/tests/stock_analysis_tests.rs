//! Stock-versus-demand tests
//!
//! Tests for the demand analyzer including:
//! - Delivered and cancelled orders contribute zero demand
//! - Balance is stock minus demand
//! - Classification into sufficient, low, critical and unused

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    analyze_stock, compute_demand, count_statuses, index_products, Ingredient, Order, OrderItem,
    OrderStatus, Product, RecipeItem, StockPolicy, StockStatus, Unit,
};
use std::str::FromStr;
use uuid::Uuid;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn ingredient(name: &str, stock: Decimal) -> Ingredient {
    Ingredient {
        id: Uuid::new_v4(),
        business_id: Uuid::nil(),
        name: name.to_string(),
        unit: Unit::Kg,
        cost_per_unit: dec("10"),
        stock_quantity: stock,
        min_stock: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn product(recipe: Vec<RecipeItem>) -> Product {
    Product {
        id: Uuid::new_v4(),
        business_id: Uuid::nil(),
        name: "Bolo".to_string(),
        selling_price: dec("40"),
        category: None,
        recipe,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn order(status: OrderStatus, items: Vec<(Uuid, Decimal)>) -> Order {
    Order {
        id: Uuid::new_v4(),
        business_id: Uuid::nil(),
        customer_name: "Cliente".to_string(),
        status,
        items: items
            .into_iter()
            .map(|(product_id, quantity)| OrderItem {
                product_id,
                quantity,
                unit_price: dec("40"),
            })
            .collect(),
        delivery_date: None,
        notes: None,
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

    #[test]
    fn test_demand_multiplies_recipe_by_order_quantity() {
        let flour = ingredient("Farinha", dec("1"));
        let cake = product(vec![RecipeItem::new(flour.id, dec("0.25"))]);
        let orders = vec![
            order(OrderStatus::Pending, vec![(cake.id, dec("3"))]),
            order(OrderStatus::Ready, vec![(cake.id, dec("1"))]),
        ];

        let products = vec![cake];
        let demand = compute_demand(&orders, &index_products(&products)).unwrap();

        assert_eq!(demand.get(&flour.id), Some(&dec("1.00")));
    }

    #[test]
    fn test_terminal_orders_do_not_count() {
        let flour = ingredient("Farinha", dec("1"));
        let cake = product(vec![RecipeItem::new(flour.id, dec("0.5"))]);
        let orders = vec![
            order(OrderStatus::Delivered, vec![(cake.id, dec("10"))]),
            order(OrderStatus::Cancelled, vec![(cake.id, dec("10"))]),
        ];

        let products = vec![cake];
        let demand = compute_demand(&orders, &index_products(&products)).unwrap();

        assert!(demand.is_empty());
    }

    #[test]
    fn test_missing_product_is_skipped() {
        let orders = vec![order(OrderStatus::Pending, vec![(Uuid::new_v4(), dec("2"))])];
        let demand = compute_demand(&orders, &index_products(&[])).unwrap();
        assert!(demand.is_empty());
    }

    #[test]
    fn test_analysis_classifies_each_ingredient() {
        let flour = ingredient("Farinha", dec("5"));
        let sugar = ingredient("Açúcar", dec("0.9"));
        let cocoa = ingredient("Cacau", dec("0.2"));
        let salt = ingredient("Sal", dec("1"));
        let cake = product(vec![
            RecipeItem::new(flour.id, dec("1")),
            RecipeItem::new(sugar.id, dec("0.5")),
            RecipeItem::new(cocoa.id, dec("0.5")),
        ]);
        let orders = vec![order(OrderStatus::Preparing, vec![(cake.id, dec("2"))])];

        let ingredients = vec![flour, sugar, cocoa, salt];
        let balances = analyze_stock(&ingredients, &orders, &[cake], &StockPolicy::default()).unwrap();

        // flour: 5 - 2 = 3
        assert_eq!(balances[0].balance, dec("3"));
        assert_eq!(balances[0].status, StockStatus::Sufficient);
        // sugar: 0.9 - 1 = -0.1, shortage is 10% of demand
        assert_eq!(balances[1].balance, dec("-0.1"));
        assert_eq!(balances[1].status, StockStatus::Low);
        // cocoa: 0.2 - 1 = -0.8, shortage is 80% of demand
        assert_eq!(balances[2].status, StockStatus::Critical);
        // salt is not used by any open order
        assert_eq!(balances[3].demand, Decimal::ZERO);
        assert_eq!(balances[3].status, StockStatus::Unused);

        let counts = count_statuses(&balances);
        assert_eq!((counts.sufficient, counts.low, counts.critical, counts.unused), (1, 1, 1, 1));
    }

    #[test]
    fn test_critical_ratio_is_configurable() {
        let strict = StockPolicy {
            critical_ratio: dec("0.05"),
        };
        assert_eq!(strict.classify(dec("0.9"), dec("1")), StockStatus::Critical);
        assert_eq!(
            StockPolicy::default().classify(dec("0.9"), dec("1")),
            StockStatus::Low
        );
    }

    #[test]
    fn test_below_minimum_flag() {
        let mut flour = ingredient("Farinha", dec("3"));
        flour.min_stock = Some(dec("2"));
        let cake = product(vec![RecipeItem::new(flour.id, dec("1.5"))]);
        let orders = vec![order(OrderStatus::Pending, vec![(cake.id, dec("1"))])];

        let balances = analyze_stock(&[flour], &orders, &[cake], &StockPolicy::default()).unwrap();

        assert_eq!(balances[0].status, StockStatus::Sufficient);
        assert!(balances[0].below_minimum);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating quantities (0.1 to 100.0)
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=1000i64).prop_map(|n| Decimal::new(n, 1))
    }

    /// Strategy for generating signed stock (-50.0 to 50.0)
    fn stock_strategy() -> impl Strategy<Value = Decimal> {
        (-500i64..=500i64).prop_map(|n| Decimal::new(n, 1))
    }

    fn terminal_status_strategy() -> impl Strategy<Value = OrderStatus> {
        prop_oneof![Just(OrderStatus::Delivered), Just(OrderStatus::Cancelled)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Delivered and cancelled orders contribute zero demand, whatever their items
        #[test]
        fn prop_terminal_orders_contribute_zero(
            status in terminal_status_strategy(),
            recipe_qty in quantity_strategy(),
            order_qtys in prop::collection::vec(quantity_strategy(), 1..8)
        ) {
            let flour = ingredient("Farinha", Decimal::ZERO);
            let cake = product(vec![RecipeItem::new(flour.id, recipe_qty)]);
            let items = order_qtys.iter().map(|q| (cake.id, *q)).collect();
            let orders = vec![order(status, items)];

            let balances = analyze_stock(&[flour], &orders, &[cake], &StockPolicy::default()).unwrap();

            prop_assert_eq!(balances[0].demand, Decimal::ZERO);
            prop_assert_eq!(balances[0].status, StockStatus::Unused);
        }

        /// Balance is stock minus demand and the status agrees with its sign
        #[test]
        fn prop_balance_and_status_agree(
            stock in stock_strategy(),
            recipe_qty in quantity_strategy(),
            order_qty in quantity_strategy()
        ) {
            let flour = ingredient("Farinha", stock);
            let cake = product(vec![RecipeItem::new(flour.id, recipe_qty)]);
            let orders = vec![order(OrderStatus::Pending, vec![(cake.id, order_qty)])];

            let balances = analyze_stock(&[flour], &orders, &[cake], &StockPolicy::default()).unwrap();
            let b = &balances[0];

            prop_assert_eq!(b.demand, recipe_qty * order_qty);
            prop_assert_eq!(b.balance, stock - b.demand);
            if b.balance >= Decimal::ZERO {
                prop_assert_eq!(b.status, StockStatus::Sufficient);
            } else {
                prop_assert!(b.status.needs_attention());
            }
        }
    }
}
