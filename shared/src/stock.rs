//! Stock-versus-demand analysis over open orders

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::costing::{add_or_overflow, index_products, mul_or_overflow, ProductIndex};
use crate::error::DomainError;
use crate::models::{Ingredient, Order, Product, Unit};

/// Policy for splitting shortages into `low` and `critical`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StockPolicy {
    /// A shortage at or above this fraction of demand is critical.
    /// 0.5 means "stock covers less than half of what open orders need".
    pub critical_ratio: Decimal,
}

impl Default for StockPolicy {
    fn default() -> Self {
        Self {
            critical_ratio: Decimal::new(5, 1),
        }
    }
}

/// Classification of an ingredient's balance against pending demand
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    Sufficient,
    Low,
    Critical,
    Unused,
}

impl StockStatus {
    pub fn needs_attention(&self) -> bool {
        matches!(self, StockStatus::Low | StockStatus::Critical)
    }
}

impl StockPolicy {
    pub fn classify(&self, stock: Decimal, demand: Decimal) -> StockStatus {
        if demand <= Decimal::ZERO {
            return StockStatus::Unused;
        }

        if stock >= demand {
            return StockStatus::Sufficient;
        }

        // A shortage too large to represent is critical
        match demand.checked_sub(stock).and_then(|s| s.checked_div(demand)) {
            Some(ratio) if ratio < self.critical_ratio => StockStatus::Low,
            _ => StockStatus::Critical,
        }
    }
}

/// Ingredient quantities consumed by one order, following each product's
/// bill of materials. Lines whose product no longer exists are skipped.
pub fn order_consumption(
    order: &Order,
    products: &ProductIndex<'_>,
) -> Result<HashMap<Uuid, Decimal>, DomainError> {
    let mut consumption: HashMap<Uuid, Decimal> = HashMap::new();

    for item in &order.items {
        let Some(product) = products.get(&item.product_id) else {
            continue;
        };
        for recipe_item in &product.recipe {
            let quantity = mul_or_overflow(recipe_item.quantity, item.quantity, "consumption")?;
            let total = consumption.entry(recipe_item.ingredient_id).or_default();
            *total = add_or_overflow(*total, quantity, "consumption")?;
        }
    }

    Ok(consumption)
}

/// Projected consumption across the orders that are still open.
/// Delivered and cancelled orders contribute nothing.
pub fn compute_demand<'a, I>(
    orders: I,
    products: &ProductIndex<'_>,
) -> Result<HashMap<Uuid, Decimal>, DomainError>
where
    I: IntoIterator<Item = &'a Order>,
{
    let mut demand: HashMap<Uuid, Decimal> = HashMap::new();

    for order in orders.into_iter().filter(|o| o.is_open()) {
        for (ingredient_id, quantity) in order_consumption(order, products)? {
            let total = demand.entry(ingredient_id).or_default();
            *total = add_or_overflow(*total, quantity, "demand")?;
        }
    }

    Ok(demand)
}

/// Balance of one ingredient against pending demand
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngredientBalance {
    pub ingredient_id: Uuid,
    pub name: String,
    pub unit: Unit,
    pub demand: Decimal,
    pub stock: Decimal,
    pub balance: Decimal,
    pub status: StockStatus,
    /// Balance dropped under the ingredient's configured minimum
    pub below_minimum: bool,
}

/// Compare each ingredient's stock with the demand implied by `orders`
pub fn analyze_stock(
    ingredients: &[Ingredient],
    orders: &[Order],
    products: &[Product],
    policy: &StockPolicy,
) -> Result<Vec<IngredientBalance>, DomainError> {
    let product_index = index_products(products);
    let demand = compute_demand(orders, &product_index)?;

    ingredients
        .iter()
        .map(|ingredient| -> Result<IngredientBalance, DomainError> {
            let demand = demand.get(&ingredient.id).copied().unwrap_or_default();
            let balance = ingredient
                .stock_quantity
                .checked_sub(demand)
                .ok_or(DomainError::Overflow("stock balance"))?;

            Ok(IngredientBalance {
                ingredient_id: ingredient.id,
                name: ingredient.name.clone(),
                unit: ingredient.unit,
                demand,
                stock: ingredient.stock_quantity,
                balance,
                status: policy.classify(ingredient.stock_quantity, demand),
                below_minimum: ingredient.min_stock.is_some_and(|min| balance < min),
            })
        })
        .collect()
}

/// Counts per status, for dashboard badges
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockStatusCounts {
    pub sufficient: usize,
    pub low: usize,
    pub critical: usize,
    pub unused: usize,
}

pub fn count_statuses(balances: &[IngredientBalance]) -> StockStatusCounts {
    balances
        .iter()
        .fold(StockStatusCounts::default(), |mut counts, b| {
            match b.status {
                StockStatus::Sufficient => counts.sufficient += 1,
                StockStatus::Low => counts.low += 1,
                StockStatus::Critical => counts.critical += 1,
                StockStatus::Unused => counts.unused += 1,
            }
            counts
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderItem, OrderStatus, RecipeItem};
    use chrono::Utc;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn ingredient(name: &str, stock: &str) -> Ingredient {
        Ingredient {
            id: Uuid::new_v4(),
            business_id: Uuid::nil(),
            name: name.to_string(),
            unit: Unit::Kg,
            cost_per_unit: dec("10"),
            stock_quantity: dec(stock),
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

    fn order(status: OrderStatus, product_id: Uuid, quantity: &str) -> Order {
        Order {
            id: Uuid::new_v4(),
            business_id: Uuid::nil(),
            customer_name: "Maria".to_string(),
            status,
            items: vec![OrderItem {
                product_id,
                quantity: dec(quantity),
                unit_price: dec("40"),
            }],
            delivery_date: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_classification_bands() {
        let policy = StockPolicy::default();
        assert_eq!(policy.classify(dec("5"), Decimal::ZERO), StockStatus::Unused);
        assert_eq!(policy.classify(dec("5"), dec("5")), StockStatus::Sufficient);
        assert_eq!(policy.classify(dec("4"), dec("5")), StockStatus::Low);
        assert_eq!(policy.classify(dec("2.5"), dec("5")), StockStatus::Critical);
        assert_eq!(policy.classify(dec("-1"), dec("5")), StockStatus::Critical);
        assert_eq!(policy.classify(Decimal::MIN, Decimal::MAX), StockStatus::Critical);
    }

    #[test]
    fn test_demand_overflow_is_an_error() {
        let sugar = ingredient("Açúcar", "0");
        let candy = product(vec![RecipeItem::new(sugar.id, Decimal::MAX)]);
        let orders = [order(OrderStatus::Pending, candy.id, "2")];

        let result = analyze_stock(&[sugar], &orders, &[candy], &StockPolicy::default());
        assert_eq!(result, Err(DomainError::Overflow("consumption")));
    }

    #[test]
    fn test_terminal_orders_add_no_demand() {
        let flour = ingredient("Farinha", "1");
        let cake = product(vec![RecipeItem::new(flour.id, dec("0.5"))]);
        let orders = vec![
            order(OrderStatus::Pending, cake.id, "2"),
            order(OrderStatus::Delivered, cake.id, "100"),
            order(OrderStatus::Cancelled, cake.id, "100"),
        ];

        let balances = analyze_stock(
            &[flour.clone()],
            &orders,
            &[cake],
            &StockPolicy::default(),
        )
        .unwrap();

        assert_eq!(balances[0].demand, dec("1.0"));
        assert_eq!(balances[0].balance, Decimal::ZERO);
        assert_eq!(balances[0].status, StockStatus::Sufficient);
    }

    #[test]
    fn test_demand_multiplies_recipe_by_order_quantity() {
        let chocolate = ingredient("Chocolate", "0");
        let brownie = product(vec![
            RecipeItem::new(chocolate.id, dec("0.1")),
            RecipeItem::new(chocolate.id, dec("0.05")),
        ]);
        let products = [brownie.clone()];
        let index = index_products(&products);
        let orders = [
            order(OrderStatus::Preparing, brownie.id, "4"),
            order(OrderStatus::Ready, brownie.id, "2"),
        ];

        let demand = compute_demand(orders.iter(), &index).unwrap();
        assert_eq!(demand[&chocolate.id], dec("0.9"));
    }

    #[test]
    fn test_unknown_product_lines_are_skipped() {
        let index = ProductIndex::new();
        let pending = order(OrderStatus::Pending, Uuid::new_v4(), "3");
        assert!(order_consumption(&pending, &index).unwrap().is_empty());
    }

    #[test]
    fn test_below_minimum_flag() {
        let mut milk = ingredient("Leite", "3");
        milk.min_stock = Some(dec("2"));
        let pudding = product(vec![RecipeItem::new(milk.id, dec("1"))]);
        let orders = [order(OrderStatus::Pending, pudding.id, "2")];

        let balances =
            analyze_stock(&[milk], &orders, &[pudding], &StockPolicy::default()).unwrap();
        assert_eq!(balances[0].balance, dec("1"));
        assert!(balances[0].below_minimum);
        assert_eq!(balances[0].status, StockStatus::Sufficient);
    }

    #[test]
    fn test_count_statuses() {
        let used = ingredient("Farinha", "0");
        let idle = ingredient("Fermento", "3");
        let bread = product(vec![RecipeItem::new(used.id, dec("1"))]);
        let orders = [order(OrderStatus::Pending, bread.id, "1")];

        let balances =
            analyze_stock(&[used, idle], &orders, &[bread], &StockPolicy::default()).unwrap();
        let counts = count_statuses(&balances);
        assert_eq!(counts.critical, 1);
        assert_eq!(counts.unused, 1);
    }
}
