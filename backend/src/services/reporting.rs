//! Reporting service for the dashboard summary and costing export

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Ingredient, Order, OrderStatus, Product};
use crate::services::ingredient::IngredientService;
use crate::services::order::{OrderFilter, OrderService};
use crate::services::product::ProductService;
use shared::{
    add_or_overflow, cost_product, index_ingredients, margin_percent, mul_or_overflow, DateRange,
    DomainError, ProductCosting,
};

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

/// Dashboard summary over delivered orders in a date range
#[derive(Debug, Serialize, PartialEq)]
pub struct DashboardSummary {
    pub range: DateRange,
    pub delivered_orders: usize,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub gross_profit: Decimal,
    pub margin_percent: Option<Decimal>,
    pub open_orders: i64,
    pub negative_stock_ingredients: usize,
}

/// One line of the costing CSV export
#[derive(Debug, Serialize)]
pub struct CostingExportRow {
    pub product: String,
    pub selling_price: Decimal,
    pub total_cost: Decimal,
    pub profit_per_unit: Decimal,
    pub margin_percent: Option<Decimal>,
    pub unresolved_lines: usize,
}

impl From<&ProductCosting> for CostingExportRow {
    fn from(costing: &ProductCosting) -> Self {
        Self {
            product: costing.name.clone(),
            selling_price: costing.selling_price,
            total_cost: costing.total_cost.round_dp(4),
            profit_per_unit: costing.profit_per_unit.round_dp(4),
            margin_percent: costing.margin_percent.map(|m| m.round_dp(2)),
            unresolved_lines: costing.unresolved.len(),
        }
    }
}

/// Revenue at captured prices and cost at current recipe cost
pub fn summarize_delivered(
    orders: &[Order],
    products: &[Product],
    ingredients: &[Ingredient],
) -> Result<(Decimal, Decimal), DomainError> {
    let ingredient_index = index_ingredients(ingredients);
    let unit_costs = products
        .iter()
        .map(|p| cost_product(p, &ingredient_index).map(|c| (p.id, c.total_cost)))
        .collect::<Result<std::collections::HashMap<Uuid, Decimal>, DomainError>>()?;

    orders
        .iter()
        .filter(|o| o.status == OrderStatus::Delivered)
        .flat_map(|o| o.items.iter())
        .try_fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(revenue, cost), item| -> Result<(Decimal, Decimal), DomainError> {
                let unit_cost = unit_costs.get(&item.product_id).copied().unwrap_or_default();
                let line_cost = mul_or_overflow(unit_cost, item.quantity, "delivered cost")?;
                Ok((
                    add_or_overflow(revenue, item.subtotal()?, "revenue")?,
                    add_or_overflow(cost, line_cost, "delivered cost")?,
                ))
            },
        )
}

impl ReportingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get the dashboard summary for a date range
    pub async fn get_dashboard_summary(
        &self,
        business_id: Uuid,
        range: DateRange,
    ) -> AppResult<DashboardSummary> {
        let orders = OrderService::new(self.db.clone())
            .list(
                business_id,
                &OrderFilter {
                    status: Some(OrderStatus::Delivered),
                    ..OrderFilter::for_range(range)
                },
            )
            .await?;
        let products = ProductService::new(self.db.clone()).list(business_id).await?;
        let ingredients = IngredientService::new(self.db.clone()).list(business_id).await?;

        let (revenue, cost) = summarize_delivered(&orders, &products, &ingredients)?;

        let open: Vec<&str> = OrderStatus::OPEN.iter().map(|s| s.as_str()).collect();
        let open_orders: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE business_id = $1 AND status = ANY($2)",
        )
        .bind(business_id)
        .bind(&open)
        .fetch_one(&self.db)
        .await?;

        Ok(DashboardSummary {
            range,
            delivered_orders: orders.len(),
            revenue,
            cost,
            gross_profit: revenue
                .checked_sub(cost)
                .ok_or(DomainError::Overflow("gross profit"))?,
            margin_percent: margin_percent(revenue, cost),
            open_orders,
            negative_stock_ingredients: ingredients.iter().filter(|i| i.is_negative()).count(),
        })
    }

    /// Costing rows for every product, ready for export
    pub async fn costing_export(&self, business_id: Uuid) -> AppResult<Vec<CostingExportRow>> {
        let costings = ProductService::new(self.db.clone())
            .list_costings(business_id)
            .await?;
        Ok(costings.iter().map(CostingExportRow::from).collect())
    }

    /// Export report data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::{OrderItem, RecipeItem, Unit};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_summarize_delivered_uses_captured_price() {
        let flour = Ingredient {
            id: Uuid::new_v4(),
            business_id: Uuid::nil(),
            name: "Farinha".to_string(),
            unit: Unit::Kg,
            cost_per_unit: dec("5"),
            stock_quantity: dec("1"),
            min_stock: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let bread = Product {
            id: Uuid::new_v4(),
            business_id: Uuid::nil(),
            name: "Pão".to_string(),
            selling_price: dec("10"),
            category: None,
            recipe: vec![RecipeItem::new(flour.id, dec("0.5"))],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let order = |status| Order {
            id: Uuid::new_v4(),
            business_id: Uuid::nil(),
            customer_name: "Ana".to_string(),
            status,
            items: vec![OrderItem {
                product_id: bread.id,
                quantity: dec("3"),
                unit_price: dec("9"),
            }],
            delivery_date: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let orders = vec![order(OrderStatus::Delivered), order(OrderStatus::Pending)];
        let (revenue, cost) = summarize_delivered(&orders, &[bread.clone()], &[flour]).unwrap();

        assert_eq!(revenue, dec("27"));
        assert_eq!(cost, dec("7.5"));
    }

    #[test]
    fn test_summarize_delivered_reports_overflow() {
        let product_id = Uuid::new_v4();
        let line = |unit_price| OrderItem {
            product_id,
            quantity: dec("1"),
            unit_price,
        };
        let order = Order {
            id: Uuid::new_v4(),
            business_id: Uuid::nil(),
            customer_name: "Rita".to_string(),
            status: OrderStatus::Delivered,
            items: vec![line(Decimal::MAX), line(Decimal::MAX)],
            delivery_date: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(
            summarize_delivered(&[order], &[], &[]),
            Err(DomainError::Overflow("revenue"))
        );
    }

    #[test]
    fn test_export_to_csv_writes_header() {
        let rows = vec![CostingExportRow {
            product: "Brownie".to_string(),
            selling_price: dec("8"),
            total_cost: dec("1.15"),
            profit_per_unit: dec("6.85"),
            margin_percent: Some(dec("85.63")),
            unresolved_lines: 0,
        }];

        let csv = ReportingService::export_to_csv(&rows).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("product,selling_price,total_cost,profit_per_unit,margin_percent,unresolved_lines")
        );
        assert_eq!(lines.next(), Some("Brownie,8,1.15,6.85,85.63,0"));
    }
}
