//! Customer order service: creation, kanban workflow, and delivery consumption

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    assemble_orders, Order, OrderItemRow, OrderRow, OrderStatus, StockMovement,
};
use crate::services::ingredient::IngredientService;
use crate::services::product::ProductService;
use crate::services::stock::StockService;
use crate::services::subscription::SubscriptionService;
use shared::{
    add_or_overflow, index_ingredients, index_products, mul_or_overflow, plan_consumption,
    validate_transition, DateRange, DomainError, PlanResource,
};

const ORDER_COLUMNS: &str =
    "id, business_id, customer_name, status, delivery_date, notes, created_at, updated_at";

/// Order service for the order workflow
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
}

/// Input for a new order line
#[derive(Debug, Deserialize)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub quantity: Decimal,
}

/// Input for creating an order
#[derive(Debug, Deserialize)]
pub struct CreateOrderInput {
    pub customer_name: String,
    pub items: Vec<OrderItemInput>,
    pub delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Filter for listing orders
#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    pub fn for_range(range: DateRange) -> Self {
        Self {
            start_date: Some(range.start),
            end_date: Some(range.end),
            status: None,
        }
    }
}

/// Result of a status change; consumption is recorded when an order is delivered
#[derive(Debug, Serialize)]
pub struct StatusChange {
    pub order: Order,
    pub movements: Vec<StockMovement>,
}

/// One kanban column
#[derive(Debug, Serialize)]
pub struct KanbanColumn {
    pub status: OrderStatus,
    pub orders: Vec<Order>,
    pub total: Decimal,
}

impl OrderService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    fn validate_create(input: &CreateOrderInput) -> AppResult<()> {
        if input.customer_name.trim().is_empty() {
            return Err(AppError::validation(
                "customer_name",
                "Customer name is required",
                "Nome do cliente é obrigatório",
            ));
        }
        if input.items.is_empty() {
            return Err(AppError::validation(
                "items",
                "An order needs at least one item",
                "O pedido precisa de pelo menos um item",
            ));
        }
        for item in &input.items {
            AppError::check("items.quantity", shared::validate_quantity(item.quantity))?;
        }
        Ok(())
    }

    /// Create a pending order, capturing current product prices
    pub async fn create(&self, business_id: Uuid, input: CreateOrderInput) -> AppResult<Order> {
        Self::validate_create(&input)?;

        SubscriptionService::new(self.db.clone())
            .ensure_can_create(business_id, PlanResource::MonthlyOrders)
            .await?;

        let product_ids: Vec<Uuid> = input.items.iter().map(|i| i.product_id).collect();
        let prices: HashMap<Uuid, Decimal> = sqlx::query_as::<_, (Uuid, Decimal)>(
            "SELECT id, selling_price FROM products WHERE business_id = $1 AND id = ANY($2)",
        )
        .bind(business_id)
        .bind(&product_ids)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .collect();

        let mut total = Decimal::ZERO;
        for item in &input.items {
            let unit_price = *prices
                .get(&item.product_id)
                .ok_or_else(|| AppError::NotFound(format!("Product {}", item.product_id)))?;
            let subtotal = mul_or_overflow(item.quantity, unit_price, "order line subtotal")?;
            total = add_or_overflow(total, subtotal, "order total")?;
        }

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO orders (business_id, customer_name, status, delivery_date, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(business_id)
        .bind(input.customer_name.trim())
        .bind(OrderStatus::Pending.as_str())
        .bind(input.delivery_date)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let unit_price = *prices
                .get(&item.product_id)
                .ok_or_else(|| AppError::NotFound(format!("Product {}", item.product_id)))?;

            items.push(
                sqlx::query_as::<_, OrderItemRow>(
                    r#"
                    INSERT INTO order_items (order_id, product_id, quantity, unit_price)
                    VALUES ($1, $2, $3, $4)
                    RETURNING order_id, product_id, quantity, unit_price
                    "#,
                )
                .bind(row.id)
                .bind(item.product_id)
                .bind(item.quantity)
                .bind(unit_price)
                .fetch_one(&mut *tx)
                .await?,
            );
        }

        tx.commit().await?;

        let order = assemble_orders(vec![row], items)?.remove(0);
        tracing::info!(%business_id, order_id = %order.id, %total, "Order created");
        Ok(order)
    }

    /// Get a single order with its items
    pub async fn get(&self, business_id: Uuid, order_id: Uuid) -> AppResult<Order> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND business_id = $2"
        ))
        .bind(order_id)
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        let items = sqlx::query_as::<_, OrderItemRow>(
            "SELECT order_id, product_id, quantity, unit_price FROM order_items WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        Ok(assemble_orders(vec![row], items)?.remove(0))
    }

    /// List orders created within an optional date range, newest first
    pub async fn list(&self, business_id: Uuid, filter: &OrderFilter) -> AppResult<Vec<Order>> {
        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            if start > end {
                return Err(AppError::validation(
                    "start_date",
                    "Start date must not be after end date",
                    "A data inicial não pode ser posterior à data final",
                ));
            }
        }

        let status = filter.status.map(|s| s.as_str());
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE business_id = $1
              AND ($2::date IS NULL OR created_at::date >= $2)
              AND ($3::date IS NULL OR created_at::date <= $3)
              AND ($4::text IS NULL OR status = $4)
            ORDER BY created_at DESC
            "#
        ))
        .bind(business_id)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(status)
        .fetch_all(&self.db)
        .await?;

        self.attach_items(rows).await
    }

    /// Every order still in pending, preparing or ready, regardless of date
    pub async fn list_open(&self, business_id: Uuid) -> AppResult<Vec<Order>> {
        let open: Vec<&str> = OrderStatus::OPEN.iter().map(|s| s.as_str()).collect();
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE business_id = $1 AND status = ANY($2)
            ORDER BY created_at
            "#
        ))
        .bind(business_id)
        .bind(&open)
        .fetch_all(&self.db)
        .await?;

        self.attach_items(rows).await
    }

    /// Orders grouped into kanban columns
    pub async fn board(&self, business_id: Uuid, filter: &OrderFilter) -> AppResult<Vec<KanbanColumn>> {
        let orders = self.list(business_id, filter).await?;
        Ok(group_by_status(orders)?)
    }

    /// Move an order along the workflow. Delivering records its ingredient
    /// consumption as stock-out movements in the same transaction.
    pub async fn update_status(
        &self,
        business_id: Uuid,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> AppResult<StatusChange> {
        // Recipes and items are read up front so the transaction stays short
        let consumption = if new_status == OrderStatus::Delivered {
            let products = ProductService::new(self.db.clone()).list(business_id).await?;
            let ingredients = IngredientService::new(self.db.clone()).list(business_id).await?;
            let order = self.get(business_id, order_id).await?;
            let plan = plan_consumption(
                &order,
                &index_products(&products),
                &index_ingredients(&ingredients),
            )?;
            if !plan.unresolved.is_empty() {
                tracing::warn!(
                    %business_id,
                    %order_id,
                    unresolved = ?plan.unresolved,
                    "Skipping consumption of ingredients that no longer exist"
                );
            }
            plan.movements
        } else {
            Vec::new()
        };

        let mut tx = self.db.begin().await?;

        let current: String = sqlx::query_scalar(
            "SELECT status FROM orders WHERE id = $1 AND business_id = $2 FOR UPDATE",
        )
        .bind(order_id)
        .bind(business_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        let current: OrderStatus = current.parse()?;
        validate_transition(current, new_status)?;

        sqlx::query("UPDATE orders SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(new_status.as_str())
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        let mut movements = Vec::with_capacity(consumption.len());
        for movement in &consumption {
            movements.push(StockService::write_movement(&mut *tx, business_id, movement).await?);
        }

        tx.commit().await?;

        tracing::info!(
            %business_id,
            %order_id,
            from = %current,
            to = %new_status,
            consumed = movements.len(),
            "Order status changed"
        );

        Ok(StatusChange {
            order: self.get(business_id, order_id).await?,
            movements,
        })
    }

    /// Delete an order that has not consumed stock
    pub async fn delete(&self, business_id: Uuid, order_id: Uuid) -> AppResult<()> {
        let order = self.get(business_id, order_id).await?;
        if order.status == OrderStatus::Delivered {
            return Err(AppError::InvalidStateTransition(
                "Delivered orders cannot be deleted".to_string(),
            ));
        }

        sqlx::query("DELETE FROM orders WHERE id = $1 AND business_id = $2")
            .bind(order_id)
            .bind(business_id)
            .execute(&self.db)
            .await?;

        tracing::info!(%business_id, %order_id, "Order deleted");
        Ok(())
    }

    async fn attach_items(&self, rows: Vec<OrderRow>) -> AppResult<Vec<Order>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let items = sqlx::query_as::<_, OrderItemRow>(
            "SELECT order_id, product_id, quantity, unit_price FROM order_items WHERE order_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        Ok(assemble_orders(rows, items)?)
    }
}

/// Group orders into one column per status, in workflow order
pub fn group_by_status(orders: Vec<Order>) -> Result<Vec<KanbanColumn>, DomainError> {
    let mut columns: Vec<KanbanColumn> = OrderStatus::ALL
        .into_iter()
        .map(|status| KanbanColumn {
            status,
            orders: Vec::new(),
            total: Decimal::ZERO,
        })
        .collect();

    for order in orders {
        if let Some(column) = columns.iter_mut().find(|c| c.status == order.status) {
            column.total = add_or_overflow(column.total, order.total()?, "column total")?;
            column.orders.push(order);
        }
    }

    Ok(columns)
}
