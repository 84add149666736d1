//! Ingredient and stock ledger models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A raw ingredient tracked in stock
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub unit: Unit,
    /// Cost of one `unit` of this ingredient
    pub cost_per_unit: Decimal,
    /// Signed on-hand quantity. Negative means consumption was recorded
    /// without a matching stock-in.
    pub stock_quantity: Decimal,
    pub min_stock: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ingredient {
    /// Absolute value of a negative stock balance, zero otherwise
    pub fn deficit(&self) -> Decimal {
        if self.stock_quantity < Decimal::ZERO {
            self.stock_quantity.abs()
        } else {
            Decimal::ZERO
        }
    }

    pub fn is_negative(&self) -> bool {
        self.stock_quantity < Decimal::ZERO
    }
}

/// Units of measure for ingredients
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Kg,
    G,
    L,
    Ml,
    /// Counted items (eggs, boxes, labels)
    Un,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::G => "g",
            Unit::L => "l",
            Unit::Ml => "ml",
            Unit::Un => "un",
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Unit {
    type Err = crate::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kg" => Ok(Unit::Kg),
            "g" => Ok(Unit::G),
            "l" => Ok(Unit::L),
            "ml" => Ok(Unit::Ml),
            "un" | "unit" | "und" => Ok(Unit::Un),
            other => Err(crate::DomainError::UnknownUnit(other.to_string())),
        }
    }
}

/// An entry in the append-only stock ledger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockMovement {
    pub id: Uuid,
    pub business_id: Uuid,
    pub ingredient_id: Uuid,
    pub movement_type: MovementType,
    /// Always positive; direction comes from `movement_type`
    pub quantity: Decimal,
    pub reason: String,
    /// Order that caused or motivated this movement, if any
    pub order_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    /// Quantity with the direction applied (ins positive, outs negative)
    pub fn signed_quantity(&self) -> Decimal {
        self.movement_type.sign() * self.quantity
    }
}

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    In,
    Out,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "in",
            MovementType::Out => "out",
        }
    }

    pub fn sign(&self) -> Decimal {
        match self {
            MovementType::In => Decimal::ONE,
            MovementType::Out => Decimal::NEGATIVE_ONE,
        }
    }
}

impl std::str::FromStr for MovementType {
    type Err = crate::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(MovementType::In),
            "out" => Ok(MovementType::Out),
            other => Err(crate::DomainError::UnknownMovementType(other.to_string())),
        }
    }
}

/// A stock movement about to be written to the ledger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewStockMovement {
    pub ingredient_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub reason: String,
    pub order_id: Option<Uuid>,
}

impl NewStockMovement {
    pub fn stock_in(ingredient_id: Uuid, quantity: Decimal, reason: impl Into<String>) -> Self {
        Self {
            ingredient_id,
            movement_type: MovementType::In,
            quantity,
            reason: reason.into(),
            order_id: None,
        }
    }

    pub fn stock_out(ingredient_id: Uuid, quantity: Decimal, reason: impl Into<String>) -> Self {
        Self {
            ingredient_id,
            movement_type: MovementType::Out,
            quantity,
            reason: reason.into(),
            order_id: None,
        }
    }

    pub fn for_order(mut self, order_id: Uuid) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn signed_quantity(&self) -> Decimal {
        self.movement_type.sign() * self.quantity
    }
}

/// Sum a ledger into a stock balance (ins minus outs); `None` past `Decimal::MAX`
pub fn ledger_balance<'a, I>(movements: I) -> Option<Decimal>
where
    I: IntoIterator<Item = &'a StockMovement>,
{
    movements
        .into_iter()
        .try_fold(Decimal::ZERO, |balance, m| balance.checked_add(m.signed_quantity()))
}

/// Apply a pending ledger entry to the ingredient it targets.
/// Returns false and leaves the ingredient untouched when the ids differ or
/// the new balance would not fit in a `Decimal`.
pub fn apply_movement(ingredient: &mut Ingredient, movement: &NewStockMovement) -> bool {
    if ingredient.id != movement.ingredient_id {
        return false;
    }
    match ingredient.stock_quantity.checked_add(movement.signed_quantity()) {
        Some(balance) => {
            ingredient.stock_quantity = balance;
            true
        }
        None => false,
    }
}
