//! Errors raised by domain rules

use thiserror::Error;

use crate::models::{OrderStatus, PlanResource};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unknown unit of measure: {0}")]
    UnknownUnit(String),

    #[error("Unknown movement type: {0}")]
    UnknownMovementType(String),

    #[error("Unknown order status: {0}")]
    UnknownOrderStatus(String),

    #[error("Unknown plan: {0}")]
    UnknownPlan(String),

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Plan limit reached: {limit} {resource}")]
    PlanLimitReached { resource: PlanResource, limit: u32 },

    #[error("Value out of range while computing {0}")]
    Overflow(&'static str),
}
