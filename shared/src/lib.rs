//! Shared types and business rules for Cozinha ao Lucro
//!
//! This crate contains the domain models and the pure costing and stock
//! rules used by the backend and, via WASM, by the dashboard.

pub mod costing;
pub mod error;
pub mod models;
pub mod reconciliation;
pub mod stock;
pub mod types;
pub mod validation;

pub use costing::*;
pub use error::DomainError;
pub use models::*;
pub use reconciliation::*;
pub use stock::*;
pub use types::*;
pub use validation::*;
