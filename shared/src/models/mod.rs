//! Domain models for Cozinha ao Lucro

mod ingredient;
mod order;
mod plan;
mod product;

pub use ingredient::*;
pub use order::*;
pub use plan::*;
pub use product::*;
