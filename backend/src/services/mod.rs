//! Business logic services for Cozinha ao Lucro

pub mod auth;
pub mod import;
pub mod ingredient;
pub mod order;
pub mod product;
pub mod reporting;
pub mod stock;
pub mod subscription;

pub use auth::AuthService;
pub use import::ImportService;
pub use ingredient::IngredientService;
pub use order::OrderService;
pub use product::ProductService;
pub use reporting::ReportingService;
pub use stock::StockService;
pub use subscription::SubscriptionService;
