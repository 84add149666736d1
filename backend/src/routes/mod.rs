//! Route definitions for Cozinha ao Lucro

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Protected routes
        .nest("/ingredients", ingredient_routes(state.clone()))
        .nest("/products", product_routes(state.clone()))
        .nest("/orders", order_routes(state.clone()))
        .nest("/stock", stock_routes(state.clone()))
        .nest("/reports", reporting_routes(state.clone()))
        .nest("/import", import_routes(state.clone()))
        .nest("/subscription", subscription_routes(state))
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
}

/// Ingredient catalog routes (protected)
fn ingredient_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_ingredients).post(handlers::create_ingredient),
        )
        .route(
            "/:ingredient_id",
            get(handlers::get_ingredient)
                .put(handlers::update_ingredient)
                .delete(handlers::delete_ingredient),
        )
        .route(
            "/:ingredient_id/movements",
            get(handlers::list_ingredient_movements),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Product and costing routes (protected)
fn product_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route("/costings", get(handlers::list_product_costings))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/:product_id/costing", get(handlers::get_product_costing))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Order workflow routes (protected)
fn order_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::create_order))
        .route("/board", get(handlers::get_order_board))
        .route(
            "/:order_id",
            get(handlers::get_order).delete(handlers::delete_order),
        )
        .route("/:order_id/status", put(handlers::update_order_status))
        .route("/:order_id/reconcile", post(handlers::reconcile_order))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Stock ledger and analysis routes (protected)
fn stock_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/movements",
            get(handlers::list_movements).post(handlers::record_movement),
        )
        .route("/analysis", get(handlers::get_stock_analysis))
        .route(
            "/reconciliations",
            get(handlers::list_pending_reconciliations),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Reporting routes (protected)
fn reporting_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::get_dashboard_summary))
        .route("/costings", get(handlers::export_costings))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// CSV import routes (protected)
fn import_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/:source", post(handlers::import_csv))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Subscription routes (protected)
fn subscription_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_subscription))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
