//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                               - Liveness check
//! GET  /health/ready                         - Readiness check (store reachable)
//!
//! # Menu (order mode)
//! GET  /order-mode/categories/all            - Categories with visible products
//! GET  /order-mode/products/all              - All visible products
//! GET  /order-mode/products/category/{slug}  - Products of one category
//! GET  /order-mode/products/search           - Search (?q=&category=&limit=)
//! GET  /order-mode/products/single/{id}      - One product
//! GET  /get/categories                       - All categories with slugs
//!
//! # Checkout
//! POST /checkout/process-order               - Place an order
//! POST /checkout/update-cart                 - Store cart snapshot in session
//! POST /checkout/validate-payment            - Payment method check
//! POST /checkout/test                        - Diagnostic
//! POST /checkout/get-next-order-id           - Peek the next order name
//! ```

pub mod checkout;
pub mod health;
pub mod order_mode;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the order-mode menu routes router.
pub fn order_mode_routes() -> Router<AppState> {
    Router::new()
        .route("/categories/all", get(order_mode::categories))
        .route("/products/all", get(order_mode::all_products))
        .route(
            "/products/category/{slug}",
            get(order_mode::products_by_category),
        )
        .route("/products/search", get(order_mode::search))
        .route("/products/single/{id}", get(order_mode::single_product))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/process-order", post(checkout::process_order))
        .route("/update-cart", post(checkout::update_cart))
        .route(
            "/validate-payment",
            post(checkout::validate_payment_details),
        )
        .route("/test", post(checkout::test))
        .route("/get-next-order-id", post(checkout::next_order_id))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health checks
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        // Menu
        .nest("/order-mode", order_mode_routes())
        .route("/get/categories", get(order_mode::category_list))
        // Checkout
        .nest("/checkout", checkout_routes())
}
