//! # Routes
//!
//! Axum router configuration for the shop API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, patch, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Customer (`x-customer-id` header):
///   - GET    /api/v1/products, /api/v1/products/{id}
///   - GET    /api/v1/cart
///   - POST   /api/v1/cart/lines
///   - PATCH  /api/v1/cart/lines/{id}, DELETE /api/v1/cart/lines/{id}
///   - POST   /api/v1/checkout
///   - GET    /api/v1/orders, /api/v1/orders/{id}
///   - POST   /api/v1/orders/{id}/pay, /api/v1/orders/{id}/cancel
///
/// - Admin (`x-shop-role: admin`):
///   - POST   /api/v1/admin/products
///   - PUT    /api/v1/admin/products/{id}, DELETE /api/v1/admin/products/{id}
///   - GET    /api/v1/admin/orders, /api/v1/admin/orders/{id}
///   - POST   /api/v1/admin/orders/{id}/deliver
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let customer_routes = Router::new()
        // Catalog
        .route("/products", get(handlers::list_products))
        .route("/products/{product_id}", get(handlers::get_product))
        // Cart
        .route("/cart", get(handlers::get_cart))
        .route("/cart/lines", post(handlers::add_cart_line))
        .route(
            "/cart/lines/{line_id}",
            patch(handlers::update_cart_line).delete(handlers::remove_cart_line),
        )
        // Checkout and orders
        .route("/checkout", post(handlers::checkout))
        .route("/orders", get(handlers::list_orders))
        .route("/orders/{order_id}", get(handlers::get_order))
        .route("/orders/{order_id}/pay", post(handlers::pay_order))
        .route("/orders/{order_id}/cancel", post(handlers::cancel_order));

    let admin_routes = Router::new()
        .route("/products", post(handlers::create_product))
        .route(
            "/products/{product_id}",
            put(handlers::update_product).delete(handlers::deactivate_product),
        )
        .route("/orders", get(handlers::list_all_orders))
        .route("/orders/{order_id}", get(handlers::get_any_order))
        .route("/orders/{order_id}/deliver", post(handlers::deliver_order));

    let api_routes = Router::new()
        .merge(customer_routes)
        .nest("/admin", admin_routes);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
