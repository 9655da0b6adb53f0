//! # shop-api
//!
//! HTTP API layer for corner-shop.
//!
//! This crate provides:
//! - Axum-based HTTP server over `shop_core::Shop`
//! - REST endpoints for the catalog, carts, checkout and orders
//! - Admin endpoints for catalog maintenance and delivery
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/api/v1/products` | List products |
//! | GET | `/api/v1/products/{id}` | Get product |
//! | GET | `/api/v1/cart` | View cart |
//! | POST | `/api/v1/cart/lines` | Add cart line |
//! | PATCH | `/api/v1/cart/lines/{id}` | Change line quantity |
//! | DELETE | `/api/v1/cart/lines/{id}` | Remove cart line |
//! | POST | `/api/v1/checkout` | Place order from cart |
//! | GET | `/api/v1/orders` | List own orders |
//! | GET | `/api/v1/orders/{id}` | Get own order |
//! | POST | `/api/v1/orders/{id}/pay` | Pay order |
//! | POST | `/api/v1/orders/{id}/cancel` | Cancel pending order |
//! | POST | `/api/v1/admin/products` | Add product |
//! | PUT | `/api/v1/admin/products/{id}` | Edit product |
//! | DELETE | `/api/v1/admin/products/{id}` | Deactivate product |
//! | GET | `/api/v1/admin/orders` | List all orders |
//! | GET | `/api/v1/admin/orders/{id}` | Get any order |
//! | POST | `/api/v1/admin/orders/{id}/deliver` | Mark order delivered |

pub mod handlers;
pub mod identity;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState, ConfigError};
