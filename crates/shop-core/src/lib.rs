//! # shop-core
//!
//! Checkout engine for the corner-shop store.
//!
//! This crate provides:
//! - `Catalog` for products, prices and atomic stock reservation
//! - `Carts` for per-customer carts priced live against the catalog
//! - `PaymentMethod` trait with `Cash` and `Card` implementations
//! - `Orders` for the PENDING → PAID → DELIVERED lifecycle (or CANCELLED)
//! - `Checkout` for turning a cart into an order, all or nothing
//! - `Store` trait for persistence, with `InMemoryStore` as the default backend
//! - `ShopError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_core::{Card, Currency, CustomerId, NewProduct, Price, Shop};
//!
//! let shop = Shop::in_memory(Currency::USD);
//! let mug = shop.catalog().add_product(NewProduct::new("Mug", Price::new(8.5, Currency::USD), 10))?;
//!
//! let customer = CustomerId(1);
//! shop.add_line(customer, mug.id, 2)?;
//! let order = shop.checkout(customer)?;
//!
//! shop.pay(order.id, &Card::new("4242424242424242")).await?;
//! shop.deliver(order.id)?;
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod ids;
pub mod memory;
pub mod order;
pub mod payment;
pub mod product;
pub mod shop;
pub mod store;

// Re-exports for convenience
pub use cart::{Cart, CartItem, CartLine, CartView, Carts};
pub use catalog::Catalog;
pub use checkout::Checkout;
pub use error::{PaymentError, PaymentResult, ShopError, ShopResult};
pub use ids::{CartId, CartLineId, CustomerId, OrderId, OrderLineId, ProductId};
pub use memory::InMemoryStore;
pub use order::{Order, OrderLine, OrderLineDraft, OrderStatus, Orders};
pub use payment::{BoxedPaymentMethod, Card, Cash, PaymentMethod, PaymentRequest, Settlement};
pub use product::{CatalogSeed, Currency, NewProduct, Price, Product, ProductUpdate};
pub use shop::Shop;
pub use store::{OrderDraft, SharedStore, Store, StoreError, StoreResult};
