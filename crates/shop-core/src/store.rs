//! # Store
//!
//! Repository abstraction over products, carts and orders.
//!
//! Services never touch storage directly; they receive a `SharedStore` and go
//! through this trait. Implementations must make `reserve_stock` and
//! `commit_checkout` atomic: the stock check and the decrement happen in one
//! step, and a checkout either reserves every line and inserts the order or
//! changes nothing.

use crate::cart::{Cart, CartLine};
use crate::ids::{CartId, CartLineId, CustomerId, OrderId, ProductId};
use crate::order::{Order, OrderLineDraft, OrderStatus};
use crate::product::{NewProduct, Price, Product};
use std::sync::Arc;
use thiserror::Error;

/// Persistence failure. Lookups signal "not found" with `Ok(None)` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Backend cannot serve the request
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Conditional stock decrement did not match
    #[error("stock conflict on {product_id}: requested {requested}, available {available}")]
    StockConflict {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// A referenced product row is gone
    #[error("missing product {0}")]
    MissingProduct(ProductId),

    /// The product was deactivated and can no longer be ordered
    #[error("inactive product {0}")]
    InactiveProduct(ProductId),
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Everything checkout hands to the store to be committed in one step
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub customer_id: CustomerId,
    pub cart_id: CartId,
    /// Cart lines the order was built from; removed from the cart on commit
    pub consumed_lines: Vec<CartLineId>,
    pub lines: Vec<OrderLineDraft>,
    pub total: Price,
}

impl OrderDraft {
    /// Quantity required per product, in order of first appearance
    pub fn required_stock(&self) -> Vec<(ProductId, u32)> {
        let mut required: Vec<(ProductId, u32)> = Vec::new();
        for line in &self.lines {
            match required.iter_mut().find(|(id, _)| *id == line.product_id) {
                Some((_, quantity)) => *quantity = quantity.saturating_add(line.quantity),
                None => required.push((line.product_id, line.quantity)),
            }
        }
        required
    }
}

/// Storage for the shop's entities
pub trait Store: Send + Sync {
    // Products

    /// Insert a product and assign its id
    fn insert_product(&self, product: NewProduct) -> StoreResult<Product>;

    fn product(&self, id: ProductId) -> StoreResult<Option<Product>>;

    fn products(&self) -> StoreResult<Vec<Product>>;

    /// Apply `edit` to the stored product while holding it exclusively.
    /// Returns the edited product, or `None` if it does not exist.
    fn edit_product(
        &self,
        id: ProductId,
        edit: &mut dyn FnMut(&mut Product),
    ) -> StoreResult<Option<Product>>;

    /// Decrement stock by `quantity` only if at least that much is on hand.
    /// Returns the remaining stock.
    fn reserve_stock(&self, id: ProductId, quantity: u32) -> StoreResult<u32>;

    // Carts

    fn cart_for_customer(&self, customer_id: CustomerId) -> StoreResult<Option<Cart>>;

    /// Return the customer's cart, inserting an empty one if there is none.
    /// Calling it twice never yields two carts.
    fn create_cart(&self, customer_id: CustomerId) -> StoreResult<Cart>;

    fn cart_lines(&self, cart_id: CartId) -> StoreResult<Vec<CartLine>>;

    fn insert_cart_line(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: u32,
    ) -> StoreResult<CartLine>;

    /// Returns false if the line is not in this cart
    fn set_cart_line_quantity(
        &self,
        cart_id: CartId,
        line_id: CartLineId,
        quantity: u32,
    ) -> StoreResult<bool>;

    /// Returns false if the line is not in this cart
    fn delete_cart_line(&self, cart_id: CartId, line_id: CartLineId) -> StoreResult<bool>;

    /// Remove every line; the cart itself stays. Returns the number removed.
    fn clear_cart(&self, cart_id: CartId) -> StoreResult<usize>;

    // Orders

    /// Reserve stock for every line, insert the order as PENDING and remove
    /// the consumed cart lines, all or nothing. Deactivated products fail
    /// the whole commit.
    fn commit_checkout(&self, draft: OrderDraft) -> StoreResult<Order>;

    fn order(&self, id: OrderId) -> StoreResult<Option<Order>>;

    fn orders(&self) -> StoreResult<Vec<Order>>;

    /// Orders placed by one customer, newest first
    fn orders_for_customer(&self, customer_id: CustomerId) -> StoreResult<Vec<Order>>;

    /// Overwrite the stored order only if its status is still `expected`.
    /// Returns false when the status moved underneath the caller.
    fn update_order(&self, order: &Order, expected: OrderStatus) -> StoreResult<bool>;
}

/// Type alias for a shared store (dynamic dispatch)
pub type SharedStore = Arc<dyn Store>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::Currency;

    fn line(product: u64, quantity: u32) -> OrderLineDraft {
        OrderLineDraft {
            product_id: ProductId(product),
            product_name: format!("p{product}"),
            quantity,
            unit_price: Price::new(1.0, Currency::USD),
        }
    }

    #[test]
    fn test_required_stock_aggregates_repeated_products() {
        let draft = OrderDraft {
            customer_id: CustomerId(1),
            cart_id: CartId(1),
            consumed_lines: vec![],
            lines: vec![line(2, 1), line(1, 3), line(2, 4)],
            total: Price::new(8.0, Currency::USD),
        };

        assert_eq!(
            draft.required_stock(),
            vec![(ProductId(2), 5), (ProductId(1), 3)]
        );
    }
}
