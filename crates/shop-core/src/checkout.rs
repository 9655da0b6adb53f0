//! # Checkout
//!
//! Turns a customer's cart into a PENDING order.
//!
//! 1. Resolve the cart; an empty cart is an error.
//! 2. Snapshot each line's product name and live unit price.
//! 3. Total the snapshot.
//! 4. Hand the draft to the store, which reserves stock for every line,
//!    inserts the order and empties the consumed cart lines in one step.
//!
//! If any line lacks stock the store commits nothing: no stock is taken,
//! the cart is unchanged and no order exists.

use crate::cart::Carts;
use crate::error::{ShopError, ShopResult};
use crate::ids::CustomerId;
use crate::order::{Order, OrderLineDraft};
use crate::product::{Currency, Price};
use crate::store::{OrderDraft, SharedStore};
use tracing::{debug, info, instrument, warn};

#[derive(Clone)]
pub struct Checkout {
    store: SharedStore,
    carts: Carts,
    currency: Currency,
}

impl Checkout {
    pub fn new(store: SharedStore, currency: Currency) -> Self {
        let carts = Carts::new(store.clone(), currency);
        Self {
            store,
            carts,
            currency,
        }
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub fn checkout(&self, customer_id: CustomerId) -> ShopResult<Order> {
        let cart = self.carts.get_or_create(customer_id)?;
        let cart_lines = self.store.cart_lines(cart.id)?;
        if cart_lines.is_empty() {
            return Err(ShopError::EmptyCart);
        }

        let mut lines = Vec::with_capacity(cart_lines.len());
        let mut total = Price::zero(self.currency);
        for cart_line in &cart_lines {
            let product_id = cart_line.product_id;
            let product = self
                .store
                .product(product_id)?
                .ok_or(ShopError::ProductNotFound { product_id })?;
            if !product.active {
                return Err(ShopError::ProductUnavailable { product_id });
            }

            let line = OrderLineDraft::from_product(&product, cart_line.quantity);
            debug!(
                "{} x {} at {}",
                line.quantity,
                line.product_name,
                line.unit_price.display()
            );
            total.amount = total.amount.saturating_add(line.subtotal().amount);
            lines.push(line);
        }

        let draft = OrderDraft {
            customer_id,
            cart_id: cart.id,
            consumed_lines: cart_lines.iter().map(|l| l.id).collect(),
            lines,
            total,
        };

        let order = self.store.commit_checkout(draft).map_err(|e| {
            warn!("Checkout aborted: {}", e);
            ShopError::from(e)
        })?;

        info!(
            "Created {} for {}: {} items, total={}",
            order.id,
            customer_id,
            order.item_count(),
            order.total.display()
        );
        Ok(order)
    }
}
