//! # Carts
//!
//! One cart per customer, created lazily. Cart lines only record the product
//! and quantity: prices are read live whenever the cart is viewed, and stock
//! is only enforced at checkout.

use crate::error::{ShopError, ShopResult};
use crate::ids::{CartId, CartLineId, CustomerId, ProductId};
use crate::product::{Currency, Price};
use crate::store::SharedStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Largest quantity a single cart line may hold
pub const MAX_LINE_QUANTITY: u32 = 10_000;

fn validate_quantity(quantity: u32) -> ShopResult<()> {
    if quantity == 0 || quantity > MAX_LINE_QUANTITY {
        return Err(ShopError::InvalidQuantity(quantity));
    }
    Ok(())
}

/// A customer's cart. Survives checkout; only its lines are removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub customer_id: CustomerId,
    pub created_at: DateTime<Utc>,
}

/// A product/quantity entry in a cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
}

/// A cart line joined with live product data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub line_id: CartLineId,
    pub product_id: ProductId,
    pub quantity: u32,

    /// `None` when the product no longer exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Price>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Price>,

    /// Advisory: enough stock right now to cover this line
    pub in_stock: bool,
}

/// The cart as shown to its owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub cart: Cart,
    pub items: Vec<CartItem>,
    /// Sum of live subtotals
    pub total: Price,
    pub item_count: u32,
}

impl CartView {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Cart operations, keyed by the owning customer
#[derive(Clone)]
pub struct Carts {
    store: SharedStore,
    currency: Currency,
}

impl Carts {
    pub fn new(store: SharedStore, currency: Currency) -> Self {
        Self { store, currency }
    }

    /// Return the customer's cart, creating an empty one on first access
    pub fn get_or_create(&self, customer_id: CustomerId) -> ShopResult<Cart> {
        if let Some(cart) = self.store.cart_for_customer(customer_id)? {
            return Ok(cart);
        }
        let cart = self.store.create_cart(customer_id)?;
        info!("Cart {} ready for {}", cart.id, customer_id);
        Ok(cart)
    }

    /// Append a line. Stock is not checked here.
    #[instrument(skip(self), fields(customer_id = %customer_id, product_id = %product_id))]
    pub fn add_line(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        quantity: u32,
    ) -> ShopResult<CartLine> {
        validate_quantity(quantity)?;
        let product = self
            .store
            .product(product_id)?
            .ok_or(ShopError::ProductNotFound { product_id })?;
        if !product.active {
            return Err(ShopError::ProductUnavailable { product_id });
        }

        let cart = self.get_or_create(customer_id)?;
        let line = self.store.insert_cart_line(cart.id, product_id, quantity)?;
        debug!("Added {} x {} as {}", quantity, product.name, line.id);
        Ok(line)
    }

    /// Change the quantity of an existing line
    pub fn set_line_quantity(
        &self,
        customer_id: CustomerId,
        line_id: CartLineId,
        quantity: u32,
    ) -> ShopResult<()> {
        validate_quantity(quantity)?;
        let cart = self.get_or_create(customer_id)?;
        if !self.store.set_cart_line_quantity(cart.id, line_id, quantity)? {
            return Err(ShopError::LineNotFound { line_id });
        }
        Ok(())
    }

    /// Remove a line from the customer's own cart
    pub fn remove_line(&self, customer_id: CustomerId, line_id: CartLineId) -> ShopResult<()> {
        let cart = self.get_or_create(customer_id)?;
        if !self.store.delete_cart_line(cart.id, line_id)? {
            return Err(ShopError::LineNotFound { line_id });
        }
        debug!("Removed {} from {}", line_id, cart.id);
        Ok(())
    }

    pub fn lines(&self, customer_id: CustomerId) -> ShopResult<Vec<CartLine>> {
        let cart = self.get_or_create(customer_id)?;
        Ok(self.store.cart_lines(cart.id)?)
    }

    /// Live total: quantity × current product price over all lines
    pub fn total(&self, customer_id: CustomerId) -> ShopResult<Price> {
        Ok(self.view(customer_id)?.total)
    }

    /// Cart lines joined with live product data
    pub fn view(&self, customer_id: CustomerId) -> ShopResult<CartView> {
        let cart = self.get_or_create(customer_id)?;
        let lines = self.store.cart_lines(cart.id)?;

        let mut items = Vec::with_capacity(lines.len());
        let mut total = Price::zero(self.currency);
        for line in lines {
            let product = self.store.product(line.product_id)?;
            let subtotal = product.as_ref().map(|p| p.price.times(line.quantity));
            if let Some(subtotal) = subtotal {
                total.amount = total.amount.saturating_add(subtotal.amount);
            }
            items.push(CartItem {
                line_id: line.id,
                product_id: line.product_id,
                quantity: line.quantity,
                name: product.as_ref().map(|p| p.name.clone()),
                unit_price: product.as_ref().map(|p| p.price),
                subtotal,
                in_stock: product.as_ref().is_some_and(|p| p.stock >= line.quantity),
            });
        }

        let item_count = items
            .iter()
            .fold(0u32, |count, i| count.saturating_add(i.quantity));
        Ok(CartView {
            cart,
            items,
            total,
            item_count,
        })
    }

    /// Remove every line; the cart itself is kept for reuse
    pub fn clear(&self, customer_id: CustomerId) -> ShopResult<usize> {
        let cart = self.get_or_create(customer_id)?;
        let removed = self.store.clear_cart(cart.id)?;
        info!("Cleared {} lines from {}", removed, cart.id);
        Ok(removed)
    }
}
