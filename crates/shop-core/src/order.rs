//! # Orders
//!
//! Order records and their lifecycle:
//!
//! ```text
//! PENDING ──pay──▶ PAID ──deliver──▶ DELIVERED
//!    │
//!    └──cancel──▶ CANCELLED
//! ```
//!
//! Order lines freeze the unit price at checkout. The total is computed once,
//! when the order is created, and never again.

use crate::error::{ShopError, ShopResult};
use crate::ids::{CustomerId, OrderId, OrderLineId, ProductId};
use crate::payment::{PaymentMethod, Settlement};
use crate::product::{Price, Product};
use crate::store::SharedStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

/// Lifecycle state of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Created at checkout, awaiting payment
    Pending,
    /// Settled by a payment method
    Paid,
    /// Handed to the customer
    Delivered,
    /// Abandoned before payment
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// No transition leaves a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An order line before the store assigns it an id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineDraft {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Price,
}

impl OrderLineDraft {
    /// Snapshot the product's current name and price
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity,
            unit_price: product.price,
        }
    }

    pub fn subtotal(&self) -> Price {
        self.unit_price.times(self.quantity)
    }

    pub fn into_line(self, id: OrderLineId) -> OrderLine {
        OrderLine {
            id,
            product_id: self.product_id,
            product_name: self.product_name,
            quantity: self.quantity,
            unit_price: self.unit_price,
        }
    }
}

/// A line in a placed order. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub product_id: ProductId,

    /// Product name at purchase time (denormalized for display)
    pub product_name: String,

    pub quantity: u32,

    /// Unit price at purchase time, decoupled from the live product price
    pub unit_price: Price,
}

impl OrderLine {
    pub fn subtotal(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// A placed order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub lines: Vec<OrderLine>,

    /// Sum of line subtotals at creation time
    pub total: Price,

    pub status: OrderStatus,

    /// Display name of the method that settled the order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_instrument: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_ref: Option<String>,

    pub created_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Build a PENDING order from committed lines
    pub fn pending(
        id: OrderId,
        customer_id: CustomerId,
        lines: Vec<OrderLine>,
        total: Price,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            customer_id,
            lines,
            total,
            status: OrderStatus::Pending,
            payment_method: None,
            payment_instrument: None,
            transaction_ref: None,
            created_at: now,
            paid_at: None,
            delivered_at: None,
            cancelled_at: None,
        }
    }

    /// Get item count
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |count, l| count.saturating_add(l.quantity))
    }

    /// Fail with `AlreadyPaid` unless the order is PENDING
    pub fn ensure_payable(&self) -> ShopResult<()> {
        if self.status != OrderStatus::Pending {
            return Err(ShopError::AlreadyPaid { order_id: self.id });
        }
        Ok(())
    }

    /// PENDING → PAID, recording how it was paid
    pub fn mark_paid(
        &mut self,
        method_name: &str,
        settlement: Settlement,
        now: DateTime<Utc>,
    ) -> ShopResult<()> {
        self.ensure_payable()?;
        self.status = OrderStatus::Paid;
        self.payment_method = Some(method_name.to_string());
        self.payment_instrument = settlement.masked_instrument;
        self.transaction_ref = settlement.transaction_ref;
        self.paid_at = Some(now);
        Ok(())
    }

    /// PAID → DELIVERED
    pub fn deliver(&mut self, now: DateTime<Utc>) -> ShopResult<()> {
        if self.status != OrderStatus::Paid {
            return Err(ShopError::NotPaid { order_id: self.id });
        }
        self.status = OrderStatus::Delivered;
        self.delivered_at = Some(now);
        Ok(())
    }

    /// PENDING → CANCELLED. Reserved stock is not returned.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> ShopResult<()> {
        if self.status != OrderStatus::Pending {
            return Err(ShopError::NotCancellable {
                order_id: self.id,
                status: self.status,
            });
        }
        self.status = OrderStatus::Cancelled;
        self.cancelled_at = Some(now);
        Ok(())
    }
}

/// Order queries and lifecycle transitions
#[derive(Clone)]
pub struct Orders {
    store: SharedStore,
}

impl Orders {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn get(&self, order_id: OrderId) -> ShopResult<Order> {
        self.store
            .order(order_id)?
            .ok_or(ShopError::OrderNotFound { order_id })
    }

    /// Like `get`, but someone else's order is reported as not found
    pub fn get_for_customer(&self, customer_id: CustomerId, order_id: OrderId) -> ShopResult<Order> {
        let order = self.get(order_id)?;
        if order.customer_id != customer_id {
            return Err(ShopError::OrderNotFound { order_id });
        }
        Ok(order)
    }

    /// A customer's orders, newest first
    pub fn list_for_customer(&self, customer_id: CustomerId) -> ShopResult<Vec<Order>> {
        Ok(self.store.orders_for_customer(customer_id)?)
    }

    pub fn list_all(&self) -> ShopResult<Vec<Order>> {
        Ok(self.store.orders()?)
    }

    /// Settle the order total with `method` and move the order to PAID.
    ///
    /// A failed settlement leaves the order PENDING.
    #[instrument(skip(self, method), fields(order_id = %order_id, method = method.display_name()))]
    pub async fn pay(&self, order_id: OrderId, method: &dyn PaymentMethod) -> ShopResult<Order> {
        let mut order = self.get(order_id)?;
        if let Err(err) = order.ensure_payable() {
            warn!("Refusing to pay order in status {}", order.status);
            return Err(err);
        }

        let settlement = method.settle(&order.total).await.map_err(|e| {
            warn!("Settlement of {} failed: {}", order.total.display(), e);
            ShopError::from(e)
        })?;

        order.mark_paid(method.display_name(), settlement, Utc::now())?;

        if !self.store.update_order(&order, OrderStatus::Pending)? {
            // Settled, but a concurrent request moved the order first.
            error!(
                transaction_ref = ?order.transaction_ref,
                "Order left PENDING during settlement; payment needs manual review"
            );
            return Err(ShopError::AlreadyPaid { order_id });
        }

        info!("Order {} paid: {} via {}", order.id, order.total.display(), method.display_name());
        Ok(order)
    }

    /// Move a PAID order to DELIVERED
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub fn deliver(&self, order_id: OrderId) -> ShopResult<Order> {
        let order = self.transition(order_id, Order::deliver)?;
        info!("Order {} delivered", order.id);
        Ok(order)
    }

    /// Cancel a PENDING order
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub fn cancel(&self, order_id: OrderId) -> ShopResult<Order> {
        let order = self.transition(order_id, Order::cancel)?;
        info!("Order {} cancelled", order.id);
        Ok(order)
    }

    /// Apply a transition and store it, re-reading if the status moved
    /// between the read and the write.
    fn transition(
        &self,
        order_id: OrderId,
        apply: fn(&mut Order, DateTime<Utc>) -> ShopResult<()>,
    ) -> ShopResult<Order> {
        loop {
            let mut order = self.get(order_id)?;
            let expected = order.status;
            if let Err(err) = apply(&mut order, Utc::now()) {
                warn!("Transition rejected: {}", err);
                return Err(err);
            }
            if self.store.update_order(&order, expected)? {
                return Ok(order);
            }
        }
    }
}
