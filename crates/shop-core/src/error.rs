//! # Error Types
//!
//! Typed error handling for the checkout engine.
//! Every shop operation returns `Result<T, ShopError>`; payment methods report
//! their own `PaymentError`, which `pay` folds into the shop taxonomy.

use crate::ids::{CartLineId, OrderId, ProductId};
use crate::order::OrderStatus;
use crate::store::StoreError;
use thiserror::Error;

/// Failure reported by a payment method while settling an amount
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// The instrument (card number, token) is malformed
    #[error("Invalid payment instrument: {0}")]
    InvalidInstrument(String),

    /// The amount cannot be charged (zero or negative)
    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: i64 },

    /// The method refused the charge
    #[error("Payment declined: {reason}")]
    Declined { reason: String },
}

/// Result type alias for payment methods
pub type PaymentResult<T> = Result<T, PaymentError>;

/// Core error type for all shop operations
#[derive(Debug, Error)]
pub enum ShopError {
    /// Checkout attempted with no cart lines
    #[error("Cart is empty")]
    EmptyCart,

    /// Not enough stock to cover the requested quantity
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Product does not exist
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: ProductId },

    /// Product exists but has been deactivated
    #[error("Product is not available: {product_id}")]
    ProductUnavailable { product_id: ProductId },

    /// Product data rejected (price, name, currency)
    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    /// Quantities must be positive
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// Cart line is not in the customer's cart
    #[error("Cart line not found: {line_id}")]
    LineNotFound { line_id: CartLineId },

    /// Order does not exist (or belongs to another customer)
    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: OrderId },

    /// Payment instrument rejected before any charge was attempted
    #[error("Invalid payment instrument: {0}")]
    InvalidPaymentInstrument(String),

    /// `pay` called on an order that has left PENDING
    #[error("Order already paid: {order_id}")]
    AlreadyPaid { order_id: OrderId },

    /// `deliver` called on an order that is not PAID
    #[error("Order not paid: {order_id}")]
    NotPaid { order_id: OrderId },

    /// `cancel` called on an order that has left PENDING
    #[error("Order {order_id} cannot be cancelled while {status}")]
    NotCancellable {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// Payment method failed to settle the order total
    #[error("Payment failed: {0}")]
    PaymentFailed(#[source] PaymentError),

    /// Persistence layer failure
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl ShopError {
    /// Returns true if the caller may retry the same request.
    /// The core itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ShopError::StoreUnavailable(_))
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ShopError::EmptyCart => 400,
            ShopError::InsufficientStock { .. } => 409,
            ShopError::ProductNotFound { .. } => 404,
            ShopError::ProductUnavailable { .. } => 409,
            ShopError::InvalidProduct(_) => 400,
            ShopError::InvalidQuantity(_) => 400,
            ShopError::LineNotFound { .. } => 404,
            ShopError::OrderNotFound { .. } => 404,
            ShopError::InvalidPaymentInstrument(_) => 400,
            ShopError::AlreadyPaid { .. } => 409,
            ShopError::NotPaid { .. } => 409,
            ShopError::NotCancellable { .. } => 409,
            ShopError::PaymentFailed(_) => 402,
            ShopError::StoreUnavailable(_) => 503,
        }
    }
}

impl From<PaymentError> for ShopError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidInstrument(reason) => ShopError::InvalidPaymentInstrument(reason),
            other => ShopError::PaymentFailed(other),
        }
    }
}

impl From<StoreError> for ShopError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(reason) => ShopError::StoreUnavailable(reason),
            StoreError::StockConflict {
                product_id,
                requested,
                available,
            } => ShopError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            StoreError::MissingProduct(product_id) => ShopError::ProductNotFound { product_id },
            StoreError::InactiveProduct(product_id) => ShopError::ProductUnavailable { product_id },
        }
    }
}

/// Result type alias for shop operations
pub type ShopResult<T> = Result<T, ShopError>;
