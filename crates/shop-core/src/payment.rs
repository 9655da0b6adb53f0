//! # Payment Methods
//!
//! Strategy trait for settling an order total.
//!
//! The order lifecycle only sees `dyn PaymentMethod`, so new kinds of payment
//! plug in without touching `Orders::pay`.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │          PaymentMethod (trait)           │
//! │  ├── settle(amount) -> Settlement        │
//! │  └── display_name()                      │
//! └──────────────────────────────────────────┘
//!                      ▲
//!          ┌───────────┴───────────┐
//!    ┌─────┴─────┐           ┌─────┴─────┐
//!    │   Cash    │           │   Card    │
//!    └───────────┘           └───────────┘
//! ```

use crate::error::{PaymentError, PaymentResult};
use crate::product::Price;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Minimum number of characters a card identifier must carry
pub const CARD_MIN_LEN: usize = 4;

/// What a successful settlement reports back to the order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Provider transaction reference, if the method issues one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_ref: Option<String>,

    /// Masked instrument for display (e.g., "**** 4242")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masked_instrument: Option<String>,
}

/// A way of paying for an order.
#[async_trait]
pub trait PaymentMethod: Send + Sync {
    /// Charge `amount`. An error leaves the order untouched.
    async fn settle(&self, amount: &Price) -> PaymentResult<Settlement>;

    /// Human-readable method name recorded on the order
    fn display_name(&self) -> &str;
}

/// Type alias for a boxed payment method (dynamic dispatch)
pub type BoxedPaymentMethod = Box<dyn PaymentMethod>;

/// Cash on delivery / at the counter. Always succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cash;

#[async_trait]
impl PaymentMethod for Cash {
    async fn settle(&self, amount: &Price) -> PaymentResult<Settlement> {
        info!("Receiving {} in cash", amount.display());
        Ok(Settlement::default())
    }

    fn display_name(&self) -> &str {
        "Cash"
    }
}

/// Credit card identified by its number. Deserialize-only so the number is
/// never echoed back out.
#[derive(Clone, Deserialize)]
pub struct Card {
    number: String,
}

impl Card {
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
        }
    }

    fn digits(&self) -> impl Iterator<Item = char> + '_ {
        self.number.chars().filter(|c| !c.is_whitespace())
    }

    /// Last four characters, masked (e.g., "**** 4242").
    /// `None` when the number is too short to be a card.
    pub fn masked(&self) -> Option<String> {
        let digits: Vec<char> = self.digits().collect();
        if digits.len() < CARD_MIN_LEN {
            return None;
        }
        let last_four: String = digits[digits.len() - CARD_MIN_LEN..].iter().collect();
        Some(format!("**** {last_four}"))
    }
}

impl std::fmt::Debug for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Card")
            .field("number", &self.masked().unwrap_or_else(|| "<invalid>".to_string()))
            .finish()
    }
}

#[async_trait]
impl PaymentMethod for Card {
    async fn settle(&self, amount: &Price) -> PaymentResult<Settlement> {
        let masked = self.masked().ok_or_else(|| {
            PaymentError::InvalidInstrument(format!(
                "card number must have at least {CARD_MIN_LEN} characters"
            ))
        })?;

        if !amount.is_positive() {
            return Err(PaymentError::InvalidAmount {
                amount: amount.amount,
            });
        }

        info!("Charging {} to card {}", amount.display(), masked);

        Ok(Settlement {
            transaction_ref: Some(format!("card_{}", Uuid::new_v4().simple())),
            masked_instrument: Some(masked),
        })
    }

    fn display_name(&self) -> &str {
        "Credit Card"
    }
}

/// Payment method as chosen by a caller, e.g. `{"method": "card", "number": "4242..."}`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentRequest {
    Cash,
    Card(Card),
}

impl PaymentRequest {
    pub fn into_method(self) -> BoxedPaymentMethod {
        match self {
            PaymentRequest::Cash => Box::new(Cash),
            PaymentRequest::Card(card) => Box::new(card),
        }
    }
}
