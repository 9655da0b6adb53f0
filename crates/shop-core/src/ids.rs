//! # Identifiers
//!
//! Integer identifiers for every persisted entity. Each is a distinct type so a
//! product id can never be passed where an order id is expected.

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Raw integer value
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

entity_id!(
    /// Authenticated customer, as supplied by the identity provider
    CustomerId,
    "customer"
);
entity_id!(
    /// Catalog product
    ProductId,
    "product"
);
entity_id!(
    /// A customer's cart
    CartId,
    "cart"
);
entity_id!(
    /// One line in a cart
    CartLineId,
    "line"
);
entity_id!(
    /// A placed order
    OrderId,
    "order"
);
entity_id!(
    /// One frozen line in an order
    OrderLineId,
    "order-line"
);
