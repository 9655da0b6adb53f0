//! # Product Types
//!
//! Catalog products, prices and the seed catalog loaded from
//! `config/products.toml`.

use crate::error::{ShopError, ShopResult};
use crate::ids::ProductId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Supported currencies (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    USD,
    EUR,
    GBP,
    JPY,
    MXN,
}

impl Currency {
    /// Returns the ISO 4217 currency code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::USD => "usd",
            Currency::EUR => "eur",
            Currency::GBP => "gbp",
            Currency::JPY => "jpy",
            Currency::MXN => "mxn",
        }
    }

    /// Returns the number of decimal places for this currency
    /// (JPY has 0 decimals, the others have 2)
    pub fn decimal_places(&self) -> u8 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::EUR => "€",
            Currency::GBP => "£",
            Currency::JPY => "¥",
            Currency::MXN => "MX$",
        }
    }

    /// Convert a decimal amount to the smallest currency unit (cents, etc.)
    pub fn to_smallest_unit(&self, amount: f64) -> i64 {
        let multiplier = 10_f64.powi(i32::from(self.decimal_places()));
        (amount * multiplier).round() as i64
    }

    /// Convert from smallest unit back to decimal
    pub fn from_smallest_unit(&self, amount: i64) -> f64 {
        let divisor = 10_f64.powi(i32::from(self.decimal_places()));
        amount as f64 / divisor
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::USD
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "usd" => Ok(Currency::USD),
            "eur" => Ok(Currency::EUR),
            "gbp" => Ok(Currency::GBP),
            "jpy" => Ok(Currency::JPY),
            "mxn" => Ok(Currency::MXN),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

/// Price with amount in smallest currency unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in smallest currency unit (cents for USD)
    pub amount: i64,
    /// Currency
    pub currency: Currency,
}

impl Price {
    /// Create a new price from decimal amount
    pub fn new(amount: f64, currency: Currency) -> Self {
        Self {
            amount: currency.to_smallest_unit(amount),
            currency,
        }
    }

    /// Create a price from smallest unit (cents)
    pub fn from_cents(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::from_cents(0, currency)
    }

    pub fn is_positive(&self) -> bool {
        self.amount > 0
    }

    /// Price of `quantity` units
    pub fn times(&self, quantity: u32) -> Price {
        Price {
            amount: self.amount.saturating_mul(i64::from(quantity)),
            currency: self.currency,
        }
    }

    /// Get the decimal amount
    pub fn as_decimal(&self) -> f64 {
        self.currency.from_smallest_unit(self.amount)
    }

    /// Format for display (e.g., "$10.00")
    pub fn display(&self) -> String {
        let symbol = self.currency.symbol();
        if self.currency.decimal_places() == 0 {
            format!("{}{}", symbol, self.amount)
        } else {
            format!("{}{:.2}", symbol, self.as_decimal())
        }
    }
}

/// A product in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Identifier assigned by the store
    pub id: ProductId,

    /// Display name
    pub name: String,

    /// Short description
    #[serde(default)]
    pub description: String,

    /// Stock keeping unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,

    /// Unit price (always positive)
    pub price: Price,

    /// Units on hand
    pub stock: u32,

    /// Inactive products are soft-deleted: hidden from the catalog and not
    /// purchasable, but still resolvable from old order lines
    pub active: bool,

    /// Category tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Fast advisory check; checkout re-validates under the store's lock.
    pub fn has_stock(&self) -> bool {
        self.stock > 0
    }

    /// Check if the product carries a category tag (case-insensitive)
    pub fn in_category(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

fn default_true() -> bool {
    true
}

/// Product data before the store assigns an id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub sku: Option<String>,

    pub price: Price,

    #[serde(default)]
    pub stock: u32,

    #[serde(default = "default_true")]
    pub active: bool,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: Price, stock: u32) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            sku: None,
            price,
            stock,
            active: true,
            tags: Vec::new(),
        }
    }

    /// Builder: set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Builder: set SKU
    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    /// Builder: add a category tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Reject empty names, non-positive prices and foreign currencies
    pub fn validate(&self, currency: Currency) -> ShopResult<()> {
        validate_fields(&self.name, &self.price, currency)
    }

    /// Turn the draft into a stored product
    pub fn into_product(self, id: ProductId, now: DateTime<Utc>) -> Product {
        Product {
            id,
            name: self.name.trim().to_string(),
            description: self.description,
            sku: self.sku,
            price: self.price,
            stock: self.stock,
            active: self.active,
            tags: self.tags,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial admin edit of a product; `None` fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl ProductUpdate {
    /// Builder: set price
    pub fn price(mut self, price: Price) -> Self {
        self.price = Some(price);
        self
    }

    /// Builder: set SKU
    pub fn sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    /// Builder: set stock
    pub fn stock(mut self, stock: u32) -> Self {
        self.stock = Some(stock);
        self
    }

    /// Overwrite the fields this update sets
    pub fn patch(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.trim().to_string();
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(sku) = &self.sku {
            product.sku = Some(sku.clone());
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(active) = self.active {
            product.active = active;
        }
        if let Some(tags) = &self.tags {
            product.tags = tags.clone();
        }
    }

    /// Apply to a copy of `product`, validating the result
    pub fn apply(&self, product: &Product, currency: Currency, now: DateTime<Utc>) -> ShopResult<Product> {
        let mut updated = product.clone();
        self.patch(&mut updated);
        validate_fields(&updated.name, &updated.price, currency)?;
        updated.updated_at = now;
        Ok(updated)
    }
}

fn validate_fields(name: &str, price: &Price, currency: Currency) -> ShopResult<()> {
    if name.trim().is_empty() {
        return Err(ShopError::InvalidProduct("name must not be empty".to_string()));
    }
    if !price.is_positive() {
        return Err(ShopError::InvalidProduct(format!(
            "price must be positive, got {}",
            price.display()
        )));
    }
    if price.currency != currency {
        return Err(ShopError::InvalidProduct(format!(
            "price is in {}, catalog uses {}",
            price.currency, currency
        )));
    }
    Ok(())
}

/// Seed catalog (loaded from config)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub products: Vec<NewProduct>,
}

impl CatalogSeed {
    /// Load seed from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_conversion() {
        let usd = Currency::USD;
        assert_eq!(usd.to_smallest_unit(10.99), 1099);
        assert_eq!(usd.from_smallest_unit(1099), 10.99);

        let jpy = Currency::JPY;
        assert_eq!(jpy.to_smallest_unit(1000.0), 1000);
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("MXN".parse::<Currency>(), Ok(Currency::MXN));
        assert!("btc".parse::<Currency>().is_err());
    }

    #[test]
    fn test_price_display_and_times() {
        let price = Price::new(10.0, Currency::USD);
        assert_eq!(price.times(2).display(), "$20.00");
        assert_eq!(Price::new(19.99, Currency::EUR).display(), "€19.99");
        assert_eq!(Price::from_cents(500, Currency::JPY).display(), "¥500");
        assert_eq!(
            Price::from_cents(i64::MAX, Currency::USD).times(2).amount,
            i64::MAX
        );
    }

    #[test]
    fn test_new_product_validation() {
        let ok = NewProduct::new("Mug", Price::new(8.5, Currency::USD), 3);
        assert!(ok.validate(Currency::USD).is_ok());

        let free = NewProduct::new("Sticker", Price::zero(Currency::USD), 3);
        assert!(matches!(
            free.validate(Currency::USD),
            Err(ShopError::InvalidProduct(_))
        ));

        let blank = NewProduct::new("   ", Price::new(1.0, Currency::USD), 3);
        assert!(blank.validate(Currency::USD).is_err());

        let foreign = NewProduct::new("Mug", Price::new(8.5, Currency::EUR), 3);
        assert!(foreign.validate(Currency::USD).is_err());
    }

    #[test]
    fn test_update_keeps_untouched_fields() {
        let product = NewProduct::new("Mug", Price::new(8.5, Currency::USD), 3)
            .with_tag("kitchen")
            .with_sku("MUG-1")
            .into_product(ProductId(1), Utc::now());

        let updated = ProductUpdate::default()
            .price(Price::new(9.0, Currency::USD))
            .apply(&product, Currency::USD, Utc::now())
            .unwrap();

        assert_eq!(updated.price.amount, 900);
        assert_eq!(updated.stock, 3);
        assert_eq!(updated.sku.as_deref(), Some("MUG-1"));
        assert!(updated.in_category("Kitchen"));

        let relabelled = ProductUpdate::default()
            .sku("MUG-2")
            .apply(&product, Currency::USD, Utc::now())
            .unwrap();
        assert_eq!(relabelled.sku.as_deref(), Some("MUG-2"));
        assert_eq!(relabelled.price.amount, 850);

        let rejected = ProductUpdate::default()
            .price(Price::from_cents(-1, Currency::USD))
            .apply(&product, Currency::USD, Utc::now());
        assert!(rejected.is_err());
    }

    #[test]
    fn test_has_stock() {
        let mut product = NewProduct::new("Mug", Price::new(8.5, Currency::USD), 1)
            .into_product(ProductId(1), Utc::now());
        assert!(product.has_stock());
        product.stock = 0;
        assert!(!product.has_stock());
    }

    #[test]
    fn test_seed_from_toml() {
        let seed = CatalogSeed::from_toml(
            r#"
            [[products]]
            name = "Coffee beans"
            price = { amount = 1250, currency = "usd" }
            stock = 40
            tags = ["coffee"]

            [[products]]
            name = "Grinder"
            price = { amount = 4999, currency = "usd" }
            active = false
            "#,
        )
        .unwrap();

        assert_eq!(seed.products.len(), 2);
        assert_eq!(seed.products[0].stock, 40);
        assert!(seed.products[0].active);
        assert!(!seed.products[1].active);
        assert_eq!(seed.products[1].stock, 0);
    }
}
