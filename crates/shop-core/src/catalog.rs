//! # Catalog
//!
//! Product administration and stock reservation.

use crate::error::{ShopError, ShopResult};
use crate::ids::ProductId;
use crate::product::{CatalogSeed, Currency, NewProduct, Product, ProductUpdate};
use crate::store::SharedStore;
use chrono::Utc;
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct Catalog {
    store: SharedStore,
    currency: Currency,
}

impl Catalog {
    pub fn new(store: SharedStore, currency: Currency) -> Self {
        Self { store, currency }
    }

    /// Currency every product price must be in
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Validate and insert a product; the store assigns its id
    pub fn add_product(&self, product: NewProduct) -> ShopResult<Product> {
        product.validate(self.currency)?;
        let product = self.store.insert_product(product)?;
        info!("Added {} ({}) at {}", product.id, product.name, product.price.display());
        Ok(product)
    }

    /// Insert every product of a seed catalog, returning how many were added
    pub fn load_seed(&self, seed: CatalogSeed) -> ShopResult<usize> {
        let mut added = 0;
        for product in seed.products {
            self.add_product(product)?;
            added += 1;
        }
        Ok(added)
    }

    pub fn get(&self, product_id: ProductId) -> ShopResult<Product> {
        self.store
            .product(product_id)?
            .ok_or(ShopError::ProductNotFound { product_id })
    }

    /// Products customers can buy
    pub fn list_active(&self) -> ShopResult<Vec<Product>> {
        Ok(self
            .store
            .products()?
            .into_iter()
            .filter(|p| p.active)
            .collect())
    }

    /// Every product, including deactivated ones
    pub fn list_all(&self) -> ShopResult<Vec<Product>> {
        Ok(self.store.products()?)
    }

    /// Active products tagged with `tag`
    pub fn in_category(&self, tag: &str) -> ShopResult<Vec<Product>> {
        Ok(self
            .list_active()?
            .into_iter()
            .filter(|p| p.in_category(tag))
            .collect())
    }

    /// Admin edit. Fields left `None` keep their stored value, including
    /// stock that checkouts may be reserving concurrently.
    #[instrument(skip(self, update), fields(product_id = %product_id))]
    pub fn update_product(&self, product_id: ProductId, update: ProductUpdate) -> ShopResult<Product> {
        // Validate against a snapshot first; the edit itself cannot fail.
        let current = self.get(product_id)?;
        update.apply(&current, self.currency, Utc::now())?;

        let product = self
            .store
            .edit_product(product_id, &mut |product| {
                update.patch(product);
                product.updated_at = Utc::now();
            })?
            .ok_or(ShopError::ProductNotFound { product_id })?;
        info!("Updated {}", product_id);
        Ok(product)
    }

    /// Add units to stock
    pub fn restock(&self, product_id: ProductId, quantity: u32) -> ShopResult<Product> {
        if quantity == 0 {
            return Err(ShopError::InvalidQuantity(quantity));
        }
        let product = self
            .store
            .edit_product(product_id, &mut |product| {
                product.stock = product.stock.saturating_add(quantity);
                product.updated_at = Utc::now();
            })?
            .ok_or(ShopError::ProductNotFound { product_id })?;
        info!("Restocked {} by {}, now {}", product_id, quantity, product.stock);
        Ok(product)
    }

    /// Soft delete: the product disappears from the catalog but stays
    /// resolvable for existing orders
    pub fn deactivate(&self, product_id: ProductId) -> ShopResult<Product> {
        let product = self
            .store
            .edit_product(product_id, &mut |product| {
                product.active = false;
                product.updated_at = Utc::now();
            })?
            .ok_or(ShopError::ProductNotFound { product_id })?;
        info!("Deactivated {}", product_id);
        Ok(product)
    }

    /// Atomically take `quantity` units out of stock.
    /// Fails without changing anything if fewer are on hand.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub fn reserve_stock(&self, product_id: ProductId, quantity: u32) -> ShopResult<u32> {
        if quantity == 0 {
            return Err(ShopError::InvalidQuantity(quantity));
        }
        self.store.reserve_stock(product_id, quantity).map_err(|e| {
            warn!("Stock reservation refused: {}", e);
            ShopError::from(e)
        })
    }

    /// Advisory availability check; `reserve_stock` is authoritative
    pub fn has_stock(&self, product_id: ProductId) -> ShopResult<bool> {
        Ok(self.get(product_id)?.has_stock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::product::Price;
    use std::sync::Arc;

    fn catalog() -> Catalog {
        Catalog::new(Arc::new(InMemoryStore::new()), Currency::USD)
    }

    fn usd(amount: f64) -> Price {
        Price::new(amount, Currency::USD)
    }

    #[test]
    fn test_add_product_assigns_ids() {
        let catalog = catalog();
        let a = catalog.add_product(NewProduct::new("A", usd(1.0), 1)).unwrap();
        let b = catalog.add_product(NewProduct::new("B", usd(2.0), 1)).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(catalog.get(b.id).unwrap().name, "B");
    }

    #[test]
    fn test_add_product_rejects_non_positive_price() {
        let catalog = catalog();
        let err = catalog
            .add_product(NewProduct::new("Free", usd(0.0), 1))
            .unwrap_err();
        assert!(matches!(err, ShopError::InvalidProduct(_)));
        assert!(catalog.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_stock_after_reservations() {
        let catalog = catalog();
        let id = catalog.add_product(NewProduct::new("A", usd(1.0), 10)).unwrap().id;

        let mut reserved = 0;
        for quantity in [3, 4, 5, 2, 1] {
            if catalog.reserve_stock(id, quantity).is_ok() {
                reserved += quantity;
            }
        }

        assert_eq!(reserved, 10);
        assert_eq!(catalog.get(id).unwrap().stock, 0);
    }

    #[test]
    fn test_oversized_reservation_leaves_stock() {
        let catalog = catalog();
        let id = catalog.add_product(NewProduct::new("A", usd(1.0), 2)).unwrap().id;

        let err = catalog.reserve_stock(id, 3).unwrap_err();
        assert!(matches!(
            err,
            ShopError::InsufficientStock {
                requested: 3,
                available: 2,
                ..
            }
        ));
        assert_eq!(catalog.get(id).unwrap().stock, 2);
        assert!(matches!(
            catalog.reserve_stock(id, 0),
            Err(ShopError::InvalidQuantity(0))
        ));
        assert!(matches!(
            catalog.reserve_stock(ProductId(77), 1),
            Err(ShopError::ProductNotFound { .. })
        ));
    }

    #[test]
    fn test_has_stock() {
        let catalog = catalog();
        let id = catalog.add_product(NewProduct::new("A", usd(1.0), 1)).unwrap().id;
        assert!(catalog.has_stock(id).unwrap());
        catalog.reserve_stock(id, 1).unwrap();
        assert!(!catalog.has_stock(id).unwrap());
    }

    #[test]
    fn test_update_restock_and_deactivate() {
        let catalog = catalog();
        let id = catalog
            .add_product(NewProduct::new("A", usd(1.0), 1).with_tag("tea"))
            .unwrap()
            .id;

        let updated = catalog
            .update_product(id, ProductUpdate::default().price(usd(3.0)))
            .unwrap();
        assert_eq!(updated.price.amount, 300);
        assert_eq!(updated.stock, 1);

        assert!(catalog
            .update_product(id, ProductUpdate::default().price(usd(-1.0)))
            .is_err());
        assert_eq!(catalog.get(id).unwrap().price.amount, 300);

        assert_eq!(catalog.restock(id, 4).unwrap().stock, 5);
        assert_eq!(catalog.in_category("TEA").unwrap().len(), 1);

        catalog.deactivate(id).unwrap();
        assert!(catalog.list_active().unwrap().is_empty());
        assert_eq!(catalog.list_all().unwrap().len(), 1);
        assert!(catalog.get(id).is_ok());
    }

    #[test]
    fn test_load_seed() {
        let catalog = catalog();
        let seed = CatalogSeed {
            products: vec![
                NewProduct::new("A", usd(1.0), 1),
                NewProduct::new("B", usd(2.0), 0),
            ],
        };
        assert_eq!(catalog.load_seed(seed).unwrap(), 2);
        assert_eq!(catalog.list_active().unwrap().len(), 2);
    }
}
