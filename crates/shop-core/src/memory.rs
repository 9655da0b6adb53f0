//! # In-Memory Store
//!
//! `Store` backed by maps behind a single mutex. Every method takes the lock
//! once, so stock checks and decrements (and whole checkouts) are atomic with
//! respect to each other.

use crate::cart::{Cart, CartLine};
use crate::ids::{CartId, CartLineId, CustomerId, OrderId, OrderLineId, ProductId};
use crate::order::{Order, OrderStatus};
use crate::product::{NewProduct, Product};
use crate::store::{OrderDraft, Store, StoreError, StoreResult};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Default)]
struct Tables {
    products: BTreeMap<ProductId, Product>,
    carts: BTreeMap<CartId, Cart>,
    cart_by_customer: HashMap<CustomerId, CartId>,
    cart_lines: BTreeMap<CartLineId, CartLine>,
    orders: BTreeMap<OrderId, Order>,
    last_id: Sequences,
}

#[derive(Debug, Default)]
struct Sequences {
    product: u64,
    cart: u64,
    cart_line: u64,
    order: u64,
    order_line: u64,
}

fn next(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

/// Process-local store; the default backend for the server and for tests
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("in-memory store lock poisoned: {e}")))
    }
}

impl Store for InMemoryStore {
    fn insert_product(&self, product: NewProduct) -> StoreResult<Product> {
        let mut tables = self.tables()?;
        let id = ProductId(next(&mut tables.last_id.product));
        let product = product.into_product(id, Utc::now());
        tables.products.insert(id, product.clone());
        Ok(product)
    }

    fn product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.tables()?.products.get(&id).cloned())
    }

    fn products(&self) -> StoreResult<Vec<Product>> {
        Ok(self.tables()?.products.values().cloned().collect())
    }

    fn edit_product(
        &self,
        id: ProductId,
        edit: &mut dyn FnMut(&mut Product),
    ) -> StoreResult<Option<Product>> {
        let mut tables = self.tables()?;
        Ok(tables.products.get_mut(&id).map(|product| {
            edit(product);
            product.clone()
        }))
    }

    fn reserve_stock(&self, id: ProductId, quantity: u32) -> StoreResult<u32> {
        let mut tables = self.tables()?;
        let product = tables
            .products
            .get_mut(&id)
            .ok_or(StoreError::MissingProduct(id))?;
        if product.stock < quantity {
            return Err(StoreError::StockConflict {
                product_id: id,
                requested: quantity,
                available: product.stock,
            });
        }
        product.stock -= quantity;
        product.updated_at = Utc::now();
        Ok(product.stock)
    }

    fn cart_for_customer(&self, customer_id: CustomerId) -> StoreResult<Option<Cart>> {
        let tables = self.tables()?;
        Ok(tables
            .cart_by_customer
            .get(&customer_id)
            .and_then(|id| tables.carts.get(id))
            .cloned())
    }

    fn create_cart(&self, customer_id: CustomerId) -> StoreResult<Cart> {
        let mut tables = self.tables()?;
        if let Some(cart) = tables
            .cart_by_customer
            .get(&customer_id)
            .and_then(|id| tables.carts.get(id))
        {
            return Ok(cart.clone());
        }

        let cart = Cart {
            id: CartId(next(&mut tables.last_id.cart)),
            customer_id,
            created_at: Utc::now(),
        };
        tables.cart_by_customer.insert(customer_id, cart.id);
        tables.carts.insert(cart.id, cart.clone());
        Ok(cart)
    }

    fn cart_lines(&self, cart_id: CartId) -> StoreResult<Vec<CartLine>> {
        Ok(self
            .tables()?
            .cart_lines
            .values()
            .filter(|line| line.cart_id == cart_id)
            .cloned()
            .collect())
    }

    fn insert_cart_line(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: u32,
    ) -> StoreResult<CartLine> {
        let mut tables = self.tables()?;
        let line = CartLine {
            id: CartLineId(next(&mut tables.last_id.cart_line)),
            cart_id,
            product_id,
            quantity,
            added_at: Utc::now(),
        };
        tables.cart_lines.insert(line.id, line.clone());
        Ok(line)
    }

    fn set_cart_line_quantity(
        &self,
        cart_id: CartId,
        line_id: CartLineId,
        quantity: u32,
    ) -> StoreResult<bool> {
        let mut tables = self.tables()?;
        match tables.cart_lines.get_mut(&line_id) {
            Some(line) if line.cart_id == cart_id => {
                line.quantity = quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn delete_cart_line(&self, cart_id: CartId, line_id: CartLineId) -> StoreResult<bool> {
        let mut tables = self.tables()?;
        let owned = tables
            .cart_lines
            .get(&line_id)
            .is_some_and(|line| line.cart_id == cart_id);
        if owned {
            tables.cart_lines.remove(&line_id);
        }
        Ok(owned)
    }

    fn clear_cart(&self, cart_id: CartId) -> StoreResult<usize> {
        let mut tables = self.tables()?;
        let before = tables.cart_lines.len();
        tables.cart_lines.retain(|_, line| line.cart_id != cart_id);
        Ok(before - tables.cart_lines.len())
    }

    fn commit_checkout(&self, draft: OrderDraft) -> StoreResult<Order> {
        let mut tables = self.tables()?;

        // Validate every line before touching anything.
        let required = draft.required_stock();
        for (product_id, quantity) in &required {
            let product = tables
                .products
                .get(product_id)
                .ok_or(StoreError::MissingProduct(*product_id))?;
            if !product.active {
                return Err(StoreError::InactiveProduct(*product_id));
            }
            if product.stock < *quantity {
                return Err(StoreError::StockConflict {
                    product_id: *product_id,
                    requested: *quantity,
                    available: product.stock,
                });
            }
        }

        let now = Utc::now();
        for (product_id, quantity) in &required {
            if let Some(product) = tables.products.get_mut(product_id) {
                product.stock -= quantity;
                product.updated_at = now;
                debug!("Reserved {} of {}, {} left", quantity, product_id, product.stock);
            }
        }

        let mut lines = Vec::with_capacity(draft.lines.len());
        for line in draft.lines {
            let id = OrderLineId(next(&mut tables.last_id.order_line));
            lines.push(line.into_line(id));
        }
        let order_id = OrderId(next(&mut tables.last_id.order));
        let order = Order::pending(order_id, draft.customer_id, lines, draft.total, now);
        tables.orders.insert(order_id, order.clone());

        for line_id in &draft.consumed_lines {
            if tables
                .cart_lines
                .get(line_id)
                .is_some_and(|line| line.cart_id == draft.cart_id)
            {
                tables.cart_lines.remove(line_id);
            }
        }

        Ok(order)
    }

    fn order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.tables()?.orders.get(&id).cloned())
    }

    fn orders(&self) -> StoreResult<Vec<Order>> {
        Ok(self.tables()?.orders.values().cloned().collect())
    }

    fn orders_for_customer(&self, customer_id: CustomerId) -> StoreResult<Vec<Order>> {
        Ok(self
            .tables()?
            .orders
            .values()
            .rev()
            .filter(|order| order.customer_id == customer_id)
            .cloned()
            .collect())
    }

    fn update_order(&self, order: &Order, expected: OrderStatus) -> StoreResult<bool> {
        let mut tables = self.tables()?;
        match tables.orders.get_mut(&order.id) {
            Some(stored) if stored.status == expected => {
                *stored = order.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderLineDraft;
    use crate::product::{Currency, Price};

    fn store_with(stock: &[u32]) -> (InMemoryStore, Vec<Product>) {
        let store = InMemoryStore::new();
        let products = stock
            .iter()
            .enumerate()
            .map(|(i, s)| {
                store
                    .insert_product(NewProduct::new(
                        format!("P{i}"),
                        Price::new(10.0, Currency::USD),
                        *s,
                    ))
                    .unwrap()
            })
            .collect();
        (store, products)
    }

    fn draft_for(store: &InMemoryStore, lines: &[(&Product, u32)]) -> OrderDraft {
        let cart = store.create_cart(CustomerId(1)).unwrap();
        let mut consumed = Vec::new();
        for (product, quantity) in lines {
            consumed.push(store.insert_cart_line(cart.id, product.id, *quantity).unwrap().id);
        }
        let lines: Vec<OrderLineDraft> = lines
            .iter()
            .map(|(p, q)| OrderLineDraft::from_product(p, *q))
            .collect();
        let total = Price::from_cents(
            lines.iter().map(|l| l.subtotal().amount).sum(),
            Currency::USD,
        );
        OrderDraft {
            customer_id: CustomerId(1),
            cart_id: cart.id,
            consumed_lines: consumed,
            lines,
            total,
        }
    }

    #[test]
    fn test_reserve_stock_is_conditional() {
        let (store, products) = store_with(&[3]);
        let id = products[0].id;

        assert_eq!(store.reserve_stock(id, 2).unwrap(), 1);
        assert_eq!(
            store.reserve_stock(id, 2),
            Err(StoreError::StockConflict {
                product_id: id,
                requested: 2,
                available: 1
            })
        );
        assert_eq!(store.product(id).unwrap().unwrap().stock, 1);
        assert_eq!(
            store.reserve_stock(ProductId(42), 1),
            Err(StoreError::MissingProduct(ProductId(42)))
        );
    }

    #[test]
    fn test_create_cart_twice_returns_same_cart() {
        let store = InMemoryStore::new();
        let a = store.create_cart(CustomerId(5)).unwrap();
        let b = store.create_cart(CustomerId(5)).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(store.cart_for_customer(CustomerId(5)).unwrap(), Some(a));
        assert_eq!(store.cart_for_customer(CustomerId(6)).unwrap(), None);
    }

    #[test]
    fn test_commit_checkout_reserves_and_consumes_lines() {
        let (store, products) = store_with(&[5, 5]);
        let draft = draft_for(&store, &[(&products[0], 2), (&products[1], 1)]);
        let cart_id = draft.cart_id;

        let order = store.commit_checkout(draft).unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total.amount, 3000);
        assert_eq!(order.lines.len(), 2);
        assert_eq!(store.product(products[0].id).unwrap().unwrap().stock, 3);
        assert_eq!(store.product(products[1].id).unwrap().unwrap().stock, 4);
        assert!(store.cart_lines(cart_id).unwrap().is_empty());
        assert!(store.cart_for_customer(CustomerId(1)).unwrap().is_some());
    }

    #[test]
    fn test_commit_checkout_is_all_or_nothing() {
        let (store, products) = store_with(&[5, 1]);
        let draft = draft_for(&store, &[(&products[0], 2), (&products[1], 2)]);
        let cart_id = draft.cart_id;

        let err = store.commit_checkout(draft).unwrap_err();

        assert_eq!(
            err,
            StoreError::StockConflict {
                product_id: products[1].id,
                requested: 2,
                available: 1
            }
        );
        assert_eq!(store.product(products[0].id).unwrap().unwrap().stock, 5);
        assert_eq!(store.product(products[1].id).unwrap().unwrap().stock, 1);
        assert_eq!(store.cart_lines(cart_id).unwrap().len(), 2);
        assert!(store.orders().unwrap().is_empty());
    }

    #[test]
    fn test_commit_checkout_rejects_deactivated_product() {
        let (store, products) = store_with(&[5, 5]);
        let draft = draft_for(&store, &[(&products[0], 1), (&products[1], 1)]);
        let cart_id = draft.cart_id;
        store
            .edit_product(products[1].id, &mut |p| p.active = false)
            .unwrap();

        assert_eq!(
            store.commit_checkout(draft).unwrap_err(),
            StoreError::InactiveProduct(products[1].id)
        );
        assert_eq!(store.product(products[0].id).unwrap().unwrap().stock, 5);
        assert_eq!(store.cart_lines(cart_id).unwrap().len(), 2);
        assert!(store.orders().unwrap().is_empty());
    }

    #[test]
    fn test_commit_checkout_sums_repeated_product_lines() {
        let (store, products) = store_with(&[3]);
        let draft = draft_for(&store, &[(&products[0], 2), (&products[0], 2)]);

        assert!(matches!(
            store.commit_checkout(draft),
            Err(StoreError::StockConflict { requested: 4, available: 3, .. })
        ));
        assert_eq!(store.product(products[0].id).unwrap().unwrap().stock, 3);
    }

    #[test]
    fn test_update_order_compares_status() {
        let (store, products) = store_with(&[5]);
        let mut order = store
            .commit_checkout(draft_for(&store, &[(&products[0], 1)]))
            .unwrap();

        order.status = OrderStatus::Cancelled;
        assert!(!store.update_order(&order, OrderStatus::Paid).unwrap());
        assert!(store.update_order(&order, OrderStatus::Pending).unwrap());
        assert_eq!(
            store.order(order.id).unwrap().unwrap().status,
            OrderStatus::Cancelled
        );
    }

    #[test]
    fn test_orders_for_customer_newest_first() {
        let (store, products) = store_with(&[5]);
        let first = store
            .commit_checkout(draft_for(&store, &[(&products[0], 1)]))
            .unwrap();
        let second = store
            .commit_checkout(draft_for(&store, &[(&products[0], 1)]))
            .unwrap();

        let ids: Vec<OrderId> = store
            .orders_for_customer(CustomerId(1))
            .unwrap()
            .iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert!(store.orders_for_customer(CustomerId(2)).unwrap().is_empty());
    }
}
