//! # Shop
//!
//! Facade bundling the catalog, carts, orders and checkout over one store.
//! This is the in-process surface callers use: `get_or_create_cart`,
//! `add_line`, `remove_line`, `checkout`, `pay`, `deliver`, `cancel`.

use crate::cart::{Cart, CartLine, Carts};
use crate::catalog::Catalog;
use crate::checkout::Checkout;
use crate::error::ShopResult;
use crate::ids::{CartLineId, CustomerId, OrderId, ProductId};
use crate::memory::InMemoryStore;
use crate::order::{Order, Orders};
use crate::payment::PaymentMethod;
use crate::product::Currency;
use crate::store::SharedStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct Shop {
    catalog: Catalog,
    carts: Carts,
    orders: Orders,
    checkout: Checkout,
}

impl Shop {
    /// Wire every service to the same store
    pub fn new(store: SharedStore, currency: Currency) -> Self {
        Self {
            catalog: Catalog::new(store.clone(), currency),
            carts: Carts::new(store.clone(), currency),
            orders: Orders::new(store.clone()),
            checkout: Checkout::new(store, currency),
        }
    }

    /// Shop over a fresh `InMemoryStore`
    pub fn in_memory(currency: Currency) -> Self {
        Self::new(Arc::new(InMemoryStore::new()), currency)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn carts(&self) -> &Carts {
        &self.carts
    }

    pub fn orders(&self) -> &Orders {
        &self.orders
    }

    pub fn get_or_create_cart(&self, customer_id: CustomerId) -> ShopResult<Cart> {
        self.carts.get_or_create(customer_id)
    }

    pub fn add_line(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        quantity: u32,
    ) -> ShopResult<CartLine> {
        self.carts.add_line(customer_id, product_id, quantity)
    }

    pub fn remove_line(&self, customer_id: CustomerId, line_id: CartLineId) -> ShopResult<()> {
        self.carts.remove_line(customer_id, line_id)
    }

    pub fn checkout(&self, customer_id: CustomerId) -> ShopResult<Order> {
        self.checkout.checkout(customer_id)
    }

    pub async fn pay(&self, order_id: OrderId, method: &dyn PaymentMethod) -> ShopResult<Order> {
        self.orders.pay(order_id, method).await
    }

    pub fn deliver(&self, order_id: OrderId) -> ShopResult<Order> {
        self.orders.deliver(order_id)
    }

    pub fn cancel(&self, order_id: OrderId) -> ShopResult<Order> {
        self.orders.cancel(order_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShopError;
    use crate::order::OrderStatus;
    use crate::payment::{Card, Cash};
    use crate::product::{NewProduct, Price};

    const ALICE: CustomerId = CustomerId(1);

    /// Shop with A ($10, stock 5) and B ($5, stock 5) and a placed $25 order
    fn shop_with_order() -> (Shop, Order) {
        let shop = Shop::in_memory(Currency::USD);
        let a = shop
            .catalog()
            .add_product(NewProduct::new("A", Price::new(10.0, Currency::USD), 5))
            .unwrap();
        let b = shop
            .catalog()
            .add_product(NewProduct::new("B", Price::new(5.0, Currency::USD), 5))
            .unwrap();
        shop.add_line(ALICE, a.id, 2).unwrap();
        shop.add_line(ALICE, b.id, 1).unwrap();
        let order = shop.checkout(ALICE).unwrap();
        (shop, order)
    }

    #[tokio::test]
    async fn test_pay_then_deliver() {
        let (shop, order) = shop_with_order();

        let paid = shop.pay(order.id, &Card::new("4111111111111111")).await.unwrap();
        assert_eq!(paid.status, OrderStatus::Paid);
        assert_eq!(paid.payment_method.as_deref(), Some("Credit Card"));
        assert_eq!(paid.payment_instrument.as_deref(), Some("**** 1111"));
        assert!(paid.transaction_ref.is_some());

        let delivered = shop.deliver(order.id).unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert_eq!(
            shop.orders().get(order.id).unwrap().status,
            OrderStatus::Delivered
        );
    }

    #[tokio::test]
    async fn test_second_pay_is_already_paid() {
        let (shop, order) = shop_with_order();
        shop.pay(order.id, &Cash).await.unwrap();

        let err = shop.pay(order.id, &Card::new("4242")).await.unwrap_err();

        assert!(matches!(err, ShopError::AlreadyPaid { .. }));
        let stored = shop.orders().get(order.id).unwrap();
        assert_eq!(stored.status, OrderStatus::Paid);
        assert_eq!(stored.payment_method.as_deref(), Some("Cash"));
    }

    #[tokio::test]
    async fn test_short_card_leaves_order_pending() {
        let (shop, order) = shop_with_order();
        assert_eq!(order.total.amount, 2500);

        let err = shop.pay(order.id, &Card::new("123")).await.unwrap_err();

        assert!(matches!(err, ShopError::InvalidPaymentInstrument(_)));
        let stored = shop.orders().get(order.id).unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
        assert!(stored.payment_method.is_none());
    }

    #[test]
    fn test_deliver_before_pay_fails() {
        let (shop, order) = shop_with_order();
        let err = shop.deliver(order.id).unwrap_err();
        assert!(matches!(err, ShopError::NotPaid { .. }));
        assert_eq!(
            shop.orders().get(order.id).unwrap().status,
            OrderStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_cancel_keeps_reserved_stock() {
        let (shop, order) = shop_with_order();
        let a = order.lines[0].product_id;

        let cancelled = shop.cancel(order.id).unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some());
        assert_eq!(shop.catalog().get(a).unwrap().stock, 3);

        assert!(matches!(
            shop.pay(order.id, &Cash).await,
            Err(ShopError::AlreadyPaid { .. })
        ));
        assert!(matches!(
            shop.deliver(order.id),
            Err(ShopError::NotPaid { .. })
        ));
    }

    #[tokio::test]
    async fn test_paid_order_cannot_be_cancelled() {
        let (shop, order) = shop_with_order();
        shop.pay(order.id, &Cash).await.unwrap();

        assert!(matches!(
            shop.cancel(order.id),
            Err(ShopError::NotCancellable {
                status: OrderStatus::Paid,
                ..
            })
        ));
    }

    #[test]
    fn test_orders_are_scoped_to_their_customer() {
        let (shop, order) = shop_with_order();
        let bob = CustomerId(2);

        assert!(shop.orders().get_for_customer(ALICE, order.id).is_ok());
        assert!(matches!(
            shop.orders().get_for_customer(bob, order.id),
            Err(ShopError::OrderNotFound { .. })
        ));
        assert_eq!(shop.orders().list_for_customer(ALICE).unwrap().len(), 1);
        assert!(shop.orders().list_for_customer(bob).unwrap().is_empty());
        assert_eq!(shop.orders().list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_cart_is_reused_after_checkout() {
        let (shop, _order) = shop_with_order();
        let cart = shop.get_or_create_cart(ALICE).unwrap();
        assert!(matches!(shop.checkout(ALICE), Err(ShopError::EmptyCart)));
        assert_eq!(shop.get_or_create_cart(ALICE).unwrap().id, cart.id);
    }

    #[test]
    fn test_unknown_order() {
        let shop = Shop::in_memory(Currency::USD);
        assert!(matches!(
            shop.deliver(OrderId(404)),
            Err(ShopError::OrderNotFound { .. })
        ));
    }
}
