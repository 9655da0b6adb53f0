//! # Request Handlers
//!
//! Axum request handlers. Each one resolves the caller, delegates to the
//! shop services and maps `ShopError` to a JSON error body.

use crate::identity::{Admin, Customer};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use shop_core::{
    CartLine, CartLineId, CartView, NewProduct, Order, OrderId, PaymentRequest, Product,
    ProductId, ProductUpdate, ShopError,
};
use tracing::{error, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Add a product to the cart
#[derive(Debug, Deserialize)]
pub struct AddLineRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// Change a cart line's quantity
#[derive(Debug, Deserialize)]
pub struct UpdateLineRequest {
    pub quantity: u32,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<T, ApiError>;

pub fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse::new(message, status.as_u16())))
}

fn shop_error_to_response(err: ShopError) -> ApiError {
    let code = err.status_code();
    if err.is_retryable() {
        error!("Store failure: {}", err);
    } else {
        warn!("Request rejected: {}", err);
    }
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(ErrorResponse::new(err.to_string(), code)),
    )
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "corner-shop",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// List products customers can buy
pub async fn list_products(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let products = state
        .shop
        .catalog()
        .list_active()
        .map_err(shop_error_to_response)?;
    Ok(Json(serde_json::json!({
        "count": products.len(),
        "products": products,
    })))
}

/// Get single product; deactivated products are not visible here
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> ApiResult<Json<Product>> {
    let product = state
        .shop
        .catalog()
        .get(product_id)
        .map_err(shop_error_to_response)?;
    if !product.active {
        return Err(shop_error_to_response(ShopError::ProductNotFound { product_id }));
    }
    Ok(Json(product))
}

/// The caller's cart with live prices
pub async fn get_cart(
    State(state): State<AppState>,
    Customer(customer_id): Customer,
) -> ApiResult<Json<CartView>> {
    let view = state
        .shop
        .carts()
        .view(customer_id)
        .map_err(shop_error_to_response)?;
    Ok(Json(view))
}

pub async fn add_cart_line(
    State(state): State<AppState>,
    Customer(customer_id): Customer,
    Json(request): Json<AddLineRequest>,
) -> ApiResult<(StatusCode, Json<CartLine>)> {
    let line = state
        .shop
        .add_line(customer_id, request.product_id, request.quantity)
        .map_err(shop_error_to_response)?;
    Ok((StatusCode::CREATED, Json(line)))
}

pub async fn update_cart_line(
    State(state): State<AppState>,
    Customer(customer_id): Customer,
    Path(line_id): Path<CartLineId>,
    Json(request): Json<UpdateLineRequest>,
) -> ApiResult<Json<CartView>> {
    let carts = state.shop.carts();
    carts
        .set_line_quantity(customer_id, line_id, request.quantity)
        .map_err(shop_error_to_response)?;
    let view = carts.view(customer_id).map_err(shop_error_to_response)?;
    Ok(Json(view))
}

pub async fn remove_cart_line(
    State(state): State<AppState>,
    Customer(customer_id): Customer,
    Path(line_id): Path<CartLineId>,
) -> ApiResult<StatusCode> {
    state
        .shop
        .remove_line(customer_id, line_id)
        .map_err(shop_error_to_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Turn the caller's cart into a PENDING order
#[instrument(skip_all, fields(customer_id = %customer_id))]
pub async fn checkout(
    State(state): State<AppState>,
    Customer(customer_id): Customer,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let order = state
        .shop
        .checkout(customer_id)
        .map_err(shop_error_to_response)?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// The caller's orders, newest first
pub async fn list_orders(
    State(state): State<AppState>,
    Customer(customer_id): Customer,
) -> ApiResult<impl IntoResponse> {
    let orders = state
        .shop
        .orders()
        .list_for_customer(customer_id)
        .map_err(shop_error_to_response)?;
    Ok(Json(serde_json::json!({
        "count": orders.len(),
        "orders": orders,
    })))
}

pub async fn get_order(
    State(state): State<AppState>,
    Customer(customer_id): Customer,
    Path(order_id): Path<OrderId>,
) -> ApiResult<Json<Order>> {
    let order = state
        .shop
        .orders()
        .get_for_customer(customer_id, order_id)
        .map_err(shop_error_to_response)?;
    Ok(Json(order))
}

/// Pay one of the caller's orders with the method named in the body
#[instrument(skip_all, fields(customer_id = %customer_id, order_id = %order_id))]
pub async fn pay_order(
    State(state): State<AppState>,
    Customer(customer_id): Customer,
    Path(order_id): Path<OrderId>,
    Json(request): Json<PaymentRequest>,
) -> ApiResult<Json<Order>> {
    state
        .shop
        .orders()
        .get_for_customer(customer_id, order_id)
        .map_err(shop_error_to_response)?;

    let method = request.into_method();
    let order = state
        .shop
        .pay(order_id, method.as_ref())
        .await
        .map_err(shop_error_to_response)?;
    Ok(Json(order))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    Customer(customer_id): Customer,
    Path(order_id): Path<OrderId>,
) -> ApiResult<Json<Order>> {
    state
        .shop
        .orders()
        .get_for_customer(customer_id, order_id)
        .map_err(shop_error_to_response)?;
    let order = state.shop.cancel(order_id).map_err(shop_error_to_response)?;
    Ok(Json(order))
}

// =============================================================================
// Admin Handlers
// =============================================================================

pub async fn create_product(
    State(state): State<AppState>,
    _admin: Admin,
    Json(product): Json<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = state
        .shop
        .catalog()
        .add_product(product)
        .map_err(shop_error_to_response)?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    _admin: Admin,
    Path(product_id): Path<ProductId>,
    Json(update): Json<ProductUpdate>,
) -> ApiResult<Json<Product>> {
    let product = state
        .shop
        .catalog()
        .update_product(product_id, update)
        .map_err(shop_error_to_response)?;
    Ok(Json(product))
}

/// Soft delete
pub async fn deactivate_product(
    State(state): State<AppState>,
    _admin: Admin,
    Path(product_id): Path<ProductId>,
) -> ApiResult<Json<Product>> {
    let product = state
        .shop
        .catalog()
        .deactivate(product_id)
        .map_err(shop_error_to_response)?;
    Ok(Json(product))
}

pub async fn list_all_orders(
    State(state): State<AppState>,
    _admin: Admin,
) -> ApiResult<impl IntoResponse> {
    let orders = state
        .shop
        .orders()
        .list_all()
        .map_err(shop_error_to_response)?;
    Ok(Json(serde_json::json!({
        "count": orders.len(),
        "orders": orders,
    })))
}

/// Any customer's order
pub async fn get_any_order(
    State(state): State<AppState>,
    _admin: Admin,
    Path(order_id): Path<OrderId>,
) -> ApiResult<Json<Order>> {
    let order = state
        .shop
        .orders()
        .get(order_id)
        .map_err(shop_error_to_response)?;
    Ok(Json(order))
}

pub async fn deliver_order(
    State(state): State<AppState>,
    _admin: Admin,
    Path(order_id): Path<OrderId>,
) -> ApiResult<Json<Order>> {
    let order = state.shop.deliver(order_id).map_err(shop_error_to_response)?;
    Ok(Json(order))
}
