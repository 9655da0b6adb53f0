//! # Caller Identity
//!
//! Authentication happens upstream. The identity provider forwards the
//! authenticated customer in `x-customer-id` and the staff role in
//! `x-shop-role`; both are trusted as-is.

use crate::handlers::{error_response, ApiError};
use axum::{extract::FromRequestParts, http::request::Parts, http::StatusCode};
use shop_core::CustomerId;

pub const CUSTOMER_HEADER: &str = "x-customer-id";
pub const ROLE_HEADER: &str = "x-shop-role";

/// The authenticated customer making the request
#[derive(Debug, Clone, Copy)]
pub struct Customer(pub CustomerId);

impl<S> FromRequestParts<S> for Customer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(CUSTOMER_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                error_response(
                    StatusCode::UNAUTHORIZED,
                    format!("Missing {} header", CUSTOMER_HEADER),
                )
            })?;

        let id: u64 = raw.trim().parse().map_err(|_| {
            error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid {} header: {}", CUSTOMER_HEADER, raw),
            )
        })?;

        Ok(Customer(CustomerId(id)))
    }
}

/// Staff member allowed to administer the catalog and deliver orders
#[derive(Debug, Clone, Copy)]
pub struct Admin;

impl<S> FromRequestParts<S> for Admin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let role = parts.headers.get(ROLE_HEADER).and_then(|v| v.to_str().ok());
        match role {
            Some(role) if role.eq_ignore_ascii_case("admin") => Ok(Admin),
            _ => Err(error_response(StatusCode::FORBIDDEN, "Admin role required")),
        }
    }
}
