//! HTTP adapter for checkout and gateway webhooks.
//!
//! - `POST /api/payments/paypal/create-order`
//! - `POST /api/payments/paypal/capture-order`
//! - `POST /api/payments/{paypal,aps,hyperpay}/webhook`

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::{checkout_routes, webhook_routes};
