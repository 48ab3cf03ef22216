//! Router for payment endpoints.

use axum::{middleware, routing::post, Router};

use crate::adapters::rate_limiter::{RESOURCE_CAPTURE_ORDER, RESOURCE_CREATE_ORDER};

use super::super::middleware::{rate_limit_middleware, ResourceRateLimit};
use super::super::state::AppState;
use super::handlers::{aps_webhook, capture_order, create_order, hyperpay_webhook, paypal_webhook};

/// Checkout routes.
///
/// # Routes
/// - `POST /api/payments/paypal/create-order` - Open a gateway order (auth, rate limited)
/// - `POST /api/payments/paypal/capture-order` - Capture an approved order (auth, rate limited)
///
/// Each route counts against its own limit.
pub fn checkout_routes(state: &AppState) -> Router<AppState> {
    let create = Router::new()
        .route("/api/payments/paypal/create-order", post(create_order))
        .route_layer(middleware::from_fn_with_state(
            ResourceRateLimit::new(state.rate_limiter.clone(), RESOURCE_CREATE_ORDER),
            rate_limit_middleware,
        ));

    let capture = Router::new()
        .route("/api/payments/paypal/capture-order", post(capture_order))
        .route_layer(middleware::from_fn_with_state(
            ResourceRateLimit::new(state.rate_limiter.clone(), RESOURCE_CAPTURE_ORDER),
            rate_limit_middleware,
        ));

    create.merge(capture)
}

/// Gateway webhook routes.
///
/// These sit outside session auth; each delivery is verified by its
/// gateway's verifier instead.
///
/// # Routes
/// - `POST /api/payments/paypal/webhook`
/// - `POST /api/payments/aps/webhook`
/// - `POST /api/payments/hyperpay/webhook`
pub fn webhook_routes() -> Router<AppState> {
    Router::new()
        .route("/api/payments/paypal/webhook", post(paypal_webhook))
        .route("/api/payments/aps/webhook", post(aps_webhook))
        .route("/api/payments/hyperpay/webhook", post(hyperpay_webhook))
}
