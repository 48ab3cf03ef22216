//! HTTP adapters - REST API over axum.
//!
//! Route groups:
//! - `payments` - checkout and gateway webhooks
//! - `plans` - current plan and plan-gated content
//! - `admin` - operator actions
//!
//! `app_router` assembles them. Session auth wraps every `/api` route except
//! the webhooks, which authenticate by signature.

pub mod admin;
pub mod error;
pub mod middleware;
pub mod payments;
pub mod plans;
pub mod state;

use axum::{
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ErrorBody};
pub use state::AppState;

use middleware::{auth_middleware, AuthState};

/// Full application router.
///
/// Every response carries an `x-request-id`, generated when the caller sent none.
pub fn app_router(state: AppState) -> Router {
    let auth_state: AuthState = state.session_validator.clone();

    let api = Router::new()
        .merge(payments::checkout_routes(&state))
        .merge(plans::plan_routes())
        .merge(plans::content_routes(&state))
        .merge(admin::admin_routes())
        .layer(from_fn_with_state(auth_state, auth_middleware));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .merge(payments::webhook_routes())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}
