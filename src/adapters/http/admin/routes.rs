//! Router for operator endpoints.

use axum::{routing::post, Router};

use super::super::state::AppState;
use super::handlers::retry_webhook_event;

/// Admin routes.
///
/// # Routes
/// - `POST /api/admin/webhooks/:event_id/retry` - Redeliver a failed webhook event (admin role)
pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/api/admin/webhooks/:event_id/retry", post(retry_webhook_event))
}
