//! HTTP handlers for operator actions.

use axum::extract::{Json, Path, State};
use axum::response::IntoResponse;
use serde::Serialize;

use crate::application::handlers::{RetryWebhookEventCommand, RetryWebhookEventResult};
use crate::domain::payment::Gateway;
use crate::domain::webhook::WebhookEventStatus;

use super::super::error::ApiError;
use super::super::middleware::RequireAdmin;
use super::super::state::AppState;

/// Outcome of a manual redelivery.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryWebhookResponse {
    pub success: bool,
    pub event_id: String,
    pub event_type: String,
    pub gateway: Gateway,
    pub status: WebhookEventStatus,
    pub retry_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<RetryWebhookEventResult> for RetryWebhookResponse {
    fn from(result: RetryWebhookEventResult) -> Self {
        let event = result.event;
        Self {
            success: result.succeeded,
            event_id: event.event_id,
            event_type: event.event_type,
            gateway: event.gateway,
            status: event.status,
            retry_count: event.retry_count,
            error: event.error,
        }
    }
}

/// POST /api/admin/webhooks/:event_id/retry - Re-run a failed webhook event
pub async fn retry_webhook_event(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = RetryWebhookEventCommand {
        event_id,
        requested_by: admin.id.to_string(),
    };
    let result = state.retry_webhook_handler().handle(cmd).await?;

    Ok(Json(RetryWebhookResponse::from(result)))
}
