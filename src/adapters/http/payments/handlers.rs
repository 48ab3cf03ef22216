//! HTTP handlers for checkout and gateway webhooks.

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::application::handlers::{
    CaptureOrderCommand, ProcessWebhookCommand, ProcessWebhookResult,
};
use crate::domain::payment::Gateway;

use super::super::error::{ApiError, ErrorBody};
use super::super::middleware::RequireAuth;
use super::super::state::AppState;
use super::dto::{
    CaptureOrderRequest, CaptureOrderResponse, CreateOrderRequest, CreateOrderResponse,
    WebhookAck,
};

// ════════════════════════════════════════════════════════════════════════════════
// Checkout
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/payments/paypal/create-order
pub async fn create_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let cmd = request.into_command(user.id)?;

    let result = state.create_order_handler().handle(cmd).await?;

    Ok(Json(CreateOrderResponse {
        success: true,
        order_id: result.order.order_id,
    }))
}

/// POST /api/payments/paypal/capture-order
pub async fn capture_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    payload: Result<Json<CaptureOrderRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    if request.order_id.trim().is_empty() {
        return Err(ApiError::bad_request("orderID is required"));
    }

    let cmd = CaptureOrderCommand {
        user_id: user.id,
        order_id: request.order_id,
    };
    let result = state.capture_order_handler().handle(cmd).await?;

    Ok(Json(CaptureOrderResponse::from(result)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhooks
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/payments/paypal/webhook
pub async fn paypal_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    receive_webhook(state, Gateway::Paypal, headers, body).await
}

/// POST /api/payments/aps/webhook
pub async fn aps_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    receive_webhook(state, Gateway::Aps, headers, body).await
}

/// POST /api/payments/hyperpay/webhook
pub async fn hyperpay_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    receive_webhook(state, Gateway::Hyperpay, headers, body).await
}

/// Accepted and duplicate deliveries get 200. Rejections get 400 so the
/// gateway stops; processing failures get 500 so it redelivers.
async fn receive_webhook(
    state: AppState,
    gateway: Gateway,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let cmd = ProcessWebhookCommand {
        gateway,
        body: body.to_vec(),
        headers,
    };

    match state.process_webhook_handler().handle(cmd).await {
        Ok(ProcessWebhookResult::Processed { .. }) | Ok(ProcessWebhookResult::Duplicate { .. }) => {
            (StatusCode::OK, Json(WebhookAck { success: true })).into_response()
        }
        Err(err) => {
            let status = if err.is_rejection() {
                tracing::warn!(gateway = %gateway, error = %err, "Webhook delivery rejected");
                StatusCode::BAD_REQUEST
            } else {
                tracing::error!(gateway = %gateway, error = %err, "Webhook delivery failed");
                StatusCode::INTERNAL_SERVER_ERROR
            };
            let (code, message) = err.public_message();
            (status, Json(ErrorBody::new(code, message))).into_response()
        }
    }
}
