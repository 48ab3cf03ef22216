//! Mock PayPal adapters for testing.
//!
//! `MockPaymentGateway` behaves like the Orders API as far as this service
//! can observe it:
//! - repeated `create_order` calls with one request id return one order
//! - a second capture of the same order fails with `ORDER_ALREADY_CAPTURED`
//! - errors can be injected for the next call
//!
//! `MockWebhookVerifier` checks the PayPal transmission headers locally.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use http::HeaderMap;

use crate::ports::{
    CaptureOrderRequest, CaptureResult, CaptureStatus, CreateOrderRequest, GatewayError,
    GatewayErrorCode, GatewayOrder, PaymentGateway, VerificationOutcome, WebhookVerifier,
};

use super::webhook_verifier::{PayPalTransmission, MISSING_HEADERS};

/// What the next capture reports.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MockCaptureOutcome {
    #[default]
    Completed,
    Pending,
}

/// Recorded gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    CreateOrder { request_id: String, amount_minor: i64 },
    CaptureOrder { order_id: String, request_id: String },
}

#[derive(Default)]
struct MockState {
    sequence: u32,
    orders_by_request: HashMap<String, GatewayOrder>,
    captures: HashMap<String, CaptureResult>,
    capture_outcome: MockCaptureOutcome,
    next_create_error: Option<GatewayError>,
    next_capture_error: Option<GatewayError>,
    calls: Vec<GatewayCall>,
}

/// In-process `PaymentGateway`.
#[derive(Clone, Default)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_capture_outcome(self, outcome: MockCaptureOutcome) -> Self {
        self.state().capture_outcome = outcome;
        self
    }

    pub fn set_capture_outcome(&self, outcome: MockCaptureOutcome) {
        self.state().capture_outcome = outcome;
    }

    /// The next `create_order` call fails with `error`.
    pub fn fail_next_create(&self, error: GatewayError) {
        self.state().next_create_error = Some(error);
    }

    /// The next `capture_order` call fails with `error`.
    pub fn fail_next_capture(&self, error: GatewayError) {
        self.state().next_capture_error = Some(error);
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state().calls.clone()
    }

    pub fn capture_calls(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, GatewayCall::CaptureOrder { .. }))
            .count()
    }

    pub fn create_calls(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, GatewayCall::CreateOrder { .. }))
            .count()
    }

    /// Distinct orders opened so far.
    pub fn order_count(&self) -> usize {
        self.state().orders_by_request.len()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_order(&self, request: CreateOrderRequest) -> Result<GatewayOrder, GatewayError> {
        let mut state = self.state();
        state.calls.push(GatewayCall::CreateOrder {
            request_id: request.request_id.clone(),
            amount_minor: request.amount.minor_units(),
        });

        if let Some(error) = state.next_create_error.take() {
            return Err(error);
        }

        if let Some(existing) = state.orders_by_request.get(&request.request_id) {
            return Ok(existing.clone());
        }

        state.sequence += 1;
        let order_id = format!("MOCK-ORDER-{:04}", state.sequence);
        let order = GatewayOrder {
            approve_url: Some(format!(
                "https://www.sandbox.paypal.com/checkoutnow?token={}",
                order_id
            )),
            order_id,
            status: "CREATED".to_string(),
        };
        state
            .orders_by_request
            .insert(request.request_id, order.clone());
        Ok(order)
    }

    async fn capture_order(
        &self,
        request: CaptureOrderRequest,
    ) -> Result<CaptureResult, GatewayError> {
        let mut state = self.state();
        state.calls.push(GatewayCall::CaptureOrder {
            order_id: request.order_id.clone(),
            request_id: request.request_id.clone(),
        });

        if let Some(error) = state.next_capture_error.take() {
            return Err(error);
        }

        let known = state
            .orders_by_request
            .values()
            .any(|o| o.order_id == request.order_id);
        if !known {
            return Err(GatewayError::new(
                GatewayErrorCode::NotFound,
                format!("order {} not found", request.order_id),
            ));
        }

        if state.captures.contains_key(&request.order_id) {
            return Err(GatewayError::already_captured());
        }

        state.sequence += 1;
        let status = match state.capture_outcome {
            MockCaptureOutcome::Completed => CaptureStatus::Completed,
            MockCaptureOutcome::Pending => CaptureStatus::Pending,
        };
        let result = CaptureResult {
            order_id: request.order_id.clone(),
            capture_id: format!("MOCK-CAPTURE-{:04}", state.sequence),
            status,
            payer_email: Some("buyer@example.com".to_string()),
        };
        state.captures.insert(request.order_id, result.clone());
        Ok(result)
    }
}

#[derive(Debug, Clone)]
enum VerifyMode {
    AcceptAll,
    RejectAll(String),
    ExpectSignature(String),
}

/// In-process `WebhookVerifier` for PayPal-style deliveries.
#[derive(Debug, Clone)]
pub struct MockWebhookVerifier {
    mode: VerifyMode,
}

impl MockWebhookVerifier {
    pub fn accept_all() -> Self {
        Self {
            mode: VerifyMode::AcceptAll,
        }
    }

    pub fn reject_all(reason: impl Into<String>) -> Self {
        Self {
            mode: VerifyMode::RejectAll(reason.into()),
        }
    }

    /// Requires the full PayPal header set and this transmission signature.
    pub fn expecting_signature(signature: impl Into<String>) -> Self {
        Self {
            mode: VerifyMode::ExpectSignature(signature.into()),
        }
    }
}

#[async_trait]
impl WebhookVerifier for MockWebhookVerifier {
    async fn verify(
        &self,
        _event: &serde_json::Value,
        _raw_body: &[u8],
        headers: &HeaderMap,
    ) -> VerificationOutcome {
        match &self.mode {
            VerifyMode::AcceptAll => VerificationOutcome::valid(),
            VerifyMode::RejectAll(reason) => VerificationOutcome::invalid(reason.clone()),
            VerifyMode::ExpectSignature(expected) => {
                match PayPalTransmission::from_headers(headers) {
                    None => VerificationOutcome::invalid(MISSING_HEADERS),
                    Some(t) if &t.transmission_sig == expected => VerificationOutcome::valid(),
                    Some(_) => VerificationOutcome::invalid(
                        "Webhook verification failed: signature mismatch",
                    ),
                }
            }
        }
    }
}
