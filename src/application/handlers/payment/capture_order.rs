//! CaptureOrderHandler - Command handler for capturing an approved order.

use std::sync::Arc;

use thiserror::Error;

use crate::application::handlers::subscription::{
    MaterializeError, MaterializeSubscriptionCommand, MaterializeSubscriptionHandler,
};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId, ValidationError};
use crate::domain::idempotency::build_deterministic_request_id;
use crate::domain::payment::{Purchase, PurchaseStatus};
use crate::domain::subscription::Subscription;
use crate::ports::{
    CaptureOrderRequest, CaptureStatus, GatewayError, GatewayErrorCode, PaymentGateway,
    PurchaseRepository, SubscriptionRepository,
};

/// Command to capture the order the buyer approved.
#[derive(Debug, Clone)]
pub struct CaptureOrderCommand {
    pub user_id: UserId,
    pub order_id: String,
}

/// Capture state reported to the caller, spelled like the gateway's
/// capture status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    Completed,
    /// Funds not settled yet. A webhook completes the purchase later.
    Pending,
}

impl CaptureOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureOutcome::Completed => "COMPLETED",
            CaptureOutcome::Pending => "PENDING",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CaptureOrderResult {
    pub purchase: Purchase,
    pub outcome: CaptureOutcome,
    pub capture_id: Option<String>,
    pub payer_email: Option<String>,
    /// True when the order had been captured before this call.
    pub already_captured: bool,
    pub subscription: Option<Subscription>,
}

#[derive(Debug, Error)]
pub enum CaptureOrderError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Order {order_id} is {status}")]
    NotCapturable {
        order_id: String,
        status: PurchaseStatus,
    },

    /// Permanent gateway refusal. The purchase is now failed.
    #[error("Payment capture failed: {0}")]
    CaptureFailed(GatewayError),

    /// Transient gateway failure. Nothing changed; the caller may retry.
    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailable(GatewayError),

    #[error(transparent)]
    Materialize(#[from] MaterializeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Handler for order capture.
///
/// Every purchase transition is a conditional write on the expected prior
/// status, so a double submit and a webhook racing on one order settle on a
/// single winner. A capture of an already completed order returns the stored
/// result without calling the gateway.
pub struct CaptureOrderHandler {
    purchases: Arc<dyn PurchaseRepository>,
    gateway: Arc<dyn PaymentGateway>,
    materializer: MaterializeSubscriptionHandler,
}

impl CaptureOrderHandler {
    pub fn new(
        purchases: Arc<dyn PurchaseRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            purchases,
            gateway,
            materializer: MaterializeSubscriptionHandler::new(subscriptions),
        }
    }

    pub async fn handle(
        &self,
        cmd: CaptureOrderCommand,
    ) -> Result<CaptureOrderResult, CaptureOrderError> {
        // 1. Load the purchase; other users' orders do not exist for the caller
        let purchase = self.load_owned(&cmd).await?;

        // 2. Terminal states short-circuit
        match purchase.status {
            PurchaseStatus::Completed => return self.already_completed(purchase).await,
            PurchaseStatus::Failed | PurchaseStatus::Refunded => {
                return Err(CaptureOrderError::NotCapturable {
                    order_id: cmd.order_id,
                    status: purchase.status,
                })
            }
            PurchaseStatus::Pending => {}
        }

        // 3. Capture with a deterministic request id
        let request_id = build_deterministic_request_id(
            &format!("capture:{}", cmd.order_id),
            cmd.user_id.as_str(),
        )?;
        let captured = self
            .gateway
            .capture_order(CaptureOrderRequest {
                order_id: cmd.order_id.clone(),
                request_id,
            })
            .await;

        let capture = match captured {
            Ok(capture) => capture,
            Err(err) => return self.capture_failed(purchase, err).await,
        };
        let now = Timestamp::now();

        // 4. Apply the gateway's verdict
        match capture.status {
            CaptureStatus::Completed => {
                let won = self
                    .purchases
                    .complete_if_pending(
                        &purchase.id,
                        &capture.capture_id,
                        capture.payer_email.as_deref(),
                        now,
                    )
                    .await?;
                if !won {
                    tracing::debug!(order_id = %cmd.order_id, "Capture completed concurrently");
                }

                let purchase = self.reload(&purchase).await?;
                if purchase.status != PurchaseStatus::Completed {
                    return Err(CaptureOrderError::NotCapturable {
                        order_id: cmd.order_id,
                        status: purchase.status,
                    });
                }
                let materialized = self
                    .materializer
                    .handle(MaterializeSubscriptionCommand {
                        purchase: purchase.clone(),
                    })
                    .await?;

                tracing::info!(
                    order_id = %cmd.order_id,
                    capture_id = %capture.capture_id,
                    purchase_id = %purchase.id,
                    "Order captured"
                );

                Ok(CaptureOrderResult {
                    capture_id: Some(capture.capture_id),
                    payer_email: capture.payer_email,
                    outcome: CaptureOutcome::Completed,
                    already_captured: !won,
                    subscription: Some(materialized.subscription),
                    purchase,
                })
            }
            CaptureStatus::Declined => {
                let reason = "Payment capture declined by gateway";
                self.purchases
                    .fail_if_pending(&purchase.id, reason, now)
                    .await?;
                tracing::warn!(order_id = %cmd.order_id, "Capture declined");
                Err(CaptureOrderError::CaptureFailed(GatewayError::declined(reason)))
            }
            CaptureStatus::Pending | CaptureStatus::Other(_) => {
                self.purchases
                    .record_capture_if_pending(&purchase.id, &capture.capture_id, now)
                    .await?;
                tracing::info!(
                    order_id = %cmd.order_id,
                    capture_id = %capture.capture_id,
                    status = %capture.status.as_str(),
                    "Capture not yet settled"
                );
                let purchase = self.reload(&purchase).await?;
                Ok(CaptureOrderResult {
                    capture_id: Some(capture.capture_id),
                    payer_email: capture.payer_email,
                    outcome: CaptureOutcome::Pending,
                    already_captured: false,
                    subscription: None,
                    purchase,
                })
            }
        }
    }

    async fn load_owned(&self, cmd: &CaptureOrderCommand) -> Result<Purchase, CaptureOrderError> {
        match self.purchases.find_by_gateway_order_id(&cmd.order_id).await? {
            Some(p) if p.user_id == cmd.user_id => Ok(p),
            Some(p) => {
                tracing::warn!(
                    order_id = %cmd.order_id,
                    owner = %p.user_id,
                    caller = %cmd.user_id,
                    "Capture attempted on another user's order"
                );
                Err(CaptureOrderError::OrderNotFound(cmd.order_id.clone()))
            }
            None => Err(CaptureOrderError::OrderNotFound(cmd.order_id.clone())),
        }
    }

    async fn reload(&self, purchase: &Purchase) -> Result<Purchase, DomainError> {
        self.purchases
            .find_by_id(&purchase.id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::PurchaseNotFound,
                    format!("purchase {} disappeared", purchase.id),
                )
            })
    }

    /// Stored result for an order captured earlier. Re-runs materialize so a
    /// crash after completion still ends with a subscription.
    async fn already_completed(
        &self,
        purchase: Purchase,
    ) -> Result<CaptureOrderResult, CaptureOrderError> {
        let materialized = self
            .materializer
            .handle(MaterializeSubscriptionCommand {
                purchase: purchase.clone(),
            })
            .await?;
        Ok(CaptureOrderResult {
            outcome: CaptureOutcome::Completed,
            capture_id: purchase.capture_id.clone(),
            payer_email: purchase.payer_email.clone(),
            already_captured: true,
            subscription: Some(materialized.subscription),
            purchase,
        })
    }

    async fn capture_failed(
        &self,
        purchase: Purchase,
        err: GatewayError,
    ) -> Result<CaptureOrderResult, CaptureOrderError> {
        // Captured by an earlier call whose response was lost
        if err.code == GatewayErrorCode::OrderAlreadyCaptured {
            let current = self.reload(&purchase).await?;
            if current.is_completed() {
                return self.already_completed(current).await;
            }
            tracing::info!(
                order_id = %current.gateway_order_id,
                "Order captured at gateway, awaiting confirmation"
            );
            return Ok(CaptureOrderResult {
                outcome: CaptureOutcome::Pending,
                capture_id: current.capture_id.clone(),
                payer_email: current.payer_email.clone(),
                already_captured: true,
                subscription: None,
                purchase: current,
            });
        }

        if err.is_retryable() {
            tracing::error!(
                order_id = %purchase.gateway_order_id,
                error = %err,
                "Capture failed transiently"
            );
            return Err(CaptureOrderError::GatewayUnavailable(err));
        }

        tracing::warn!(
            order_id = %purchase.gateway_order_id,
            error = %err,
            provider_code = ?err.provider_code,
            "Capture refused by gateway"
        );
        self.purchases
            .fail_if_pending(&purchase.id, &err.message, Timestamp::now())
            .await?;
        Err(CaptureOrderError::CaptureFailed(err))
    }
}
