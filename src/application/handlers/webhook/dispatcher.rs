//! Business effects of a verified, first-seen webhook delivery.

use std::sync::Arc;

use crate::application::handlers::subscription::{
    MaterializeSubscriptionCommand, MaterializeSubscriptionHandler,
};
use crate::domain::foundation::Timestamp;
use crate::domain::payment::{Gateway, Purchase, PurchaseStatus};
use crate::domain::subscription::{CancelReason, SubscriptionStatus};
use crate::domain::webhook::{InboundWebhook, PayPalEventType, PayPalWebhookEvent, WebhookError};
use crate::ports::{PurchaseRepository, SubscriptionRepository};

pub(super) const CAPTURE_DENIED_REASON: &str = "Payment capture denied by PayPal";

/// What a dispatched event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookAction {
    PurchaseCompleted { order_id: String },
    PurchaseFailed { order_id: String },
    PurchaseRefunded { order_id: String },
    /// Recognized event that needed no change.
    NoChange,
    /// Event type this service does not act on.
    Unhandled,
}

/// Applies gateway events to purchases and subscriptions.
///
/// Every write is conditional on the prior status, so re-dispatching an
/// event (operator retry) converges instead of double-applying.
pub struct WebhookDispatcher {
    purchases: Arc<dyn PurchaseRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    materializer: MaterializeSubscriptionHandler,
}

impl WebhookDispatcher {
    pub fn new(
        purchases: Arc<dyn PurchaseRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
    ) -> Self {
        Self {
            purchases,
            materializer: MaterializeSubscriptionHandler::new(subscriptions.clone()),
            subscriptions,
        }
    }

    pub async fn dispatch(&self, inbound: &InboundWebhook) -> Result<WebhookAction, WebhookError> {
        match inbound.gateway {
            Gateway::Paypal => {
                let event = PayPalWebhookEvent::from_value(&inbound.payload)?;
                match event.parsed_type() {
                    PayPalEventType::CaptureCompleted => self.capture_completed(&event).await,
                    PayPalEventType::CaptureDenied => self.capture_denied(&event).await,
                    PayPalEventType::CaptureRefunded => self.capture_refunded(&event).await,
                    PayPalEventType::Unknown => {
                        tracing::info!(
                            event_id = %event.id,
                            event_type = %event.event_type,
                            "Unhandled PayPal webhook event"
                        );
                        Ok(WebhookAction::Unhandled)
                    }
                }
            }
            Gateway::Aps | Gateway::Hyperpay => {
                tracing::info!(
                    gateway = %inbound.gateway,
                    event_id = %inbound.event_id,
                    event_type = %inbound.event_type,
                    "Unhandled webhook event recorded"
                );
                Ok(WebhookAction::Unhandled)
            }
        }
    }

    /// Purchase for a capture: by capture id, then by the related order id.
    async fn capture_purchase(
        &self,
        capture_id: &str,
        order_id: Option<&str>,
    ) -> Result<Purchase, WebhookError> {
        if let Some(purchase) = self.purchases.find_by_capture_id(capture_id).await? {
            return Ok(purchase);
        }
        if let Some(order_id) = order_id {
            if let Some(purchase) = self.purchases.find_by_gateway_order_id(order_id).await? {
                return Ok(purchase);
            }
        }
        Err(WebhookError::PurchaseNotFound(capture_id.to_string()))
    }

    async fn reload(&self, purchase: &Purchase) -> Result<Purchase, WebhookError> {
        self.purchases
            .find_by_id(&purchase.id)
            .await?
            .ok_or_else(|| WebhookError::PurchaseNotFound(purchase.gateway_order_id.clone()))
    }

    async fn capture_completed(
        &self,
        event: &PayPalWebhookEvent,
    ) -> Result<WebhookAction, WebhookError> {
        let capture_id = event
            .resource_id()
            .ok_or(WebhookError::MissingField("resource.id"))?;
        let purchase = self
            .capture_purchase(capture_id, event.related_order_id())
            .await?;

        match purchase.status {
            PurchaseStatus::Pending => {
                self.purchases
                    .complete_if_pending(&purchase.id, capture_id, None, Timestamp::now())
                    .await?;
            }
            PurchaseStatus::Completed => {}
            PurchaseStatus::Failed | PurchaseStatus::Refunded => {
                tracing::warn!(
                    order_id = %purchase.gateway_order_id,
                    status = %purchase.status,
                    "Capture completed for a purchase that can no longer complete"
                );
                return Ok(WebhookAction::NoChange);
            }
        }

        let purchase = self.reload(&purchase).await?;
        if !purchase.is_completed() {
            return Err(WebhookError::InvalidTransition(format!(
                "purchase {} is {} after completion",
                purchase.id, purchase.status
            )));
        }

        self.materializer
            .handle(MaterializeSubscriptionCommand {
                purchase: purchase.clone(),
            })
            .await
            .map_err(|e| WebhookError::Processing(e.to_string()))?;

        tracing::info!(
            order_id = %purchase.gateway_order_id,
            capture_id = %capture_id,
            "Capture completed via webhook"
        );
        Ok(WebhookAction::PurchaseCompleted {
            order_id: purchase.gateway_order_id,
        })
    }

    async fn capture_denied(
        &self,
        event: &PayPalWebhookEvent,
    ) -> Result<WebhookAction, WebhookError> {
        let capture_id = event
            .resource_id()
            .ok_or(WebhookError::MissingField("resource.id"))?;
        let purchase = self
            .capture_purchase(capture_id, event.related_order_id())
            .await?;

        let failed = self
            .purchases
            .fail_if_pending(&purchase.id, CAPTURE_DENIED_REASON, Timestamp::now())
            .await?;
        if !failed {
            tracing::warn!(
                order_id = %purchase.gateway_order_id,
                status = %purchase.status,
                "Capture denied for a purchase that is not pending"
            );
            return Ok(WebhookAction::NoChange);
        }

        tracing::info!(order_id = %purchase.gateway_order_id, "Capture denied via webhook");
        Ok(WebhookAction::PurchaseFailed {
            order_id: purchase.gateway_order_id,
        })
    }

    async fn capture_refunded(
        &self,
        event: &PayPalWebhookEvent,
    ) -> Result<WebhookAction, WebhookError> {
        let capture_id = event
            .refunded_capture_id()
            .ok_or(WebhookError::MissingField("resource.links[rel=up]"))?;
        let purchase = self
            .purchases
            .find_by_capture_id(capture_id)
            .await?
            .ok_or_else(|| WebhookError::PurchaseNotFound(capture_id.to_string()))?;
        let now = Timestamp::now();

        // 1. completed -> refunded
        if !self.purchases.refund_if_completed(&purchase.id, now).await? {
            let current = self.reload(&purchase).await?;
            if current.status != PurchaseStatus::Refunded {
                return Err(WebhookError::InvalidTransition(format!(
                    "cannot refund purchase {} in status {}",
                    current.id, current.status
                )));
            }
        }

        // 2. Cancel the grant and recompute entitlements
        if let Some(mut subscription) = self.subscriptions.find_by_purchase(&purchase.id).await? {
            if subscription.status == SubscriptionStatus::Active {
                subscription
                    .cancel(CancelReason::Refund, now)
                    .map_err(|e| WebhookError::InvalidTransition(e.to_string()))?;
                self.subscriptions
                    .update_and_grant(&subscription, now)
                    .await?;
                tracing::info!(
                    subscription_id = %subscription.id,
                    user_id = %subscription.user_id,
                    "Subscription canceled after refund"
                );
            }
        }

        tracing::info!(
            order_id = %purchase.gateway_order_id,
            capture_id = %capture_id,
            "Capture refunded via webhook"
        );
        Ok(WebhookAction::PurchaseRefunded {
            order_id: purchase.gateway_order_id,
        })
    }
}
