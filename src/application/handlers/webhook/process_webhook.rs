//! ProcessWebhookHandler - Command handler for inbound gateway webhooks.
//!
//! ```text
//! parse ──► verify ──► record_if_new ──► dispatch ──► mark_processed
//!   │          │             │               │
//!  400        400      known event:     error: mark_failed, 500
//!                      failed → begin_retry, dispatch
//!                      otherwise duplicate: 200
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use http::HeaderMap;

use crate::domain::foundation::Timestamp;
use crate::domain::payment::Gateway;
use crate::domain::webhook::{parse_inbound, WebhookError};
use crate::ports::{WebhookEventStore, WebhookVerifier};

use super::dispatcher::{WebhookAction, WebhookDispatcher};

/// Command carrying one raw delivery.
#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    pub gateway: Gateway,
    pub body: Vec<u8>,
    pub headers: HeaderMap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessWebhookResult {
    /// First delivery; business effects applied.
    Processed {
        event_id: String,
        action: WebhookAction,
    },
    /// Already processed or in flight; nothing applied.
    Duplicate { event_id: String },
}

/// Handler for webhook deliveries.
///
/// Verification runs before anything is stored, so a forged delivery
/// leaves no trace. The event store's unique key on the gateway event id
/// decides which of several concurrent deliveries runs the business effect.
/// An event whose earlier attempt failed is processed again when the
/// gateway redelivers it.
pub struct ProcessWebhookHandler {
    events: Arc<dyn WebhookEventStore>,
    dispatcher: Arc<WebhookDispatcher>,
    verifiers: HashMap<Gateway, Arc<dyn WebhookVerifier>>,
}

impl ProcessWebhookHandler {
    pub fn new(events: Arc<dyn WebhookEventStore>, dispatcher: Arc<WebhookDispatcher>) -> Self {
        Self {
            events,
            dispatcher,
            verifiers: HashMap::new(),
        }
    }

    pub fn with_verifier(mut self, gateway: Gateway, verifier: Arc<dyn WebhookVerifier>) -> Self {
        self.verifiers.insert(gateway, verifier);
        self
    }

    pub async fn handle(
        &self,
        cmd: ProcessWebhookCommand,
    ) -> Result<ProcessWebhookResult, WebhookError> {
        // 1. Parse to the record-keeping shape
        let inbound = parse_inbound(cmd.gateway, &cmd.body)?;

        // 2. Authenticity gate
        let verifier = self.verifiers.get(&cmd.gateway).ok_or_else(|| {
            WebhookError::InvalidSignature(format!("no verifier configured for {}", cmd.gateway))
        })?;
        let outcome = verifier
            .verify(&inbound.payload, &cmd.body, &cmd.headers)
            .await;
        if !outcome.valid {
            let reason = outcome
                .reason
                .unwrap_or_else(|| "signature rejected".to_string());
            tracing::warn!(
                gateway = %cmd.gateway,
                event_id = %inbound.event_id,
                event_type = %inbound.event_type,
                reason = %reason,
                "Webhook authenticity check failed"
            );
            return Err(WebhookError::InvalidSignature(reason));
        }

        // 3. Deduplicate
        let now = Timestamp::now();
        let record = self.events.record_if_new(&inbound, now).await?;
        if !record.is_new {
            // A redelivery of a failed event runs again; the conditional
            // reopen lets one of several concurrent redeliveries through.
            match self.events.begin_retry(&inbound.event_id).await? {
                Some(reopened) => {
                    tracing::info!(
                        gateway = %cmd.gateway,
                        event_id = %inbound.event_id,
                        retry_count = reopened.retry_count,
                        "Redelivery of failed webhook, processing again"
                    );
                }
                None => {
                    tracing::info!(
                        gateway = %cmd.gateway,
                        event_id = %inbound.event_id,
                        "Duplicate webhook delivery ignored"
                    );
                    return Ok(ProcessWebhookResult::Duplicate {
                        event_id: inbound.event_id,
                    });
                }
            }
        }

        // 4. Apply and record the outcome
        match self.dispatcher.dispatch(&inbound).await {
            Ok(action) => {
                self.events
                    .mark_processed(&inbound.event_id, Timestamp::now())
                    .await?;
                tracing::info!(
                    gateway = %cmd.gateway,
                    event_id = %inbound.event_id,
                    event_type = %inbound.event_type,
                    action = ?action,
                    "Webhook processed"
                );
                Ok(ProcessWebhookResult::Processed {
                    event_id: inbound.event_id,
                    action,
                })
            }
            Err(err) => {
                tracing::error!(
                    gateway = %cmd.gateway,
                    event_id = %inbound.event_id,
                    event_type = %inbound.event_type,
                    error = %err,
                    "Webhook processing failed"
                );
                if let Err(mark_err) = self
                    .events
                    .mark_failed(&inbound.event_id, &err.to_string())
                    .await
                {
                    tracing::error!(
                        event_id = %inbound.event_id,
                        error = %mark_err,
                        "Could not mark webhook failed"
                    );
                }
                Err(err)
            }
        }
    }
}
