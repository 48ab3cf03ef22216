//! RetryWebhookEventHandler - operator re-run of a failed delivery.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::webhook::{WebhookEvent, WebhookEventStatus};
use crate::ports::WebhookEventStore;

use super::dispatcher::WebhookDispatcher;

#[derive(Debug, Clone)]
pub struct RetryWebhookEventCommand {
    pub event_id: String,
    /// Operator requesting the retry, for the audit log.
    pub requested_by: String,
}

#[derive(Debug, Clone)]
pub struct RetryWebhookEventResult {
    /// The record after the attempt.
    pub event: WebhookEvent,
    pub succeeded: bool,
}

#[derive(Debug, Error)]
pub enum RetryWebhookError {
    #[error("Webhook event not found: {0}")]
    NotFound(String),

    #[error("Webhook event {event_id} is {status}, only failed events can be retried")]
    NotRetryable {
        event_id: String,
        status: WebhookEventStatus,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Re-opens a failed event (failed -> pending, retry_count + 1) and
/// dispatches its stored payload again.
pub struct RetryWebhookEventHandler {
    events: Arc<dyn WebhookEventStore>,
    dispatcher: Arc<WebhookDispatcher>,
}

impl RetryWebhookEventHandler {
    pub fn new(events: Arc<dyn WebhookEventStore>, dispatcher: Arc<WebhookDispatcher>) -> Self {
        Self { events, dispatcher }
    }

    pub async fn handle(
        &self,
        cmd: RetryWebhookEventCommand,
    ) -> Result<RetryWebhookEventResult, RetryWebhookError> {
        // 1. Conditional reopen; only one caller wins it
        let Some(event) = self.events.begin_retry(&cmd.event_id).await? else {
            return match self.events.find(&cmd.event_id).await? {
                None => Err(RetryWebhookError::NotFound(cmd.event_id)),
                Some(existing) => Err(RetryWebhookError::NotRetryable {
                    event_id: cmd.event_id,
                    status: existing.status,
                }),
            };
        };

        tracing::info!(
            event_id = %event.event_id,
            retry_count = event.retry_count,
            requested_by = %cmd.requested_by,
            "Retrying webhook event"
        );

        // 2. Dispatch the stored payload
        let succeeded = match self.dispatcher.dispatch(&event.as_inbound()).await {
            Ok(action) => {
                self.events
                    .mark_processed(&event.event_id, Timestamp::now())
                    .await?;
                tracing::info!(event_id = %event.event_id, action = ?action, "Webhook retry succeeded");
                true
            }
            Err(err) => {
                self.events
                    .mark_failed(&event.event_id, &err.to_string())
                    .await?;
                tracing::warn!(event_id = %event.event_id, error = %err, "Webhook retry failed");
                false
            }
        };

        // 3. Report the stored state
        let event = self
            .events
            .find(&event.event_id)
            .await?
            .ok_or_else(|| RetryWebhookError::NotFound(event.event_id.clone()))?;
        Ok(RetryWebhookEventResult { event, succeeded })
    }
}
