//! Webhook handlers.
//!
//! ## Commands
//! - Processing a gateway delivery (verify, deduplicate, apply)
//! - Operator retry of a failed delivery
//! - Purging records past the retention window

mod dispatcher;
mod process_webhook;
mod purge_webhook_events;
mod retry_webhook_event;

pub use dispatcher::{WebhookAction, WebhookDispatcher};
pub use process_webhook::{ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookResult};
pub use purge_webhook_events::{
    PurgeWebhookEventsCommand, PurgeWebhookEventsHandler, PurgeWebhookEventsResult,
};
pub use retry_webhook_event::{
    RetryWebhookError, RetryWebhookEventCommand, RetryWebhookEventHandler,
    RetryWebhookEventResult,
};
