//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations over ports.

pub mod payment;
pub mod subscription;
pub mod webhook;

pub use payment::{
    CaptureOrderCommand, CaptureOrderError, CaptureOrderHandler, CaptureOrderResult,
    CaptureOutcome, CheckoutUrls, CreateOrderCommand, CreateOrderError, CreateOrderHandler,
    CreateOrderResult,
};
pub use subscription::{
    CurrentPlan, ExpireSubscriptionsCommand, ExpireSubscriptionsHandler,
    ExpireSubscriptionsResult, GetCurrentPlanHandler, GetCurrentPlanQuery, MaterializeError,
    MaterializeSubscriptionCommand, MaterializeSubscriptionHandler,
    MaterializeSubscriptionResult,
};
pub use webhook::{
    ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookResult,
    PurgeWebhookEventsCommand, PurgeWebhookEventsHandler, PurgeWebhookEventsResult,
    RetryWebhookError, RetryWebhookEventCommand, RetryWebhookEventHandler,
    RetryWebhookEventResult, WebhookAction, WebhookDispatcher,
};
