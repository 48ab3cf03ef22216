//! Application layer - Commands, Queries, and Handlers.
//!
//! Handlers orchestrate domain rules over ports. They hold `Arc<dyn Port>`
//! dependencies and know nothing about HTTP or storage engines.

pub mod handlers;
pub mod maintenance;

pub use handlers::{
    // Payment
    CaptureOrderCommand, CaptureOrderError, CaptureOrderHandler, CaptureOrderResult,
    CaptureOutcome, CheckoutUrls, CreateOrderCommand, CreateOrderError, CreateOrderHandler,
    CreateOrderResult,
    // Subscription
    CurrentPlan, ExpireSubscriptionsCommand, ExpireSubscriptionsHandler, GetCurrentPlanHandler,
    GetCurrentPlanQuery, MaterializeSubscriptionCommand, MaterializeSubscriptionHandler,
    // Webhook
    ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookResult,
    PurgeWebhookEventsCommand, PurgeWebhookEventsHandler, RetryWebhookError,
    RetryWebhookEventCommand, RetryWebhookEventHandler, WebhookDispatcher,
};
pub use maintenance::{MaintenanceReport, MaintenanceTask};
