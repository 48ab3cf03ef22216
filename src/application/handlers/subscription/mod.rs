//! Subscription handlers.
//!
//! ## Commands
//! - Materializing a completed purchase into a subscription and entitlements
//! - Expiring subscriptions past their billing period
//!
//! ## Queries
//! - Current plan for a user

mod expire_subscriptions;
mod get_current_plan;
mod materialize_subscription;

// Commands
pub use expire_subscriptions::{
    ExpireSubscriptionsCommand, ExpireSubscriptionsHandler, ExpireSubscriptionsResult,
    DEFAULT_EXPIRY_BATCH,
};
pub use materialize_subscription::{
    MaterializeError, MaterializeSubscriptionCommand, MaterializeSubscriptionHandler,
    MaterializeSubscriptionResult,
};

// Queries
pub use get_current_plan::{CurrentPlan, GetCurrentPlanHandler, GetCurrentPlanQuery};
