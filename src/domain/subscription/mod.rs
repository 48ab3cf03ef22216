//! Subscription module - durable entitlement grants.

mod aggregate;

pub use aggregate::{
    billing_period_end, resolve_entitlements, CancelReason, Subscription, SubscriptionStatus,
};
