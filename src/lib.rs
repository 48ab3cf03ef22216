//! Quiz Entitlements - plan-gated content access and payment reconciliation
//!
//! Resolves what a quiz platform user may open from their durable
//! entitlements, and turns gateway payments (PayPal capture, verified
//! webhooks) into subscriptions and entitlements exactly once.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
