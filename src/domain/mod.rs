//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, errors, auth identity)
//! - `access` - Plan tiers, content gates and the access policy
//! - `payment` - Plans, prices and the purchase aggregate
//! - `subscription` - Subscription lifecycle and entitlement resolution
//! - `webhook` - Gateway callback records, payloads and signatures
//! - `idempotency` - Gateway request id derivation

pub mod access;
pub mod foundation;
pub mod idempotency;
pub mod payment;
pub mod subscription;
pub mod webhook;
