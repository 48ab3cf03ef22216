//! HTTP middleware for axum.
//!
//! - `auth` - Bearer session validation and identity extractors
//! - `plan_guard` - Content gate enforcement against stored entitlements
//! - `rate_limit` - Per-route fixed-window limits

pub mod auth;
pub mod plan_guard;
pub mod rate_limit;

pub use auth::{
    auth_middleware, AuthRejection, AuthState, OptionalAuth, RequireAdmin, RequireAuth,
};
pub use plan_guard::{plan_guard, GateSource, GuardRejection, PlanDenial, PlanGuard, ResolvedPlan};
pub use rate_limit::{rate_limit_middleware, ResourceRateLimit};
