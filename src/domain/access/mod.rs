//! Access module - plan tiers, content gates and the policy joining them.
//!
//! Everything here is pure. The HTTP plan guard resolves a caller's
//! entitlements to a `PlanTier` and asks the `AccessPolicy` for a decision.

mod entitlement;
mod gate;
mod plan_limits;
mod policy;
mod tier;

pub use entitlement::{
    entitlement_for_tier, tier_for_entitlements, tier_for_set, Entitlement, EntitlementSet,
};
pub use gate::{ContentGate, Difficulty, Framework, FrameworkKey, QuizLevel};
pub use plan_limits::{features_for, ContentMode, PlanLimits, QuestionAllowance, QuestionLimitCheck};
pub use policy::{
    accessible_frameworks, all_known_gates, can_access, minimum_tier_for, suggested_upgrade_tier,
    AccessDecision, AccessPolicy, FrameworkRule,
};
pub use tier::PlanTier;
