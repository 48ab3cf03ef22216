//! Access policy: which tier may open which content.
//!
//! Pure functions only. Anonymous callers are evaluated as `PlanTier::Free`.
//!
//! # Floors
//!
//! | Axis | Value | Minimum tier |
//! |------|-------|--------------|
//! | difficulty | easy / medium / hard | free / intermediate / advanced |
//! | level | junior / intermediate / senior | free / intermediate / advanced |
//! | framework | react, random | free |
//! | framework | angular | intermediate |
//! | framework | nextjs, redux | advanced |
//! | framework | vue | pro |
//! | framework | anything else | pro |

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::{ContentGate, Difficulty, Framework, FrameworkKey, PlanTier, QuizLevel};

/// Access rule for one framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkRule {
    pub framework: Framework,
    pub minimum_tier: PlanTier,
    /// Inactive frameworks are closed to every tier.
    pub active: bool,
}

impl FrameworkRule {
    pub const fn new(framework: Framework, minimum_tier: PlanTier) -> Self {
        Self {
            framework,
            minimum_tier,
            active: true,
        }
    }
}

/// Outcome of evaluating a tier against a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied {
        required: PlanTier,
        suggested: PlanTier,
        current: PlanTier,
    },
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed)
    }
}

/// Table of gate floors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    frameworks: Vec<FrameworkRule>,
}

const STANDARD_FRAMEWORK_RULES: [FrameworkRule; 6] = [
    FrameworkRule::new(Framework::React, PlanTier::Free),
    FrameworkRule::new(Framework::Angular, PlanTier::Intermediate),
    FrameworkRule::new(Framework::Nextjs, PlanTier::Advanced),
    FrameworkRule::new(Framework::Redux, PlanTier::Advanced),
    FrameworkRule::new(Framework::Vue, PlanTier::Pro),
    FrameworkRule::new(Framework::Random, PlanTier::Free),
];

static STANDARD: Lazy<AccessPolicy> = Lazy::new(AccessPolicy::standard);

impl AccessPolicy {
    /// The production rule set.
    pub fn standard() -> Self {
        Self {
            frameworks: STANDARD_FRAMEWORK_RULES.to_vec(),
        }
    }

    /// Replaces (or adds) the rule for one framework.
    pub fn with_framework_rule(mut self, rule: FrameworkRule) -> Self {
        self.frameworks.retain(|r| r.framework != rule.framework);
        self.frameworks.push(rule);
        self
    }

    fn framework_rule(&self, key: &FrameworkKey) -> Option<&FrameworkRule> {
        let framework = key.known()?;
        self.frameworks.iter().find(|r| r.framework == framework)
    }

    /// Minimum tier for a gate. Unconfigured frameworks resolve to the top tier.
    pub fn minimum_tier_for(&self, gate: &ContentGate) -> PlanTier {
        match gate {
            ContentGate::Difficulty(d) => difficulty_floor(*d),
            ContentGate::QuizLevel(l) => l.as_tier(),
            ContentGate::Framework(key) => self
                .framework_rule(key)
                .map(|r| r.minimum_tier)
                .unwrap_or(PlanTier::Pro),
        }
    }

    /// True iff `tier` ranks at or above the gate floor and the gate is open.
    pub fn can_access(&self, tier: PlanTier, gate: &ContentGate) -> bool {
        if let ContentGate::Framework(key) = gate {
            if matches!(self.framework_rule(key), Some(rule) if !rule.active) {
                return false;
            }
        }
        tier.rank() >= self.minimum_tier_for(gate).rank()
    }

    /// Full decision with upgrade guidance on denial.
    pub fn evaluate(&self, tier: PlanTier, gate: &ContentGate) -> AccessDecision {
        if self.can_access(tier, gate) {
            return AccessDecision::Allowed;
        }
        let required = self.minimum_tier_for(gate);
        AccessDecision::Denied {
            required,
            suggested: suggested_upgrade_tier(required, tier),
            current: tier,
        }
    }

    /// Frameworks open to `tier`, in configuration order.
    pub fn accessible_frameworks(&self, tier: PlanTier) -> Vec<Framework> {
        self.frameworks
            .iter()
            .filter(|r| r.active && tier.covers(r.minimum_tier))
            .map(|r| r.framework)
            .collect()
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

fn difficulty_floor(difficulty: Difficulty) -> PlanTier {
    match difficulty {
        Difficulty::Easy => PlanTier::Free,
        Difficulty::Medium => PlanTier::Intermediate,
        Difficulty::Hard => PlanTier::Advanced,
    }
}

/// `can_access` against the standard rule set.
pub fn can_access(tier: PlanTier, gate: &ContentGate) -> bool {
    STANDARD.can_access(tier, gate)
}

/// `minimum_tier_for` against the standard rule set.
pub fn minimum_tier_for(gate: &ContentGate) -> PlanTier {
    STANDARD.minimum_tier_for(gate)
}

/// `accessible_frameworks` against the standard rule set.
pub fn accessible_frameworks(tier: PlanTier) -> Vec<Framework> {
    STANDARD.accessible_frameworks(tier)
}

/// Tier to recommend to a caller who was denied.
///
/// Free callers are pointed at the cheapest paid step for low and medium
/// gates, but straight at the real requirement when it is advanced or pro.
/// Paid callers always get the requirement itself.
pub fn suggested_upgrade_tier(required: PlanTier, current: PlanTier) -> PlanTier {
    if current == PlanTier::Free && required != PlanTier::Free {
        return match required {
            PlanTier::Advanced | PlanTier::Pro => required,
            _ => PlanTier::Intermediate,
        };
    }
    required
}

/// Every gate value with a configured floor, for exhaustive checks.
pub fn all_known_gates() -> Vec<ContentGate> {
    Difficulty::ALL
        .into_iter()
        .map(ContentGate::from)
        .chain(QuizLevel::ALL.into_iter().map(ContentGate::from))
        .chain(Framework::ALL.into_iter().map(ContentGate::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn gate(s: &str) -> ContentGate {
        ContentGate::Framework(FrameworkKey::parse(s).unwrap())
    }

    #[test]
    fn hard_needs_advanced() {
        let hard = ContentGate::from(Difficulty::Hard);
        assert!(can_access(PlanTier::Advanced, &hard));
        assert!(!can_access(PlanTier::Intermediate, &hard));
    }

    #[test]
    fn framework_floors_match_table() {
        assert_eq!(minimum_tier_for(&gate("react")), PlanTier::Free);
        assert_eq!(minimum_tier_for(&gate("angular")), PlanTier::Intermediate);
        assert_eq!(minimum_tier_for(&gate("nextjs")), PlanTier::Advanced);
        assert_eq!(minimum_tier_for(&gate("redux")), PlanTier::Advanced);
        assert_eq!(minimum_tier_for(&gate("vue")), PlanTier::Pro);
        assert_eq!(minimum_tier_for(&gate("random")), PlanTier::Free);
    }

    #[test]
    fn unknown_framework_fails_closed() {
        let svelte = gate("svelte");
        assert_eq!(minimum_tier_for(&svelte), PlanTier::Pro);
        assert!(!can_access(PlanTier::Advanced, &svelte));
    }

    #[test]
    fn inactive_framework_denies_everyone() {
        let policy = AccessPolicy::standard().with_framework_rule(FrameworkRule {
            framework: Framework::React,
            minimum_tier: PlanTier::Free,
            active: false,
        });
        for tier in PlanTier::ALL {
            assert!(!policy.can_access(tier, &gate("react")));
        }
        assert!(!policy.accessible_frameworks(PlanTier::Pro).contains(&Framework::React));
    }

    #[test]
    fn suggestion_table() {
        use PlanTier::*;
        assert_eq!(suggested_upgrade_tier(Intermediate, Free), Intermediate);
        assert_eq!(suggested_upgrade_tier(Advanced, Free), Advanced);
        assert_eq!(suggested_upgrade_tier(Pro, Free), Pro);
        assert_eq!(suggested_upgrade_tier(Advanced, Intermediate), Advanced);
        assert_eq!(suggested_upgrade_tier(Pro, Advanced), Pro);
        assert_eq!(suggested_upgrade_tier(Free, Free), Free);
    }

    #[test]
    fn evaluate_reports_upgrade_guidance() {
        let decision = AccessPolicy::standard().evaluate(PlanTier::Free, &Difficulty::Hard.into());
        assert_eq!(
            decision,
            AccessDecision::Denied {
                required: PlanTier::Advanced,
                suggested: PlanTier::Advanced,
                current: PlanTier::Free,
            }
        );
        assert!(AccessPolicy::standard()
            .evaluate(PlanTier::Pro, &Difficulty::Hard.into())
            .is_allowed());
    }

    #[test]
    fn accessible_frameworks_grow_with_tier() {
        assert_eq!(
            accessible_frameworks(PlanTier::Free),
            vec![Framework::React, Framework::Random]
        );
        assert_eq!(accessible_frameworks(PlanTier::Pro).len(), Framework::ALL.len());
    }

    fn any_tier() -> impl Strategy<Value = PlanTier> {
        prop::sample::select(PlanTier::ALL.to_vec())
    }

    fn any_gate() -> impl Strategy<Value = ContentGate> {
        prop::sample::select(all_known_gates())
    }

    proptest! {
        #[test]
        fn access_is_monotonic(a in any_tier(), b in any_tier(), g in any_gate()) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            if can_access(low, &g) {
                prop_assert!(can_access(high, &g));
            }
        }

        #[test]
        fn floor_is_exact_boundary(g in any_gate()) {
            let floor = minimum_tier_for(&g);
            prop_assert!(can_access(floor, &g));
            if let Some(below) = floor.below() {
                prop_assert!(!can_access(below, &g));
            }
        }

        #[test]
        fn suggestion_never_below_requirement_for_paid_gates(
            required in any_tier(),
            current in any_tier(),
        ) {
            let suggested = suggested_upgrade_tier(required, current);
            if current != PlanTier::Free {
                prop_assert_eq!(suggested, required);
            } else if required != PlanTier::Free {
                prop_assert!(suggested.is_paid());
            }
        }
    }
}
