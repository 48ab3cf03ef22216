//! Entitlement tokens and their mapping onto plan tiers.
//!
//! Users carry entitlement strings (`JUNIOR`, `INTERMEDIATE`, `SENIOR`,
//! `BUNDLE`); access decisions run on `PlanTier`. This is the one place the
//! two naming schemes meet.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

use super::PlanTier;

/// Capability token stored on a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Entitlement {
    Junior,
    Intermediate,
    Senior,
    Bundle,
}

impl Entitlement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entitlement::Junior => "JUNIOR",
            Entitlement::Intermediate => "INTERMEDIATE",
            Entitlement::Senior => "SENIOR",
            Entitlement::Bundle => "BUNDLE",
        }
    }

    /// Tier this single token unlocks.
    pub fn tier(&self) -> PlanTier {
        match self {
            Entitlement::Bundle => PlanTier::Pro,
            Entitlement::Senior => PlanTier::Advanced,
            Entitlement::Intermediate => PlanTier::Intermediate,
            Entitlement::Junior => PlanTier::Free,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Entitlement::Junior => "Junior",
            Entitlement::Intermediate => "Intermediate",
            Entitlement::Senior => "Senior",
            Entitlement::Bundle => "Bundle",
        }
    }
}

impl fmt::Display for Entitlement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Entitlement {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "JUNIOR" => Ok(Entitlement::Junior),
            "INTERMEDIATE" => Ok(Entitlement::Intermediate),
            "SENIOR" => Ok(Entitlement::Senior),
            "BUNDLE" => Ok(Entitlement::Bundle),
            _ => Err(ValidationError::unsupported("entitlement", s)),
        }
    }
}

/// Set of entitlements held by one user.
pub type EntitlementSet = BTreeSet<Entitlement>;

/// Highest tier unlocked by a set of raw entitlement strings.
///
/// Unrecognised strings are ignored, so a corrupted record degrades to free.
pub fn tier_for_entitlements<I, S>(entitlements: I) -> PlanTier
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entitlements
        .into_iter()
        .filter_map(|s| s.as_ref().parse::<Entitlement>().ok())
        .map(|e| e.tier())
        .max()
        .unwrap_or(PlanTier::Free)
}

/// Highest tier unlocked by a typed entitlement set.
pub fn tier_for_set(set: &EntitlementSet) -> PlanTier {
    set.iter().map(Entitlement::tier).max().unwrap_or(PlanTier::Free)
}

/// Entitlement whose display name labels the given tier.
pub fn entitlement_for_tier(tier: PlanTier) -> Entitlement {
    match tier {
        PlanTier::Free => Entitlement::Junior,
        PlanTier::Intermediate => Entitlement::Intermediate,
        PlanTier::Advanced => Entitlement::Senior,
        PlanTier::Pro => Entitlement::Bundle,
    }
}
