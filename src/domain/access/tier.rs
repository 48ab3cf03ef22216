//! Plan tier definitions.
//!
//! The single ordered classification every access decision is made against.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Ordered plan tier: `free < intermediate < advanced < pro`.
///
/// Ordering is by declaration position. Comparisons go through `rank()` or
/// the derived `Ord`, never through the string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    /// No paid entitlement. Also the tier of anonymous callers.
    Free,
    Intermediate,
    Advanced,
    /// Top tier, granted by the bundle plan.
    Pro,
}

impl PlanTier {
    /// All tiers, lowest first.
    pub const ALL: [PlanTier; 4] = [
        PlanTier::Free,
        PlanTier::Intermediate,
        PlanTier::Advanced,
        PlanTier::Pro,
    ];

    /// Numeric position in the tier order.
    pub fn rank(&self) -> u8 {
        match self {
            PlanTier::Free => 0,
            PlanTier::Intermediate => 1,
            PlanTier::Advanced => 2,
            PlanTier::Pro => 3,
        }
    }

    /// True if this tier sits at or above `other`.
    pub fn covers(&self, other: PlanTier) -> bool {
        self.rank() >= other.rank()
    }

    /// The tier directly below this one, if any.
    pub fn below(&self) -> Option<PlanTier> {
        match self {
            PlanTier::Free => None,
            PlanTier::Intermediate => Some(PlanTier::Free),
            PlanTier::Advanced => Some(PlanTier::Intermediate),
            PlanTier::Pro => Some(PlanTier::Advanced),
        }
    }

    pub fn is_paid(&self) -> bool {
        !matches!(self, PlanTier::Free)
    }

    /// Wire form, as used in query strings and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Intermediate => "intermediate",
            PlanTier::Advanced => "advanced",
            PlanTier::Pro => "pro",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PlanTier::Free => "Free",
            PlanTier::Intermediate => "Intermediate",
            PlanTier::Advanced => "Advanced",
            PlanTier::Pro => "Pro",
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(PlanTier::Free),
            "intermediate" => Ok(PlanTier::Intermediate),
            "advanced" => Ok(PlanTier::Advanced),
            "pro" => Ok(PlanTier::Pro),
            _ => Err(ValidationError::unsupported("plan_tier", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_totally_ordered_by_rank() {
        for pair in PlanTier::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].rank() < pair[1].rank());
        }
    }

    #[test]
    fn covers_is_inclusive() {
        assert!(PlanTier::Advanced.covers(PlanTier::Advanced));
        assert!(PlanTier::Pro.covers(PlanTier::Free));
        assert!(!PlanTier::Intermediate.covers(PlanTier::Advanced));
    }

    #[test]
    fn below_walks_down_the_ladder() {
        assert_eq!(PlanTier::Pro.below(), Some(PlanTier::Advanced));
        assert_eq!(PlanTier::Free.below(), None);
    }

    #[test]
    fn only_free_is_unpaid() {
        assert!(!PlanTier::Free.is_paid());
        assert!(PlanTier::ALL[1..].iter().all(PlanTier::is_paid));
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&PlanTier::Advanced).unwrap(), "\"advanced\"");
        let t: PlanTier = serde_json::from_str("\"pro\"").unwrap();
        assert_eq!(t, PlanTier::Pro);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Intermediate".parse::<PlanTier>().unwrap(), PlanTier::Intermediate);
        assert!("gold".parse::<PlanTier>().is_err());
    }
}
