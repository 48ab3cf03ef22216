//! Purchasable plans, billing cycles, currencies and gateways.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::access::{Entitlement, EntitlementSet, PlanTier};
use crate::domain::foundation::ValidationError;

/// A paid plan a user can buy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanType {
    Intermediate,
    Senior,
    Bundle,
}

impl PlanType {
    pub const ALL: [PlanType; 3] = [PlanType::Intermediate, PlanType::Senior, PlanType::Bundle];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Intermediate => "INTERMEDIATE",
            PlanType::Senior => "SENIOR",
            PlanType::Bundle => "BUNDLE",
        }
    }

    /// Entitlements granted by an active subscription to this plan.
    ///
    /// One token per plan: lower content is reached through tier ordering,
    /// not by accumulating tokens.
    pub fn entitlements(&self) -> EntitlementSet {
        let token = match self {
            PlanType::Intermediate => Entitlement::Intermediate,
            PlanType::Senior => Entitlement::Senior,
            PlanType::Bundle => Entitlement::Bundle,
        };
        EntitlementSet::from([token])
    }

    pub fn tier(&self) -> PlanTier {
        match self {
            PlanType::Intermediate => PlanTier::Intermediate,
            PlanType::Senior => PlanTier::Advanced,
            PlanType::Bundle => PlanTier::Pro,
        }
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlanType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INTERMEDIATE" => Ok(PlanType::Intermediate),
            "SENIOR" => Ok(PlanType::Senior),
            "BUNDLE" => Ok(PlanType::Bundle),
            _ => Err(ValidationError::unsupported("plan_type", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Yearly,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Yearly => "yearly",
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BillingCycle {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(BillingCycle::Monthly),
            "yearly" => Ok(BillingCycle::Yearly),
            _ => Err(ValidationError::unsupported("billing_cycle", s)),
        }
    }
}

/// Settlement currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Jod,
    Sar,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Jod => "JOD",
            Currency::Sar => "SAR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USD" => Ok(Currency::Usd),
            "JOD" => Ok(Currency::Jod),
            "SAR" => Ok(Currency::Sar),
            _ => Err(ValidationError::unsupported("currency", s)),
        }
    }
}

/// Payment gateway that produced a purchase or webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gateway {
    Paypal,
    Aps,
    Hyperpay,
}

impl Gateway {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gateway::Paypal => "paypal",
            Gateway::Aps => "aps",
            Gateway::Hyperpay => "hyperpay",
        }
    }
}

impl fmt::Display for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Gateway {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paypal" => Ok(Gateway::Paypal),
            "aps" => Ok(Gateway::Aps),
            "hyperpay" => Ok(Gateway::Hyperpay),
            _ => Err(ValidationError::unsupported("gateway", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_entitlements_are_single_tokens() {
        assert_eq!(
            PlanType::Intermediate.entitlements(),
            EntitlementSet::from([Entitlement::Intermediate])
        );
        assert_eq!(PlanType::Senior.entitlements(), EntitlementSet::from([Entitlement::Senior]));
        assert_eq!(PlanType::Bundle.entitlements(), EntitlementSet::from([Entitlement::Bundle]));
    }

    #[test]
    fn plan_tier_agrees_with_entitlement_tier() {
        for plan in PlanType::ALL {
            let via_tokens = crate::domain::access::tier_for_set(&plan.entitlements());
            assert_eq!(plan.tier(), via_tokens);
        }
    }

    #[test]
    fn enums_parse_wire_forms() {
        assert_eq!("SENIOR".parse::<PlanType>().unwrap(), PlanType::Senior);
        assert_eq!("yearly".parse::<BillingCycle>().unwrap(), BillingCycle::Yearly);
        assert_eq!("SAR".parse::<Currency>().unwrap(), Currency::Sar);
        assert_eq!("hyperpay".parse::<Gateway>().unwrap(), Gateway::Hyperpay);
        assert!("EUR".parse::<Currency>().is_err());
        assert!("weekly".parse::<BillingCycle>().is_err());
        assert!("JUNIOR".parse::<PlanType>().is_err());
    }

    #[test]
    fn serde_uses_wire_forms() {
        assert_eq!(serde_json::to_string(&Currency::Jod).unwrap(), "\"JOD\"");
        assert_eq!(serde_json::to_string(&PlanType::Bundle).unwrap(), "\"BUNDLE\"");
        assert_eq!(serde_json::to_string(&BillingCycle::Monthly).unwrap(), "\"monthly\"");
    }
}
