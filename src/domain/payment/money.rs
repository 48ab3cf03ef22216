//! Amounts and the server-side price catalog.
//!
//! Amounts are integer minor units. Clients never supply a price: the order
//! total always comes from `PriceCatalog`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

use super::{BillingCycle, Currency, PlanType};

/// Smallest chargeable amount, in minor units (1.00).
pub const MIN_AMOUNT_MINOR: i64 = 100;

/// Largest chargeable amount, in minor units (10000.00).
pub const MAX_AMOUNT_MINOR: i64 = 1_000_000;

/// A bounded, positive amount in a supported currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    currency: Currency,
    minor: i64,
}

impl Money {
    /// Builds an amount, enforcing the chargeable bounds.
    pub fn new(currency: Currency, minor: i64) -> Result<Self, ValidationError> {
        if !(MIN_AMOUNT_MINOR..=MAX_AMOUNT_MINOR).contains(&minor) {
            return Err(ValidationError::out_of_range(
                "amount",
                MIN_AMOUNT_MINOR,
                MAX_AMOUNT_MINOR,
                minor,
            ));
        }
        Ok(Self { currency, minor })
    }

    /// Parses a gateway decimal string such as `"15.00"` or `"15"`.
    pub fn parse(currency: Currency, value: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::invalid_format("amount", "expected digits with optional two decimals");
        let (whole, frac) = match value.split_once('.') {
            Some((w, f)) if f.len() == 2 => (w, f),
            Some(_) => return Err(invalid()),
            None => (value, "00"),
        };
        if whole.is_empty()
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let frac: i64 = frac.parse().map_err(|_| invalid())?;
        let minor = whole
            .checked_mul(100)
            .and_then(|w| w.checked_add(frac))
            .ok_or_else(invalid)?;
        Self::new(currency, minor)
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn minor_units(&self) -> i64 {
        self.minor
    }

    /// Two-decimal string as gateways expect it.
    pub fn to_decimal_string(&self) -> String {
        format!("{}.{:02}", self.minor / 100, self.minor % 100)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_decimal_string(), self.currency)
    }
}

/// One catalog line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceEntry {
    pub plan: PlanType,
    pub cycle: BillingCycle,
    pub currency: Currency,
    pub minor: i64,
}

/// Fixed price list per plan, cycle and currency.
#[derive(Debug, Clone)]
pub struct PriceCatalog {
    entries: Vec<PriceEntry>,
}

impl PriceCatalog {
    /// The published price list.
    ///
    /// | Plan | Monthly USD / JOD / SAR | Yearly USD / JOD / SAR |
    /// |------|-------------------------|------------------------|
    /// | INTERMEDIATE | 15.00 / 10.64 / 56.25 | 150.00 / 106.35 / 562.50 |
    /// | SENIOR | 22.00 / 15.60 / 82.50 | 220.00 / 155.98 / 825.00 |
    /// | BUNDLE | 30.00 / 21.27 / 112.50 | 300.00 / 212.70 / 1125.00 |
    pub fn standard() -> Self {
        use BillingCycle::{Monthly, Yearly};
        use Currency::{Jod, Sar, Usd};
        use PlanType::{Bundle, Intermediate, Senior};

        let rows: [(PlanType, BillingCycle, [i64; 3]); 6] = [
            (Intermediate, Monthly, [1_500, 1_064, 5_625]),
            (Intermediate, Yearly, [15_000, 10_635, 56_250]),
            (Senior, Monthly, [2_200, 1_560, 8_250]),
            (Senior, Yearly, [22_000, 15_598, 82_500]),
            (Bundle, Monthly, [3_000, 2_127, 11_250]),
            (Bundle, Yearly, [30_000, 21_270, 112_500]),
        ];

        let entries = rows
            .iter()
            .flat_map(|(plan, cycle, prices)| {
                [Usd, Jod, Sar]
                    .into_iter()
                    .zip(prices.iter())
                    .map(move |(currency, minor)| PriceEntry {
                        plan: *plan,
                        cycle: *cycle,
                        currency,
                        minor: *minor,
                    })
            })
            .collect();

        Self { entries }
    }

    pub fn from_entries(entries: Vec<PriceEntry>) -> Self {
        Self { entries }
    }

    /// Price for a plan, validated against the amount bounds.
    pub fn price_for(
        &self,
        plan: PlanType,
        cycle: BillingCycle,
        currency: Currency,
    ) -> Result<Money, ValidationError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.plan == plan && e.cycle == cycle && e.currency == currency)
            .ok_or_else(|| {
                ValidationError::unsupported(
                    "currency",
                    format!("{} for {} {}", currency, plan, cycle),
                )
            })?;
        Money::new(entry.currency, entry.minor)
    }
}

impl Default for PriceCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
