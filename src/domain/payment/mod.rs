//! Payment module - plans, prices and the purchase lifecycle.

mod money;
mod plan;
mod purchase;

pub use money::{Money, PriceCatalog, PriceEntry, MAX_AMOUNT_MINOR, MIN_AMOUNT_MINOR};
pub use plan::{BillingCycle, Currency, Gateway, PlanType};
pub use purchase::{generate_order_ref, NewPurchase, Purchase, PurchaseStatus};
