//! Foundation module - Shared domain primitives.
//!
//! Identifiers, timestamps, error types, the state machine trait and the
//! authenticated-user vocabulary used by every other domain module.

mod auth;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser, UserRole};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{PurchaseId, SubscriptionId, UserId, WebhookRecordId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
