//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `PurchaseRepository` - Checkout attempts with conditional transitions
//! - `SubscriptionRepository` - Subscriptions plus transactional entitlement writes
//! - `UserAccountRepository` - The entitlement set access checks read
//! - `WebhookEventStore` - Deduplicated gateway callback records
//!
//! ## Integration Ports
//!
//! - `PaymentGateway` - Order creation and capture
//! - `WebhookVerifier` - Callback authenticity
//! - `SessionValidator` - Bearer token validation
//! - `RateLimiter` - Shared fixed-window counters

mod payment_gateway;
mod purchase_repository;
mod rate_limiter;
mod session_validator;
mod subscription_repository;
mod user_accounts;
mod webhook_event_store;
mod webhook_verifier;

pub use payment_gateway::{
    CaptureOrderRequest, CaptureResult, CaptureStatus, CreateOrderRequest, GatewayError,
    GatewayErrorCode, GatewayOrder, PaymentGateway,
};
pub use purchase_repository::PurchaseRepository;
pub use rate_limiter::{
    Caller, Quota, RateLimitDecision, RateLimitError, RateLimitKey, RateLimiter,
};
pub use session_validator::SessionValidator;
pub use subscription_repository::{InsertOutcome, SubscriptionRepository};
pub use user_accounts::{UserAccount, UserAccountRepository};
pub use webhook_event_store::{RecordOutcome, WebhookEventStore};
pub use webhook_verifier::{VerificationOutcome, WebhookVerifier};
