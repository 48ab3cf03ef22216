//! PayPal adapters.
//!
//! - `PayPalClient` - Orders API client implementing `PaymentGateway`
//! - `PayPalWebhookVerifier` - Delivery authenticity via PayPal's verification API
//! - `MockPaymentGateway` / `MockWebhookVerifier` - In-process doubles for tests
//!
//! # Security
//!
//! - Client secret held in `secrecy::SecretString`, redacted from `Debug`
//! - Webhooks are only accepted when PayPal itself reports `SUCCESS`

mod api_types;
mod client;
mod mock;
mod webhook_verifier;

pub use client::{PayPalClient, PayPalConfig, PayPalMode};
pub use mock::{GatewayCall, MockCaptureOutcome, MockPaymentGateway, MockWebhookVerifier};
pub use webhook_verifier::{
    PayPalTransmission, PayPalWebhookVerifier, HEADER_AUTH_ALGO, HEADER_CERT_URL,
    HEADER_TRANSMISSION_ID, HEADER_TRANSMISSION_SIG, HEADER_TRANSMISSION_TIME,
};
