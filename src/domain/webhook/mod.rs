//! Webhook domain: delivery records, authenticity checks and payloads.

mod errors;
mod event;
mod hmac_verifier;
mod paypal_event;

pub use errors::WebhookError;
pub use event::{
    retention_cutoff, InboundWebhook, WebhookEvent, WebhookEventStatus, DEFAULT_RETENTION_DAYS,
};
pub use hmac_verifier::{HmacSignatureVerifier, SIGNATURE_HEADER};
pub use paypal_event::{parse_inbound, GenericWebhookEnvelope, PayPalEventType, PayPalWebhookEvent};

#[cfg(test)]
pub use hmac_verifier::sign_for_test;
#[cfg(test)]
pub use paypal_event::PayPalEventBuilder;
