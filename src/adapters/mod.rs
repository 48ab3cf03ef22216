//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `auth` - Session token validation (JWT, mock)
//! - `http` - axum routers, middleware and DTOs
//! - `memory` - In-memory storage for tests and local runs
//! - `paypal` - PayPal Orders API client, webhook verification, mocks
//! - `postgres` - sqlx storage
//! - `rate_limiter` - Fixed-window limits (Redis, in-memory)
//! - `signature` - HMAC verification for APS and HyperPay webhooks

pub mod auth;
pub mod http;
pub mod memory;
pub mod paypal;
pub mod postgres;
pub mod rate_limiter;
pub mod signature;

pub use memory::InMemoryStore;
pub use signature::HmacWebhookVerifier;
