//! Payment handlers.
//!
//! ## Commands
//! - Creating a gateway order for a plan
//! - Capturing an approved order and granting the subscription

mod capture_order;
mod create_order;

pub use capture_order::{
    CaptureOrderCommand, CaptureOrderError, CaptureOrderHandler, CaptureOrderResult,
    CaptureOutcome,
};
pub use create_order::{
    CheckoutUrls, CreateOrderCommand, CreateOrderError, CreateOrderHandler, CreateOrderResult,
};
