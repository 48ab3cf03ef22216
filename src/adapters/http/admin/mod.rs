//! HTTP adapter for operator actions.

pub mod handlers;
pub mod routes;

pub use routes::admin_routes;
