//! HTTP adapter for plan reads and plan-gated content.
//!
//! - `GET /api/plans/current`
//! - `GET /api/study`, `GET /api/quizzes`, `GET /api/frameworks/:framework/questions`

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::{content_routes, plan_routes};
