//! Authentication adapters.
//!
//! Implementations of the `SessionValidator` port:
//!
//! - `jwt` - HS256 session tokens issued by the platform login flow
//! - `mock` - Test implementation that maps fixed tokens to users

mod jwt;
mod mock;

pub use jwt::{JwtConfig, JwtSessionValidator, SessionClaims, DEFAULT_AUDIENCE, DEFAULT_ISSUER};
pub use mock::MockSessionValidator;
