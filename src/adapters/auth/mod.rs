//! Authentication adapters.
//!
//! Implementations of the `SessionValidator` port:
//!
//! - `jwt` - HS256 bearer token validation
//! - `mock` - Test implementation that maps tokens to users

mod jwt;
mod mock;

pub use jwt::{JwtConfig, JwtSessionValidator, SessionClaims};
pub use mock::MockSessionValidator;
