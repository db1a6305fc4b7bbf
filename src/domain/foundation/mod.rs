//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, auth types and error types
//! that form the vocabulary of the payment domain.

mod auth;
mod errors;
mod ids;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{CourseId, EnrollmentId, UserId};
pub use timestamp::Timestamp;
