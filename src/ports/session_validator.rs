//! Session validation port for bearer token validation.
//!
//! Defines the contract for validating access tokens and extracting the
//! caller's identity. The shipped implementation verifies HS256 JWTs; tests
//! use an in-memory token table.
//!
//! All implementations MUST validate:
//! - **Signature**: Token must be signed with the configured secret
//! - **Expiry (exp)**: Token must not be expired
//! - **Issuer (iss)**: When an issuer is configured, it must match

use async_trait::async_trait;

use crate::domain::foundation::{AuthenticatedUser, AuthError};

/// Validates access tokens and extracts user identity.
///
/// This is the primary port for authentication. HTTP middleware uses this
/// to validate Bearer tokens and extract the authenticated user.
///
/// # Contract
///
/// Implementations must:
/// - Validate the token signature
/// - Validate expiry and, when configured, issuer claims
/// - Return `AuthError::InvalidToken` for malformed/bad signature tokens
/// - Return `AuthError::TokenExpired` for expired tokens
/// - Return `AuthError::ServiceUnavailable` for transient errors
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validate an access token and return the authenticated user.
    ///
    /// # Arguments
    ///
    /// * `token` - The raw JWT token (without "Bearer " prefix)
    ///
    /// # Returns
    ///
    /// * `Ok(AuthenticatedUser)` - Token is valid, user extracted from claims
    /// * `Err(AuthError::InvalidToken)` - Token is malformed or signature invalid
    /// * `Err(AuthError::TokenExpired)` - Token signature valid but expired
    /// * `Err(AuthError::ServiceUnavailable)` - Validator cannot reach its key material
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
