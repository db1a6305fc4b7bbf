//! Webhook error types for payment provider callbacks.
//!
//! Signature failures are a separate variant from every processing failure,
//! so callers classify by type rather than by message text.

use thiserror::Error;

use super::MetadataError;

/// Errors that occur while accepting a provider webhook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// Signature header missing, malformed, stale, or not matching the payload.
    #[error("Webhook signature verification failed: {0}")]
    SignatureVerification(String),

    /// Payload is not a well-formed provider event.
    #[error("Malformed webhook payload: {0}")]
    MalformedPayload(String),

    /// Payment intent carries no usable metadata key.
    #[error("Missing metadata: {0}")]
    MissingMetadata(&'static str),

    /// Metadata present but not decodable.
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    /// Enrollment could not be written or read back.
    #[error("Enrollment processing failed: {0}")]
    Enrollment(String),
}

impl WebhookError {
    /// True for rejections that happen before any event processing.
    pub fn is_signature_failure(&self) -> bool {
        matches!(self, WebhookError::SignatureVerification(_))
    }

    /// Returns true if a redelivery of the same event may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Enrollment(_))
    }
}

impl From<MetadataError> for WebhookError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::Missing(key) => WebhookError::MissingMetadata(key),
            invalid @ MetadataError::Invalid { .. } => {
                WebhookError::InvalidMetadata(invalid.to_string())
            }
        }
    }
}
