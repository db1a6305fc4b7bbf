//! Payment gateway port for the external payment provider.
//!
//! Defines the contract for creating and retrieving payment intents and for
//! turning provider webhook deliveries into typed events.
//!
//! # Design
//!
//! - **Gateway agnostic**: Stripe is the shipped adapter; the application
//!   layer only sees this trait
//! - **Retry-aware**: errors carry a `retryable` flag consumed by the retry
//!   decorator
//! - **Idempotent creation**: every create request carries an idempotency key

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::payment::{IntentMetadata, PaymentIntent};

/// Port for payment provider integrations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent for a single checkout.
    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError>;

    /// Fetch the current state of an intent.
    ///
    /// Unknown ids are reported as `PaymentErrorCode::NotFound`.
    async fn retrieve_payment_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError>;

    /// Verify a webhook signature and parse the event.
    ///
    /// Returns `PaymentErrorCode::InvalidWebhook` if the signature is
    /// missing, stale or wrong, or the payload is not an event.
    fn verify_webhook(&self, payload: &[u8], signature: &str) -> Result<WebhookEvent, PaymentError>;

    /// Parse a webhook payload without checking its signature.
    fn parse_webhook(&self, payload: &[u8]) -> Result<WebhookEvent, PaymentError>;
}

/// Request to create a payment intent.
#[derive(Debug, Clone)]
pub struct CreatePaymentIntentRequest {
    /// Amount in minor currency units.
    pub amount_minor: i64,

    /// Lowercase ISO currency code.
    pub currency: String,

    /// Links the intent back to user, course and plan.
    pub metadata: IntentMetadata,

    /// Statement/dashboard description.
    pub description: Option<String>,

    /// Idempotency key, reused across retries of the same request.
    pub idempotency_key: String,
}

/// Provider event after verification and parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    /// Provider's event ID (evt_...).
    pub id: String,

    /// Type of event.
    pub event_type: WebhookEventType,

    /// Event-specific data.
    pub data: WebhookEventData,

    /// When the event was created (Unix seconds).
    pub created_at: i64,
}

/// Webhook event types handled by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventType {
    /// `payment_intent.succeeded`
    PaymentIntentSucceeded,

    /// `payment_intent.payment_failed`
    PaymentIntentPaymentFailed,

    /// `charge.refunded`
    ChargeRefunded,

    /// Any other event type.
    Unknown(String),
}

impl WebhookEventType {
    pub fn from_provider(event_type: &str) -> Self {
        match event_type {
            "payment_intent.succeeded" => WebhookEventType::PaymentIntentSucceeded,
            "payment_intent.payment_failed" => WebhookEventType::PaymentIntentPaymentFailed,
            "charge.refunded" => WebhookEventType::ChargeRefunded,
            other => WebhookEventType::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            WebhookEventType::PaymentIntentSucceeded => "payment_intent.succeeded",
            WebhookEventType::PaymentIntentPaymentFailed => "payment_intent.payment_failed",
            WebhookEventType::ChargeRefunded => "charge.refunded",
            WebhookEventType::Unknown(s) => s,
        }
    }
}

impl std::fmt::Display for WebhookEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Event-specific data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventData {
    /// Payment intent events.
    PaymentIntent {
        intent: PaymentIntent,
        /// Provider's failure message, for failed intents.
        failure_message: Option<String>,
    },

    /// Charge events.
    Charge {
        charge_id: String,
        payment_intent_id: Option<String>,
        amount_refunded: i64,
        currency: String,
    },

    /// Raw JSON for unhandled types.
    Raw { json: String },
}

/// Errors from payment gateway operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentError {
    /// Error code for categorization.
    pub code: PaymentErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Provider's error code (if available).
    pub provider_code: Option<String>,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl PaymentError {
    /// Create a new payment error.
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    /// Create with provider code.
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::Timeout, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::AuthenticationError, message)
    }

    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::InvalidRequest, message)
    }

    /// Create a not found error.
    pub fn not_found(resource: &str) -> Self {
        Self::new(PaymentErrorCode::NotFound, format!("{} not found", resource))
    }

    /// Create a rate limit error.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::RateLimitExceeded, message)
    }

    /// Create an error for a provider-side failure (5xx). Retryable.
    pub fn provider_unavailable(message: impl Into<String>) -> Self {
        Self {
            retryable: true,
            ..Self::new(PaymentErrorCode::ProviderError, message)
        }
    }

    /// Create an invalid webhook error.
    pub fn invalid_webhook(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::InvalidWebhook, message)
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

impl From<PaymentError> for DomainError {
    fn from(err: PaymentError) -> Self {
        let code = match err.code {
            PaymentErrorCode::NotFound => ErrorCode::NotFound,
            PaymentErrorCode::InvalidWebhook | PaymentErrorCode::InvalidRequest => {
                ErrorCode::ValidationFailed
            }
            _ => ErrorCode::ExternalServiceError,
        };

        DomainError::new(code, err.message)
    }
}

/// Payment error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    /// Network connectivity issue.
    NetworkError,

    /// Request did not complete within the configured timeout.
    Timeout,

    /// API authentication failed.
    AuthenticationError,

    /// Provider rejected the request parameters.
    InvalidRequest,

    /// Resource not found.
    NotFound,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// Invalid webhook signature or payload.
    InvalidWebhook,

    /// Provider API error.
    ProviderError,
}

impl PaymentErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentErrorCode::NetworkError
                | PaymentErrorCode::Timeout
                | PaymentErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::Timeout => "timeout",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::InvalidRequest => "invalid_request",
            PaymentErrorCode::NotFound => "not_found",
            PaymentErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            PaymentErrorCode::InvalidWebhook => "invalid_webhook",
            PaymentErrorCode::ProviderError => "provider_error",
        };
        write!(f, "{}", s)
    }
}
