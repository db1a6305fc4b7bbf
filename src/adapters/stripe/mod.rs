//! Stripe payment gateway adapter.
//!
//! Implements the `PaymentGateway` port for Stripe integration, including:
//! - PaymentIntent creation with idempotency keys
//! - PaymentIntent retrieval
//! - Webhook signature verification
//!
//! # Security
//!
//! - Webhook signatures use HMAC-SHA256 with constant-time comparison
//! - Timestamps are validated to prevent replay attacks (5-minute window)
//! - All secrets are handled via `secrecy::SecretString`
//!
//! Network calls are wrapped by `RetryingPaymentGateway` in the binary.

mod mock_payment_gateway;
mod retry;
mod stripe_gateway;
mod webhook_types;

pub use mock_payment_gateway::{MethodCall, MockPaymentGateway};
pub use retry::{RetryPolicy, RetryingPaymentGateway};
pub use stripe_gateway::{StripeConfig, StripePaymentGateway};
pub use webhook_types::{
    hex_encode, SignatureHeader, SignatureParseError, StripeCharge, StripePaymentIntent,
    StripeWebhookEvent,
};
