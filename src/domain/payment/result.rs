//! Outcome of a checkout operation.

use rust_decimal::Decimal;

use crate::domain::course::pricing::from_minor_units;
use crate::domain::enrollment::EnrollmentOutcome;
use crate::domain::foundation::ErrorCode;

use super::{PaymentIntent, PaymentIntentStatus};

/// Result returned by the payment service.
///
/// Checkout operations never fail with `Err`; failures are reported with
/// `success == false` and an `error_message` safe to show to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentResult {
    pub success: bool,
    pub payment_intent_id: Option<String>,
    pub client_secret: Option<String>,
    /// Amount in major currency units.
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub status: Option<PaymentIntentStatus>,
    /// Set by confirmation once an enrollment exists.
    pub enrollment: Option<EnrollmentOutcome>,
    pub error_message: Option<String>,
    /// Classification of the failure, when known.
    pub error_code: Option<ErrorCode>,
}

impl PaymentResult {
    /// Successful result describing an intent.
    pub fn from_intent(intent: &PaymentIntent) -> Self {
        Self {
            success: true,
            payment_intent_id: Some(intent.id.clone()),
            client_secret: intent.client_secret.clone(),
            amount: Some(from_minor_units(intent.amount_minor)),
            currency: Some(intent.currency.clone()),
            status: Some(intent.status),
            enrollment: None,
            error_message: None,
            error_code: None,
        }
    }

    /// Failed result with no intent information.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            payment_intent_id: None,
            client_secret: None,
            amount: None,
            currency: None,
            status: None,
            enrollment: None,
            error_message: Some(message.into()),
            error_code: None,
        }
    }

    /// Failed result that still reports the intent it concerns.
    pub fn failure_for_intent(intent: &PaymentIntent, message: impl Into<String>) -> Self {
        Self {
            success: false,
            client_secret: None,
            error_message: Some(message.into()),
            ..Self::from_intent(intent)
        }
    }

    pub fn with_enrollment(mut self, outcome: EnrollmentOutcome) -> Self {
        self.enrollment = Some(outcome);
        self
    }

    pub fn with_error_code(mut self, code: ErrorCode) -> Self {
        self.error_code = Some(code);
        self
    }

    /// True when the failure came from our own infrastructure rather than
    /// from the request or the provider.
    pub fn is_internal_failure(&self) -> bool {
        matches!(
            self.error_code,
            Some(ErrorCode::DatabaseError | ErrorCode::InternalError)
        )
    }
}
