//! WebhookDispatcher - handles asynchronous payment provider callbacks.
//!
//! Signature verification runs first and only when `verify_signatures` is
//! set (production). A rejected signature never reaches the enrollment
//! store.

use std::sync::Arc;

use crate::domain::enrollment::EnrollmentOutcome;
use crate::domain::payment::{IntentMetadata, WebhookError, COURSE_ID_KEY, USER_ID_KEY};
use crate::ports::{PaymentGateway, WebhookEvent, WebhookEventData, WebhookEventType};

use super::enrollment_creator::{EnrollmentCreator, EnrollmentRequest};

/// Acknowledgement returned to the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookReceipt {
    pub received: bool,
    /// Provider event id, once the payload was parsed.
    pub event_id: Option<String>,
    pub error: Option<WebhookError>,
}

impl WebhookReceipt {
    fn received(event_id: String) -> Self {
        Self {
            received: true,
            event_id: Some(event_id),
            error: None,
        }
    }

    fn rejected(event_id: Option<String>, error: WebhookError) -> Self {
        Self {
            received: false,
            event_id,
            error: Some(error),
        }
    }
}

/// Dispatches provider events by type.
///
/// | Event | Action |
/// |-------|--------|
/// | `payment_intent.succeeded` | idempotent enrollment |
/// | `payment_intent.payment_failed` | log |
/// | `charge.refunded` | log |
/// | anything else | log and ignore |
pub struct WebhookDispatcher {
    gateway: Arc<dyn PaymentGateway>,
    enrollments: Arc<EnrollmentCreator>,
    verify_signatures: bool,
}

impl WebhookDispatcher {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        enrollments: Arc<EnrollmentCreator>,
        verify_signatures: bool,
    ) -> Self {
        Self {
            gateway,
            enrollments,
            verify_signatures,
        }
    }

    pub async fn handle(&self, payload: &[u8], signature: Option<&str>) -> WebhookReceipt {
        // 1. Authenticate and parse
        let event = match self.read_event(payload, signature) {
            Ok(event) => event,
            Err(err) => {
                if err.is_signature_failure() {
                    tracing::warn!(error = %err, "Webhook signature rejected");
                } else {
                    tracing::warn!(error = %err, "Webhook payload rejected");
                }
                return WebhookReceipt::rejected(None, err);
            }
        };

        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            "Webhook event received"
        );

        // 2. Dispatch
        match self.dispatch(&event).await {
            Ok(()) => WebhookReceipt::received(event.id),
            Err(err) => {
                tracing::error!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    error = %err,
                    retryable = err.is_retryable(),
                    "Webhook processing failed"
                );
                WebhookReceipt::rejected(Some(event.id), err)
            }
        }
    }

    fn read_event(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookEvent, WebhookError> {
        if self.verify_signatures {
            let signature = signature.ok_or_else(|| {
                WebhookError::SignatureVerification("Missing stripe-signature header".to_string())
            })?;
            return self
                .gateway
                .verify_webhook(payload, signature)
                .map_err(|e| WebhookError::SignatureVerification(e.message));
        }

        tracing::warn!("Webhook signature verification skipped outside production");
        self.gateway
            .parse_webhook(payload)
            .map_err(|e| WebhookError::MalformedPayload(e.message))
    }

    async fn dispatch(&self, event: &WebhookEvent) -> Result<(), WebhookError> {
        match &event.event_type {
            WebhookEventType::PaymentIntentSucceeded => self.handle_succeeded(event).await,
            WebhookEventType::PaymentIntentPaymentFailed => {
                self.handle_payment_failed(event);
                Ok(())
            }
            WebhookEventType::ChargeRefunded => {
                self.handle_refunded(event);
                Ok(())
            }
            WebhookEventType::Unknown(event_type) => {
                tracing::info!(
                    event_id = %event.id,
                    event_type = %event_type,
                    "Unhandled webhook event type, ignoring"
                );
                Ok(())
            }
        }
    }

    async fn handle_succeeded(&self, event: &WebhookEvent) -> Result<(), WebhookError> {
        let intent = match &event.data {
            WebhookEventData::PaymentIntent { intent, .. } => intent,
            _ => {
                return Err(WebhookError::MalformedPayload(
                    "Unexpected data for payment_intent.succeeded".to_string(),
                ))
            }
        };

        let metadata = IntentMetadata::from_map(&intent.metadata)?;

        let outcome = self
            .enrollments
            .ensure_enrolled(EnrollmentRequest {
                user_id: metadata.user_id,
                course_id: metadata.course_id,
                enrollment_type: metadata.enrollment_type,
                payment_intent_id: Some(intent.id.clone()),
            })
            .await
            .map_err(|e| WebhookError::Enrollment(e.message()))?;

        match outcome {
            EnrollmentOutcome::Created(enrollment) => tracing::info!(
                event_id = %event.id,
                payment_intent_id = %intent.id,
                enrollment_id = %enrollment.id,
                "Enrollment created from webhook"
            ),
            EnrollmentOutcome::AlreadyEnrolled(enrollment) => tracing::info!(
                event_id = %event.id,
                payment_intent_id = %intent.id,
                enrollment_id = %enrollment.id,
                "Webhook for existing enrollment acknowledged"
            ),
        }

        Ok(())
    }

    fn handle_payment_failed(&self, event: &WebhookEvent) {
        if let WebhookEventData::PaymentIntent {
            intent,
            failure_message,
        } = &event.data
        {
            tracing::warn!(
                event_id = %event.id,
                payment_intent_id = %intent.id,
                user_id = ?intent.metadata.get(USER_ID_KEY),
                course_id = ?intent.metadata.get(COURSE_ID_KEY),
                failure = failure_message.as_deref().unwrap_or("unknown"),
                "Course payment failed"
            );
        }
    }

    fn handle_refunded(&self, event: &WebhookEvent) {
        // Enrollments are not revoked on refund.
        if let WebhookEventData::Charge {
            charge_id,
            payment_intent_id,
            amount_refunded,
            currency,
        } = &event.data
        {
            tracing::info!(
                event_id = %event.id,
                charge_id = %charge_id,
                payment_intent_id = ?payment_intent_id,
                amount_refunded,
                currency = %currency,
                "Charge refunded"
            );
        }
    }
}
