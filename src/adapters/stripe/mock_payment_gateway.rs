//! Mock payment gateway for testing.
//!
//! Provides a configurable in-memory implementation of `PaymentGateway` for
//! unit and integration tests. Supports:
//! - Stored intents with status changes
//! - Error injection (one-shot queue or per-method)
//! - Call tracking
//! - Webhook verification modes

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::payment::{PaymentIntent, PaymentIntentStatus};
use crate::ports::{CreatePaymentIntentRequest, PaymentError, PaymentGateway, WebhookEvent};

use super::webhook_types::StripeWebhookEvent;

/// Mock payment gateway for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentGateway::new();
///
/// // Seed an intent the service will retrieve
/// mock.insert_intent(intent);
///
/// // Fail the next call once
/// mock.push_error(PaymentError::network("reset"));
/// ```
#[derive(Default, Clone)]
pub struct MockPaymentGateway {
    /// Inner state (thread-safe for async tests).
    inner: Arc<Mutex<MockState>>,
}

/// Internal mutable state.
#[derive(Default)]
struct MockState {
    /// Intents by ID.
    intents: HashMap<String, PaymentIntent>,

    /// Idempotency key to intent ID.
    idempotency_keys: HashMap<String, String>,

    /// Counter for generated intent IDs.
    next_id: u64,

    /// Errors returned by the next API calls, in order.
    queued_errors: VecDeque<PaymentError>,

    /// Specific errors by method name, returned on every call.
    method_errors: HashMap<String, PaymentError>,

    /// Track method calls for assertions.
    call_log: Vec<MethodCall>,

    /// Webhook verification behavior.
    webhook_verify_mode: WebhookVerifyMode,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

/// How to handle webhook verification.
#[derive(Default, Clone)]
enum WebhookVerifyMode {
    /// Accept any signature and parse the payload.
    #[default]
    AcceptAll,

    /// Accept only this exact signature header.
    RequireSignature(String),

    /// Always fail verification.
    AlwaysFail,
}

impl MockPaymentGateway {
    /// Create a new mock gateway with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that fails all webhook verifications.
    pub fn rejecting_webhooks() -> Self {
        let mock = Self::new();
        mock.state().webhook_verify_mode = WebhookVerifyMode::AlwaysFail;
        mock
    }

    /// Create a mock that accepts only the given signature header.
    pub fn requiring_signature(signature: impl Into<String>) -> Self {
        let mock = Self::new();
        mock.state().webhook_verify_mode = WebhookVerifyMode::RequireSignature(signature.into());
        mock
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.inner.lock().unwrap()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Store an intent for later retrieval.
    pub fn insert_intent(&self, intent: PaymentIntent) {
        self.state().intents.insert(intent.id.clone(), intent);
    }

    /// Change the status of a stored intent, as if the customer paid.
    pub fn set_intent_status(&self, intent_id: &str, status: PaymentIntentStatus) {
        if let Some(intent) = self.state().intents.get_mut(intent_id) {
            intent.status = status;
        }
    }

    /// Return `error` from the next API call only.
    pub fn push_error(&self, error: PaymentError) {
        self.state().queued_errors.push_back(error);
    }

    /// Return `error` from every call to `method`.
    pub fn set_method_error(&self, method: &str, error: PaymentError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    /// Clear all configured errors.
    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.queued_errors.clear();
        state.method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Assertion Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Get all recorded method calls.
    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    /// Count calls to a specific method.
    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Get a stored intent.
    pub fn intent(&self, intent_id: &str) -> Option<PaymentIntent> {
        self.state().intents.get(intent_id).cloned()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.state().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), PaymentError> {
        let mut state = self.state();

        if let Some(err) = state.method_errors.get(method) {
            return Err(err.clone());
        }

        match state.queued_errors.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn parse_payload(payload: &[u8]) -> Result<WebhookEvent, PaymentError> {
        let event: StripeWebhookEvent = serde_json::from_slice(payload)
            .map_err(|e| PaymentError::invalid_webhook(format!("Invalid JSON: {}", e)))?;
        event.into_webhook_event()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        self.record_call(
            "create_payment_intent",
            vec![
                request.amount_minor.to_string(),
                request.currency.clone(),
                request.idempotency_key.clone(),
            ],
        );
        self.check_error("create_payment_intent")?;

        let mut state = self.state();

        // Stripe replays the original response for a repeated key
        if let Some(existing) = state
            .idempotency_keys
            .get(&request.idempotency_key)
            .and_then(|id| state.intents.get(id))
        {
            return Ok(existing.clone());
        }

        state.next_id += 1;
        let id = format!("pi_mock_{}", state.next_id);

        let intent = PaymentIntent {
            id: id.clone(),
            amount_minor: request.amount_minor,
            currency: request.currency,
            status: PaymentIntentStatus::RequiresPayment,
            client_secret: Some(format!("{}_secret_mock", id)),
            metadata: request.metadata.to_map(),
        };

        state
            .idempotency_keys
            .insert(request.idempotency_key, id.clone());
        state.intents.insert(id, intent.clone());

        Ok(intent)
    }

    async fn retrieve_payment_intent(
        &self,
        intent_id: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        self.record_call("retrieve_payment_intent", vec![intent_id.to_string()]);
        self.check_error("retrieve_payment_intent")?;

        self.state()
            .intents
            .get(intent_id)
            .cloned()
            .ok_or_else(|| PaymentError::not_found("Payment intent"))
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, PaymentError> {
        self.record_call("verify_webhook", vec![signature.to_string()]);

        let mode = self.state().webhook_verify_mode.clone();
        match mode {
            WebhookVerifyMode::AcceptAll => {}
            WebhookVerifyMode::RequireSignature(expected) if expected == signature => {}
            WebhookVerifyMode::RequireSignature(_) | WebhookVerifyMode::AlwaysFail => {
                return Err(PaymentError::invalid_webhook("Invalid signature"));
            }
        }

        Self::parse_payload(payload)
    }

    fn parse_webhook(&self, payload: &[u8]) -> Result<WebhookEvent, PaymentError> {
        self.record_call("parse_webhook", vec![]);
        Self::parse_payload(payload)
    }
}
