//! Retry decorator for payment gateway calls.
//!
//! Wraps any `PaymentGateway` and retries retryable failures of the network
//! calls with exponential backoff. Webhook verification is local and is
//! passed straight through.
//!
//! Creation requests keep their idempotency key across attempts, so a retry
//! after a lost response cannot create a second intent.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::domain::payment::PaymentIntent;
use crate::ports::{CreatePaymentIntentRequest, PaymentError, PaymentGateway, WebhookEvent};

/// How many times to attempt a call and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. At least 1.
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles after each further failure.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Delay after the given failed attempt (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(16))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

/// Payment gateway that retries transient failures of its inner gateway.
pub struct RetryingPaymentGateway {
    inner: Arc<dyn PaymentGateway>,
    policy: RetryPolicy,
}

impl RetryingPaymentGateway {
    pub fn new(inner: Arc<dyn PaymentGateway>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn backoff(&self, operation: &'static str, attempt: u32, err: &PaymentError) {
        let delay = self.policy.delay_for(attempt);
        tracing::warn!(
            operation,
            attempt = attempt + 1,
            max_attempts = self.policy.max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Payment gateway call failed, retrying"
        );
        sleep(delay).await;
    }
}

#[async_trait]
impl PaymentGateway for RetryingPaymentGateway {
    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        let mut attempt = 0;

        loop {
            match self.inner.create_payment_intent(request.clone()).await {
                Ok(intent) => return Ok(intent),
                Err(err) => {
                    if !err.retryable || attempt + 1 >= self.policy.max_attempts {
                        return Err(err);
                    }
                    self.backoff("create_payment_intent", attempt, &err).await;
                }
            }
            attempt += 1;
        }
    }

    async fn retrieve_payment_intent(
        &self,
        intent_id: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        let mut attempt = 0;

        loop {
            match self.inner.retrieve_payment_intent(intent_id).await {
                Ok(intent) => return Ok(intent),
                Err(err) => {
                    if !err.retryable || attempt + 1 >= self.policy.max_attempts {
                        return Err(err);
                    }
                    self.backoff("retrieve_payment_intent", attempt, &err).await;
                }
            }
            attempt += 1;
        }
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, PaymentError> {
        self.inner.verify_webhook(payload, signature)
    }

    fn parse_webhook(&self, payload: &[u8]) -> Result<WebhookEvent, PaymentError> {
        self.inner.parse_webhook(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::stripe::MockPaymentGateway;
    use crate::domain::enrollment::EnrollmentType;
    use crate::domain::foundation::{CourseId, UserId};
    use crate::domain::payment::IntentMetadata;
    use crate::ports::PaymentErrorCode;

    fn request() -> CreatePaymentIntentRequest {
        CreatePaymentIntentRequest {
            amount_minor: 11000,
            currency: "usd".to_string(),
            metadata: IntentMetadata::new(
                UserId::new("user-1").unwrap(),
                CourseId::new("course-1").unwrap(),
                EnrollmentType::Installment,
            ),
            description: None,
            idempotency_key: "checkout-abc".to_string(),
        }
    }

    fn retrying(mock: &MockPaymentGateway, attempts: u32) -> RetryingPaymentGateway {
        RetryingPaymentGateway::new(
            Arc::new(mock.clone()),
            RetryPolicy::new(attempts, Duration::ZERO),
        )
    }

    #[test]
    fn delay_doubles_per_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_millis(500));
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
    }

    #[test]
    fn policy_always_allows_one_attempt() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
        assert_eq!(RetryPolicy::none().max_attempts, 1);
    }

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let mock = MockPaymentGateway::new();
        mock.push_error(PaymentError::network("connection reset"));
        mock.push_error(PaymentError::timeout("timed out"));

        let gateway = retrying(&mock, 3);
        let intent = gateway.create_payment_intent(request()).await.unwrap();

        assert_eq!(intent.amount_minor, 11000);
        assert_eq!(mock.call_count("create_payment_intent"), 3);
    }

    #[tokio::test]
    async fn retries_reuse_idempotency_key() {
        let mock = MockPaymentGateway::new();
        mock.push_error(PaymentError::provider_unavailable("503"));

        retrying(&mock, 3)
            .create_payment_intent(request())
            .await
            .unwrap();

        let keys: Vec<String> = mock
            .calls()
            .into_iter()
            .filter(|c| c.method == "create_payment_intent")
            .map(|c| c.args[2].clone())
            .collect();
        assert_eq!(keys, vec!["checkout-abc", "checkout-abc"]);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let mock = MockPaymentGateway::new();
        mock.set_method_error(
            "retrieve_payment_intent",
            PaymentError::rate_limited("slow down"),
        );

        let err = retrying(&mock, 3)
            .retrieve_payment_intent("pi_1")
            .await
            .unwrap_err();

        assert_eq!(err.code, PaymentErrorCode::RateLimitExceeded);
        assert_eq!(mock.call_count("retrieve_payment_intent"), 3);
    }

    #[tokio::test]
    async fn does_not_retry_permanent_failures() {
        let mock = MockPaymentGateway::new();

        let err = retrying(&mock, 3)
            .retrieve_payment_intent("pi_missing")
            .await
            .unwrap_err();

        assert_eq!(err.code, PaymentErrorCode::NotFound);
        assert_eq!(mock.call_count("retrieve_payment_intent"), 1);
    }
}
