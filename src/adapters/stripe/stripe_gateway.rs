//! Stripe payment gateway adapter.
//!
//! Implements the `PaymentGateway` trait against the Stripe REST API:
//! PaymentIntent creation and retrieval, and webhook verification.
//!
//! # Security
//!
//! - HMAC-SHA256 signature verification with constant-time comparison
//! - Timestamp validation (5-minute window) for replay attack prevention
//! - Secrets handled via `secrecy::SecretString`
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key).with_webhook_secret(webhook_secret);
//! let gateway = StripePaymentGateway::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::domain::payment::PaymentIntent;
use crate::ports::{
    CreatePaymentIntentRequest, PaymentError, PaymentErrorCode, PaymentGateway, WebhookEvent,
};

use super::webhook_types::{
    SignatureHeader, StripeErrorResponse, StripePaymentIntent, StripeWebhookEvent,
};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age for webhook events (5 minutes).
const MAX_TIMESTAMP_AGE_SECS: i64 = 300;

/// Clock skew tolerance for future timestamps (60 seconds).
const MAX_FUTURE_TOLERANCE_SECS: i64 = 60;

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Webhook signing secret (whsec_...). Required to verify deliveries.
    webhook_secret: Option<SecretString>,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,

    /// Per-request timeout.
    timeout: Duration,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            webhook_secret: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Set the webhook signing secret.
    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_secret = Some(SecretString::new(secret.into()));
        self
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Stripe payment gateway.
pub struct StripePaymentGateway {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripePaymentGateway {
    /// Create a new Stripe gateway with the given configuration.
    pub fn new(config: StripeConfig) -> Result<Self, PaymentError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn payment_intents_url(&self) -> String {
        format!("{}/v1/payment_intents", self.config.api_base_url)
    }

    /// URL of a single intent. The id is pushed as one escaped path segment.
    fn payment_intent_url(&self, intent_id: &str) -> Result<reqwest::Url, PaymentError> {
        let mut url = reqwest::Url::parse(&self.payment_intents_url())
            .map_err(|e| PaymentError::invalid_request(format!("Invalid Stripe API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| PaymentError::invalid_request("Stripe API URL cannot hold a path"))?
            .push(intent_id);
        Ok(url)
    }

    /// Maps a reqwest transport error to a payment error.
    fn transport_error(err: reqwest::Error) -> PaymentError {
        if err.is_timeout() {
            PaymentError::timeout(format!("Stripe request timed out: {}", err))
        } else if err.is_connect() {
            PaymentError::network(format!("Connection failed: {}", err))
        } else {
            PaymentError::network(err.to_string())
        }
    }

    /// Classifies a non-2xx Stripe response.
    fn error_for_status(status: StatusCode, body: &str) -> PaymentError {
        let api_error = serde_json::from_str::<StripeErrorResponse>(body)
            .ok()
            .map(|r| r.error);
        let message = api_error
            .as_ref()
            .and_then(|e| e.message.clone())
            .unwrap_or_else(|| format!("Stripe API error {}", status));

        let err = match status.as_u16() {
            401 => PaymentError::authentication(message),
            404 => PaymentError::new(PaymentErrorCode::NotFound, message),
            429 => PaymentError::rate_limited(message),
            500..=599 => PaymentError::provider_unavailable(message),
            400..=499 => PaymentError::invalid_request(message),
            _ => PaymentError::new(PaymentErrorCode::ProviderError, message),
        };

        match api_error.and_then(|e| e.code) {
            Some(code) => err.with_provider_code(code),
            None => err,
        }
    }

    /// Reads a PaymentIntent from a Stripe response.
    async fn read_intent(response: reqwest::Response) -> Result<PaymentIntent, PaymentError> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let err = Self::error_for_status(status, &error_text);
            tracing::error!(
                status = %status,
                code = %err.code,
                provider_code = ?err.provider_code,
                "Stripe payment intent request failed"
            );
            return Err(err);
        }

        let stripe_intent: StripePaymentIntent = response.json().await.map_err(|e| {
            PaymentError::new(
                PaymentErrorCode::ProviderError,
                format!("Failed to parse Stripe response: {}", e),
            )
        })?;

        Ok(stripe_intent.into())
    }

    /// Verify webhook signature using HMAC-SHA256.
    ///
    /// # Security
    ///
    /// - Uses constant-time comparison to prevent timing attacks
    /// - Validates timestamp to prevent replay attacks
    fn verify_signature(
        &self,
        secret: &SecretString,
        payload: &[u8],
        header: &SignatureHeader,
    ) -> Result<(), PaymentError> {
        // 1. Validate timestamp (prevent replay attacks)
        let now = chrono::Utc::now().timestamp();
        let age = now
            .checked_sub(header.timestamp)
            .ok_or_else(|| PaymentError::invalid_webhook("Invalid timestamp"))?;

        if age > MAX_TIMESTAMP_AGE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                age_secs = age,
                "Webhook event too old - possible replay attack"
            );
            return Err(PaymentError::invalid_webhook(format!(
                "Event too old ({} seconds)",
                age
            )));
        }

        if age < -MAX_FUTURE_TOLERANCE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                "Webhook event from future - clock skew or manipulation"
            );
            return Err(PaymentError::invalid_webhook("Event timestamp in future"));
        }

        // 2. Compute expected signature over "{t}.{payload}"
        let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
            .map_err(|e| PaymentError::invalid_webhook(format!("Unusable webhook secret: {}", e)))?;

        mac.update(header.timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        let expected = mac.finalize().into_bytes();

        // 3. Constant-time comparison against every v1 entry
        let expected_bytes: &[u8] = expected.as_slice();
        let matched = header
            .v1_signatures
            .iter()
            .any(|provided| expected_bytes.ct_eq(provided.as_slice()).unwrap_u8() == 1);

        if !matched {
            tracing::warn!(
                signatures = header.v1_signatures.len(),
                "Invalid webhook signature"
            );
            return Err(PaymentError::invalid_webhook("Invalid signature"));
        }

        Ok(())
    }

    /// Parse a Stripe event and convert to domain types.
    fn parse_event(&self, payload: &[u8]) -> Result<WebhookEvent, PaymentError> {
        let stripe_event: StripeWebhookEvent = serde_json::from_slice(payload).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse webhook payload");
            PaymentError::invalid_webhook(format!("Invalid JSON: {}", e))
        })?;

        stripe_event.into_webhook_event()
    }
}

/// Stripe object ids are `prefix_` plus alphanumerics.
fn is_valid_intent_id(intent_id: &str) -> bool {
    intent_id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

#[async_trait]
impl PaymentGateway for StripePaymentGateway {
    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        let mut params = vec![
            ("amount".to_string(), request.amount_minor.to_string()),
            ("currency".to_string(), request.currency.clone()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];

        for (key, value) in request.metadata.to_pairs() {
            params.push((format!("metadata[{}]", key), value));
        }

        if let Some(description) = &request.description {
            params.push(("description".to_string(), description.clone()));
        }

        let response = self
            .http_client
            .post(self.payment_intents_url())
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .header("Idempotency-Key", &request.idempotency_key)
            .form(&params)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let intent = Self::read_intent(response).await?;

        tracing::info!(
            payment_intent_id = %intent.id,
            amount_minor = intent.amount_minor,
            currency = %intent.currency,
            "Stripe payment intent created"
        );

        Ok(intent)
    }

    async fn retrieve_payment_intent(
        &self,
        intent_id: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        if intent_id.trim().is_empty() {
            return Err(PaymentError::invalid_request("Payment intent id is empty"));
        }
        if !is_valid_intent_id(intent_id) {
            tracing::warn!(payment_intent_id = %intent_id, "Rejected malformed payment intent id");
            return Err(PaymentError::invalid_request("Payment intent id is malformed"));
        }

        let url = self.payment_intent_url(intent_id)?;

        let response = self
            .http_client
            .get(url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::read_intent(response).await
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, PaymentError> {
        let secret = self
            .config
            .webhook_secret
            .as_ref()
            .ok_or_else(|| PaymentError::invalid_webhook("Webhook secret not configured"))?;

        // 1. Parse signature header
        let header = SignatureHeader::parse(signature).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse Stripe-Signature header");
            PaymentError::invalid_webhook(e.to_string())
        })?;

        // 2. Verify signature (includes timestamp validation)
        self.verify_signature(secret, payload, &header)?;

        // 3. Parse and convert event
        let webhook_event = self.parse_event(payload)?;

        tracing::info!(
            event_id = %webhook_event.id,
            event_type = %webhook_event.event_type,
            "Webhook signature verified"
        );

        Ok(webhook_event)
    }

    fn parse_webhook(&self, payload: &[u8]) -> Result<WebhookEvent, PaymentError> {
        self.parse_event(payload)
    }
}
