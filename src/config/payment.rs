//! Payment configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

/// Payment provider configuration (Stripe)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe secret API key (sk_test_... or sk_live_...)
    pub stripe_secret_key: SecretString,

    /// Webhook signing secret (whsec_...); required in production
    #[serde(default)]
    pub stripe_webhook_secret: Option<SecretString>,

    /// Currency for course checkouts
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Stripe API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Per-request timeout for provider calls, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Attempts per provider call, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before the first retry, in milliseconds
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,
}

impl PaymentConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_secret_key.expose_secret().starts_with("sk_test_")
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.stripe_secret_key.expose_secret().starts_with("sk_live_")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    /// Longest a single provider call can take with every retry spent:
    /// each attempt hits the client timeout, and the backoff doubles from
    /// `retry_base_delay` between attempts.
    pub fn worst_case_call_duration(&self) -> Duration {
        let attempts = self.max_attempts.max(1);
        let backoff_units = (1u32 << (attempts - 1).min(16)) - 1;
        self.request_timeout()
            .saturating_mul(attempts)
            .saturating_add(self.retry_base_delay().saturating_mul(backoff_units))
    }

    /// Validate payment configuration
    ///
    /// The webhook secret may be omitted outside production, where webhook
    /// payloads are not verified.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        let key = self.stripe_secret_key.expose_secret();
        if key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_SECRET_KEY"));
        }
        if !key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }

        match &self.stripe_webhook_secret {
            Some(secret) if !secret.expose_secret().starts_with("whsec_") => {
                return Err(ValidationError::InvalidStripeWebhookSecret);
            }
            None if *environment == Environment::Production => {
                return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
            }
            _ => {}
        }

        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidCurrency);
        }
        if !self.api_base_url.starts_with("https://") && !self.api_base_url.starts_with("http://") {
            return Err(ValidationError::InvalidApiBaseUrl);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.max_attempts == 0 || self.max_attempts > 10 {
            return Err(ValidationError::InvalidRetryPolicy);
        }

        Ok(())
    }
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_api_base_url() -> String {
    "https://api.stripe.com".to_string()
}

fn default_request_timeout() -> u64 {
    8
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay() -> u64 {
    500
}
