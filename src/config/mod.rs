//! Application configuration module
//!
//! Configuration is loaded from environment variables using the `config` and
//! `dotenvy` crates. Variables carry the `COURSE_PAYMENTS` prefix and nested
//! values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use course_payments::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod database;
mod error;
mod payment;
mod server;

pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Enrollment store (PostgreSQL)
    pub database: DatabaseConfig,

    /// Payment provider (Stripe)
    pub payment: PaymentConfig,

    /// Bearer token verification
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Reads `.env` if present, then every variable with the
    /// `COURSE_PAYMENTS` prefix:
    ///
    /// - `COURSE_PAYMENTS__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `COURSE_PAYMENTS__PAYMENT__STRIPE_SECRET_KEY=...` -> `payment.stripe_secret_key`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("COURSE_PAYMENTS")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Production additionally requires a webhook signing secret and a
    /// full-length JWT secret. Provider retries must finish inside the
    /// server request timeout.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let environment = self.server.environment;
        self.server.validate()?;
        self.database.validate()?;
        self.payment.validate(&environment)?;
        self.auth.validate(&environment)?;

        if self.payment.worst_case_call_duration() >= self.server.request_timeout() {
            return Err(ValidationError::RetryBudgetExceedsRequestTimeout);
        }
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[(&str, &str)] = &[
        ("COURSE_PAYMENTS__DATABASE__URL", "postgresql://test@localhost/courses"),
        ("COURSE_PAYMENTS__PAYMENT__STRIPE_SECRET_KEY", "sk_test_xxx"),
        ("COURSE_PAYMENTS__AUTH__JWT_SECRET", "dev-secret"),
    ];

    fn set_minimal_env() {
        for (key, value) in VARS {
            env::set_var(key, value);
        }
    }

    fn clear_env() {
        for (key, _) in VARS {
            env::remove_var(key);
        }
        env::remove_var("COURSE_PAYMENTS__SERVER__PORT");
        env::remove_var("COURSE_PAYMENTS__SERVER__ENVIRONMENT");
        env::remove_var("COURSE_PAYMENTS__PAYMENT__STRIPE_WEBHOOK_SECRET");
        env::remove_var("COURSE_PAYMENTS__PAYMENT__REQUEST_TIMEOUT_SECS");
        env::remove_var("COURSE_PAYMENTS__SERVER__REQUEST_TIMEOUT_SECS");
    }

    fn load_with(extra: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        for (key, value) in extra {
            env::set_var(key, value);
        }
        let result = AppConfig::load();
        clear_env();
        result
    }

    #[test]
    fn test_load_from_environment() {
        let config = load_with(&[]).unwrap();

        assert_eq!(config.database.url, "postgresql://test@localhost/courses");
        assert_eq!(config.payment.stripe_secret_key.expose_secret(), "sk_test_xxx");
        assert_eq!(config.payment.currency, "usd");
        assert!(config.payment.stripe_webhook_secret.is_none());
    }

    #[test]
    fn test_development_config_validates_without_webhook_secret() {
        let config = load_with(&[]).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_server_defaults() {
        let config = load_with(&[]).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
    }

    #[test]
    fn test_custom_server_port() {
        let config = load_with(&[("COURSE_PAYMENTS__SERVER__PORT", "3000")]).unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_production_requires_webhook_secret() {
        let config =
            load_with(&[("COURSE_PAYMENTS__SERVER__ENVIRONMENT", "production")]).unwrap();

        assert!(config.is_production());
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"))
        );
    }

    #[test]
    fn test_default_retry_budget_fits_request_timeout() {
        let config = load_with(&[]).unwrap();
        assert!(config.payment.worst_case_call_duration() < config.server.request_timeout());
    }

    #[test]
    fn test_retry_budget_longer_than_request_timeout_is_rejected() {
        let config = load_with(&[
            ("COURSE_PAYMENTS__PAYMENT__REQUEST_TIMEOUT_SECS", "10"),
            ("COURSE_PAYMENTS__SERVER__REQUEST_TIMEOUT_SECS", "30"),
        ])
        .unwrap();

        assert_eq!(
            config.validate(),
            Err(ValidationError::RetryBudgetExceedsRequestTimeout)
        );
    }

    #[test]
    fn test_missing_stripe_key_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("COURSE_PAYMENTS__DATABASE__URL", "postgresql://test@localhost/courses");
        env::set_var("COURSE_PAYMENTS__AUTH__JWT_SECRET", "dev-secret");
        let result = AppConfig::load();
        clear_env();

        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
