//! Course payments API server.
//!
//! Loads configuration from `COURSE_PAYMENTS__*` environment variables,
//! connects to PostgreSQL, wires the Stripe gateway and serves the API until
//! Ctrl+C or SIGTERM.

use std::sync::Arc;

use http::{header, HeaderValue, Method};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use course_payments::adapters::auth::{JwtConfig, JwtSessionValidator};
use course_payments::adapters::http::{build_router, panic_response, AuthState, PaymentsAppState};
use course_payments::adapters::postgres::{PostgresCourseReader, PostgresEnrollmentRepository};
use course_payments::adapters::stripe::{
    RetryPolicy, RetryingPaymentGateway, StripeConfig, StripePaymentGateway,
};
use course_payments::application::{EnrollmentCreator, PaymentService, WebhookDispatcher};
use course_payments::config::{AppConfig, ConfigError, ServerConfig};
use course_payments::ports::{CourseReader, EnrollmentRepository, PaymentGateway};

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Payment gateway setup failed: {0}")]
    Gateway(String),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    config.validate().map_err(ConfigError::from)?;

    init_tracing(&config.server);

    info!(
        environment = ?config.server.environment,
        database = %config.database.redacted_url(),
        stripe_live_mode = config.payment.is_live_mode(),
        "Starting course payments service"
    );

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .idle_timeout(config.database.idle_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let gateway = payment_gateway(&config)?;
    let courses: Arc<dyn CourseReader> = Arc::new(PostgresCourseReader::new(pool.clone()));
    let enrollments: Arc<dyn EnrollmentRepository> =
        Arc::new(PostgresEnrollmentRepository::new(pool));
    let creator = Arc::new(EnrollmentCreator::new(enrollments.clone()));

    let verify_signatures = config.is_production();
    if !verify_signatures {
        warn!("Webhook signatures will not be verified outside production");
    }

    let state = PaymentsAppState {
        payment_service: Arc::new(PaymentService::new(
            courses,
            gateway.clone(),
            creator.clone(),
            config.payment.currency.clone(),
        )),
        webhook_dispatcher: Arc::new(WebhookDispatcher::new(gateway, creator, verify_signatures)),
        enrollment_repository: enrollments,
        expose_error_details: !config.is_production(),
    };

    let mut jwt = JwtConfig::new(config.auth.jwt_secret.expose_secret().to_string());
    if let Some(issuer) = &config.auth.jwt_issuer {
        jwt = jwt.with_issuer(issuer.clone());
    }
    let auth: AuthState = Arc::new(JwtSessionValidator::new(jwt));

    let app = build_router(state, auth)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(cors_layer(&config.server))
        .layer(TraceLayer::new_for_http());

    let address = config.server.socket_addr().map_err(ConfigError::from)?;
    let listener = TcpListener::bind(address).await?;
    info!(%address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// JSON logs in production, human-readable otherwise. `RUST_LOG` wins over
/// the configured filter.
fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    if server.is_production() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn payment_gateway(config: &AppConfig) -> Result<Arc<dyn PaymentGateway>, StartupError> {
    let payment = &config.payment;

    let mut stripe = StripeConfig::new(payment.stripe_secret_key.expose_secret().to_string())
        .with_base_url(payment.api_base_url.clone())
        .with_timeout(payment.request_timeout());
    if let Some(secret) = &payment.stripe_webhook_secret {
        stripe = stripe.with_webhook_secret(secret.expose_secret().to_string());
    }

    let inner = StripePaymentGateway::new(stripe).map_err(|e| StartupError::Gateway(e.message))?;
    let policy = RetryPolicy::new(payment.max_attempts, payment.retry_base_delay());

    Ok(Arc::new(RetryingPaymentGateway::new(Arc::new(inner), policy)))
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.is_empty() && !server.is_production() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
