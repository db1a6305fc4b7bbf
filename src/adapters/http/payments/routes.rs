//! Axum router configuration for course payment endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::adapters::http::middleware::{auth_middleware, AuthState};

use super::handlers::{
    confirm_course_payment, get_course_enrollment, handle_payment_webhook,
    initialize_course_payment, PaymentsAppState,
};

/// Create the authenticated course payment routes.
///
/// # Routes
/// - `POST /course/initialize` - Start a checkout
/// - `POST /course/confirm` - Confirm a payment and enroll
/// - `GET /course/:course_id/enrollment` - Caller's enrollment in a course
pub fn course_payment_routes(auth: AuthState) -> Router<PaymentsAppState> {
    Router::new()
        .route("/course/initialize", post(initialize_course_payment))
        .route("/course/confirm", post(confirm_course_payment))
        .route("/course/:course_id/enrollment", get(get_course_enrollment))
        .route_layer(middleware::from_fn_with_state(auth, auth_middleware))
}

/// Create the provider webhook router.
///
/// Separate from the course routes because webhooks carry no user token;
/// they are authenticated by signature.
///
/// # Routes
/// - `POST /webhook` - Handle provider webhooks
pub fn webhook_routes() -> Router<PaymentsAppState> {
    Router::new().route("/webhook", post(handle_payment_webhook))
}

/// Create the complete payments router, suitable for mounting at `/api`.
///
/// ```ignore
/// let app = Router::new()
///     .nest("/api", payments_router(auth_state))
///     .with_state(app_state);
/// ```
pub fn payments_router(auth: AuthState) -> Router<PaymentsAppState> {
    Router::new().nest(
        "/payments",
        course_payment_routes(auth).merge(webhook_routes()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::adapters::auth::MockSessionValidator;
    use crate::adapters::memory::{InMemoryCourseReader, InMemoryEnrollmentRepository};
    use crate::adapters::stripe::MockPaymentGateway;
    use crate::application::handlers::payment::{
        EnrollmentCreator, PaymentService, WebhookDispatcher,
    };

    fn test_state() -> PaymentsAppState {
        let repo = Arc::new(InMemoryEnrollmentRepository::new());
        let gateway = Arc::new(MockPaymentGateway::new());
        let creator = Arc::new(EnrollmentCreator::new(repo.clone()));
        PaymentsAppState {
            payment_service: Arc::new(PaymentService::new(
                Arc::new(InMemoryCourseReader::new()),
                gateway.clone(),
                creator.clone(),
                "usd",
            )),
            webhook_dispatcher: Arc::new(WebhookDispatcher::new(gateway, creator, false)),
            enrollment_repository: repo,
            expose_error_details: true,
        }
    }

    fn auth() -> AuthState {
        Arc::new(MockSessionValidator::new())
    }

    #[test]
    fn course_payment_routes_creates_router() {
        let _: Router<()> = course_payment_routes(auth()).with_state(test_state());
    }

    #[test]
    fn webhook_routes_creates_router() {
        let _: Router<()> = webhook_routes().with_state(test_state());
    }

    #[test]
    fn payments_router_creates_combined_router() {
        let _: Router<()> = payments_router(auth()).with_state(test_state());
    }
}
