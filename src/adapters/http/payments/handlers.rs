//! HTTP handlers for course payment endpoints.
//!
//! These handlers connect Axum routes to the payment application handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::RequireAuth;
use crate::application::handlers::payment::{
    ConfirmCoursePaymentCommand, CreateCoursePaymentCommand, GetEnrollmentHandler,
    GetEnrollmentQuery, PaymentService, WebhookDispatcher,
};
use crate::domain::enrollment::EnrollmentError;
use crate::domain::payment::PaymentResult;
use crate::ports::EnrollmentRepository;

use super::dto::{
    ConfirmCoursePaymentRequest, ConfirmCoursePaymentResponse, EnrollmentDetails,
    EnrollmentResponse, InitializeCoursePaymentRequest, InitializeCoursePaymentResponse,
};

/// Header carrying the provider's webhook signature.
pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

pub const PAYMENT_CONFIRMED_MESSAGE: &str = "Payment confirmed and enrollment created";
pub const WEBHOOK_RECEIVED: &str = "Webhook received";
pub const WEBHOOK_ERROR: &str = "Webhook error";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the payment endpoints.
#[derive(Clone)]
pub struct PaymentsAppState {
    pub payment_service: Arc<PaymentService>,
    pub webhook_dispatcher: Arc<WebhookDispatcher>,
    pub enrollment_repository: Arc<dyn EnrollmentRepository>,
    /// Include internal error detail in 500 responses (non-production only).
    pub expose_error_details: bool,
}

impl PaymentsAppState {
    pub fn get_enrollment_handler(&self) -> GetEnrollmentHandler {
        GetEnrollmentHandler::new(self.enrollment_repository.clone())
    }

    fn result_error(&self, result: &PaymentResult) -> ApiError {
        let message = result
            .error_message
            .clone()
            .unwrap_or_else(|| "Payment failed".to_string());

        if result.is_internal_failure() {
            return ApiError::internal(message, self.expose_error_details);
        }

        let code = result
            .error_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "PAYMENT_FAILED".to_string());
        ApiError::bad_request(code, message)
    }

    fn enrollment_error(&self, err: EnrollmentError) -> ApiError {
        match err {
            EnrollmentError::Infrastructure(_) => {
                ApiError::internal(err.message(), self.expose_error_details)
            }
            other => ApiError::bad_request(other.code().to_string(), other.message()),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/payments/course/initialize - Start a course checkout
pub async fn initialize_course_payment(
    State(state): State<PaymentsAppState>,
    RequireAuth(user): RequireAuth,
    payload: Result<Json<InitializeCoursePaymentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;

    let result = state
        .payment_service
        .create_course_payment(CreateCoursePaymentCommand {
            user_id: user.id,
            course_id: request.course_id,
            enrollment_type: request.enrollment_type,
        })
        .await;

    if !result.success {
        return Err(state.result_error(&result));
    }

    let (Some(client_secret), Some(amount), Some(currency)) =
        (result.client_secret, result.amount, result.currency)
    else {
        return Err(ApiError::internal(
            "Payment intent response is incomplete",
            state.expose_error_details,
        ));
    };

    Ok((
        StatusCode::CREATED,
        Json(InitializeCoursePaymentResponse {
            client_secret,
            amount,
            currency,
        }),
    ))
}

/// POST /api/payments/course/confirm - Confirm a payment and enroll
pub async fn confirm_course_payment(
    State(state): State<PaymentsAppState>,
    RequireAuth(user): RequireAuth,
    payload: Result<Json<ConfirmCoursePaymentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;

    let result = state
        .payment_service
        .confirm_course_payment(ConfirmCoursePaymentCommand {
            user_id: user.id,
            payment_intent_id: request.payment_intent_id,
        })
        .await;

    if !result.success {
        return Err(state.result_error(&result));
    }

    let outcome = result.enrollment.as_ref().ok_or_else(|| {
        ApiError::internal(
            "Confirmed payment has no enrollment",
            state.expose_error_details,
        )
    })?;

    Ok(Json(ConfirmCoursePaymentResponse {
        message: PAYMENT_CONFIRMED_MESSAGE.to_string(),
        enrollment_details: EnrollmentDetails::from(outcome),
    }))
}

/// GET /api/payments/course/:course_id/enrollment - Caller's enrollment
pub async fn get_course_enrollment(
    State(state): State<PaymentsAppState>,
    RequireAuth(user): RequireAuth,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.get_enrollment_handler();
    let query = GetEnrollmentQuery {
        user_id: user.id,
        course_id,
    };

    let enrollment = handler
        .handle(query)
        .await
        .map_err(|e| state.enrollment_error(e))?
        .ok_or_else(|| ApiError::not_found("ENROLLMENT_NOT_FOUND", "Enrollment not found"))?;

    Ok(Json(EnrollmentResponse::from(&enrollment)))
}

/// POST /api/payments/webhook - Handle provider webhooks
///
/// Unauthenticated; the dispatcher checks the signature in production.
pub async fn handle_payment_webhook(
    State(state): State<PaymentsAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let receipt = state.webhook_dispatcher.handle(&body, signature).await;

    if receipt.received {
        (StatusCode::OK, WEBHOOK_RECEIVED)
    } else {
        (StatusCode::BAD_REQUEST, WEBHOOK_ERROR)
    }
}
