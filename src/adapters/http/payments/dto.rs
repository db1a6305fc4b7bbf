//! HTTP DTOs (Data Transfer Objects) for course payment endpoints.
//!
//! Bodies use camelCase field names.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::enrollment::{Enrollment, EnrollmentOutcome, EnrollmentStatus, EnrollmentType};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to start a course checkout.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeCoursePaymentRequest {
    pub course_id: String,
    /// `FULL` or `INSTALLMENT`.
    pub enrollment_type: String,
}

/// Request to confirm a completed payment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmCoursePaymentRequest {
    pub payment_intent_id: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Response for a started checkout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeCoursePaymentResponse {
    /// Secret the browser uses to complete the payment.
    pub client_secret: String,
    /// Amount in major currency units.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
}

/// Enrollment as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentResponse {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub enrollment_type: EnrollmentType,
    pub status: EnrollmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
    /// ISO 8601.
    pub created_at: String,
}

impl From<&Enrollment> for EnrollmentResponse {
    fn from(enrollment: &Enrollment) -> Self {
        Self {
            id: enrollment.id.to_string(),
            user_id: enrollment.user_id.to_string(),
            course_id: enrollment.course_id.to_string(),
            enrollment_type: enrollment.enrollment_type,
            status: enrollment.status,
            payment_intent_id: enrollment.payment_intent_id.clone(),
            created_at: enrollment.created_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Enrollment plus whether it existed before this confirmation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentDetails {
    #[serde(flatten)]
    pub enrollment: EnrollmentResponse,
    pub already_enrolled: bool,
}

impl From<&EnrollmentOutcome> for EnrollmentDetails {
    fn from(outcome: &EnrollmentOutcome) -> Self {
        Self {
            enrollment: EnrollmentResponse::from(outcome.enrollment()),
            already_enrolled: !outcome.was_created(),
        }
    }
}

/// Response for a confirmed payment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmCoursePaymentResponse {
    pub message: String,
    pub enrollment_details: EnrollmentDetails,
}
