//! Enrollment and course-payment error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | CourseNotFound | 400 |
//! | InvalidEnrollmentType | 400 |
//! | PaymentNotCompleted | 400 |
//! | InvalidMetadata | 400 |
//! | NotPaymentOwner | 400 |
//! | PaymentProvider | 400 |
//! | Infrastructure | 500 |
//!
//! The payment endpoints report every failure of the checkout flow as 400;
//! only unexpected failures outside that flow become 500.

use crate::domain::foundation::{CourseId, DomainError, ErrorCode};

/// Errors raised while pricing, confirming, or enrolling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentError {
    /// The referenced course does not exist.
    CourseNotFound(CourseId),

    /// Enrollment type is neither `FULL` nor `INSTALLMENT`.
    InvalidEnrollmentType(String),

    /// Payment intent has not reached the succeeded state.
    PaymentNotCompleted { status: String },

    /// Provider metadata is missing or cannot be decoded.
    InvalidMetadata(String),

    /// Payment intent was created for a different user.
    NotPaymentOwner,

    /// Request input failed validation.
    ValidationFailed { field: String, message: String },

    /// Payment provider call failed.
    PaymentProvider(String),

    /// Store or other infrastructure failure.
    Infrastructure(String),
}

impl EnrollmentError {
    pub fn course_not_found(course_id: CourseId) -> Self {
        EnrollmentError::CourseNotFound(course_id)
    }

    pub fn invalid_enrollment_type(value: impl Into<String>) -> Self {
        EnrollmentError::InvalidEnrollmentType(value.into())
    }

    pub fn payment_not_completed(status: impl Into<String>) -> Self {
        EnrollmentError::PaymentNotCompleted {
            status: status.into(),
        }
    }

    pub fn invalid_metadata(reason: impl Into<String>) -> Self {
        EnrollmentError::InvalidMetadata(reason.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EnrollmentError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn payment_provider(message: impl Into<String>) -> Self {
        EnrollmentError::PaymentProvider(message.into())
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        EnrollmentError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            EnrollmentError::CourseNotFound(_) => ErrorCode::CourseNotFound,
            EnrollmentError::InvalidEnrollmentType(_)
            | EnrollmentError::InvalidMetadata(_)
            | EnrollmentError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            EnrollmentError::PaymentNotCompleted { .. } => ErrorCode::PaymentRequired,
            EnrollmentError::NotPaymentOwner => ErrorCode::Forbidden,
            EnrollmentError::PaymentProvider(_) => ErrorCode::ExternalServiceError,
            EnrollmentError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns the caller-facing message.
    pub fn message(&self) -> String {
        match self {
            EnrollmentError::CourseNotFound(_) => "Course not found".to_string(),
            EnrollmentError::InvalidEnrollmentType(value) => {
                format!("Invalid enrollment type: {}", value)
            }
            EnrollmentError::PaymentNotCompleted { .. } => "Payment not completed".to_string(),
            EnrollmentError::InvalidMetadata(reason) => {
                format!("Invalid payment metadata: {}", reason)
            }
            EnrollmentError::NotPaymentOwner => {
                "Payment does not belong to this user".to_string()
            }
            EnrollmentError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            EnrollmentError::PaymentProvider(msg) => msg.clone(),
            EnrollmentError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Returns true if repeating the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EnrollmentError::Infrastructure(_))
    }
}

impl std::fmt::Display for EnrollmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for EnrollmentError {}

impl From<DomainError> for EnrollmentError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed => EnrollmentError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            ErrorCode::ExternalServiceError => EnrollmentError::PaymentProvider(err.message),
            ErrorCode::CourseNotFound => match err
                .details
                .get("course_id")
                .and_then(|id| CourseId::new(id.as_str()).ok())
            {
                Some(course_id) => EnrollmentError::CourseNotFound(course_id),
                None => EnrollmentError::Infrastructure(err.to_string()),
            },
            _ => EnrollmentError::Infrastructure(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_not_completed_message_is_stable() {
        let err = EnrollmentError::payment_not_completed("requires_payment");
        assert_eq!(err.message(), "Payment not completed");
        assert_eq!(err.code(), ErrorCode::PaymentRequired);
    }

    #[test]
    fn course_not_found_hides_identifier() {
        let err = EnrollmentError::course_not_found(CourseId::new("c-1").unwrap());
        assert_eq!(err.to_string(), "Course not found");
    }

    #[test]
    fn invalid_enrollment_type_names_value() {
        let err = EnrollmentError::invalid_enrollment_type("MONTHLY");
        assert!(err.message().contains("MONTHLY"));
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }

    #[test]
    fn only_infrastructure_is_retryable() {
        assert!(EnrollmentError::infrastructure("pool timeout").is_retryable());
        assert!(!EnrollmentError::payment_provider("declined").is_retryable());
        assert!(!EnrollmentError::NotPaymentOwner.is_retryable());
    }

    #[test]
    fn domain_validation_error_keeps_field() {
        let domain = DomainError::validation("course_id", "Field 'course_id' cannot be empty");
        let err: EnrollmentError = domain.into();
        assert!(matches!(
            err,
            EnrollmentError::ValidationFailed { ref field, .. } if field == "course_id"
        ));
    }

    #[test]
    fn domain_course_not_found_keeps_course() {
        let domain = DomainError::new(ErrorCode::CourseNotFound, "Course not found")
            .with_detail("course_id", "c-9");
        let err: EnrollmentError = domain.into();
        assert_eq!(err, EnrollmentError::CourseNotFound(CourseId::new("c-9").unwrap()));
    }

    #[test]
    fn domain_database_error_becomes_infrastructure() {
        let err: EnrollmentError = DomainError::database("connection reset").into();
        assert!(matches!(err, EnrollmentError::Infrastructure(_)));
    }
}
