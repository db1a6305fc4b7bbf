//! PaymentService - course checkout and synchronous confirmation.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::enrollment::{EnrollmentError, EnrollmentOutcome, EnrollmentType};
use crate::domain::foundation::{CourseId, ErrorCode, UserId};
use crate::domain::payment::{IntentMetadata, PaymentIntent, PaymentResult};
use crate::ports::{CourseReader, CreatePaymentIntentRequest, PaymentGateway};

use super::enrollment_creator::{EnrollmentCreator, EnrollmentRequest};

/// Command to start paying for a course.
#[derive(Debug, Clone)]
pub struct CreateCoursePaymentCommand {
    pub user_id: UserId,
    /// Raw course id from the request body.
    pub course_id: String,
    /// Raw enrollment type (`FULL` or `INSTALLMENT`).
    pub enrollment_type: String,
}

/// Command to confirm a finished payment and enroll the caller.
#[derive(Debug, Clone)]
pub struct ConfirmCoursePaymentCommand {
    pub user_id: UserId,
    pub payment_intent_id: String,
}

/// Orchestrates price calculation, intent creation and enrollment.
///
/// Both operations report failures inside `PaymentResult` and never return
/// an error to the caller.
pub struct PaymentService {
    courses: Arc<dyn CourseReader>,
    gateway: Arc<dyn PaymentGateway>,
    enrollments: Arc<EnrollmentCreator>,
    currency: String,
}

impl PaymentService {
    pub fn new(
        courses: Arc<dyn CourseReader>,
        gateway: Arc<dyn PaymentGateway>,
        enrollments: Arc<EnrollmentCreator>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            courses,
            gateway,
            enrollments,
            currency: currency.into().to_lowercase(),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // createCoursePayment
    // ════════════════════════════════════════════════════════════════════════════

    pub async fn create_course_payment(&self, cmd: CreateCoursePaymentCommand) -> PaymentResult {
        let user_id = cmd.user_id.clone();
        let course_id = cmd.course_id.clone();

        match self.try_create(cmd).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(
                    user_id = %user_id,
                    course_id = %course_id,
                    error = %err,
                    "Course payment creation failed"
                );
                PaymentResult::failure(err.message()).with_error_code(err.code())
            }
        }
    }

    async fn try_create(
        &self,
        cmd: CreateCoursePaymentCommand,
    ) -> Result<PaymentResult, EnrollmentError> {
        // 1. Validate input
        let enrollment_type: EnrollmentType = cmd.enrollment_type.parse()?;
        let course_id = CourseId::new(cmd.course_id.as_str())
            .map_err(|e| EnrollmentError::validation("courseId", e.to_string()))?;

        // 2. Load course
        let course = self
            .courses
            .find_by_id(&course_id)
            .await?
            .ok_or_else(|| EnrollmentError::course_not_found(course_id.clone()))?;

        // 3. Price the checkout
        let quote = course
            .quote(enrollment_type)
            .map_err(|e| EnrollmentError::validation("price", e.to_string()))?;

        // 4. Create the provider intent
        let request = CreatePaymentIntentRequest {
            amount_minor: quote.amount_minor,
            currency: self.currency.clone(),
            metadata: IntentMetadata::new(cmd.user_id.clone(), course.id.clone(), enrollment_type),
            description: Some(format!("{} ({})", course.title, enrollment_type)),
            idempotency_key: format!("course-payment-{}", Uuid::new_v4()),
        };

        let intent = self
            .gateway
            .create_payment_intent(request)
            .await
            .map_err(|e| EnrollmentError::payment_provider(e.message))?;

        tracing::info!(
            user_id = %cmd.user_id,
            course_id = %course.id,
            payment_intent_id = %intent.id,
            enrollment_type = %enrollment_type,
            amount = %quote.amount,
            currency = %intent.currency,
            "Course payment intent created"
        );

        Ok(PaymentResult::from_intent(&intent))
    }

    // ════════════════════════════════════════════════════════════════════════════
    // confirmCoursePayment
    // ════════════════════════════════════════════════════════════════════════════

    pub async fn confirm_course_payment(&self, cmd: ConfirmCoursePaymentCommand) -> PaymentResult {
        if cmd.payment_intent_id.trim().is_empty() {
            return PaymentResult::failure("Payment intent id is required")
                .with_error_code(ErrorCode::ValidationFailed);
        }

        // 1. Fetch the intent from the provider
        let intent = match self
            .gateway
            .retrieve_payment_intent(&cmd.payment_intent_id)
            .await
        {
            Ok(intent) => intent,
            Err(err) => {
                tracing::warn!(
                    user_id = %cmd.user_id,
                    payment_intent_id = %cmd.payment_intent_id,
                    error = %err,
                    "Could not retrieve payment intent"
                );
                let err = EnrollmentError::payment_provider(err.message);
                return PaymentResult::failure(err.message()).with_error_code(err.code());
            }
        };

        // 2. Enroll from the intent
        match self.enroll_from_intent(&cmd.user_id, &intent).await {
            Ok(outcome) => {
                tracing::info!(
                    user_id = %cmd.user_id,
                    payment_intent_id = %intent.id,
                    enrollment_id = %outcome.enrollment().id,
                    created = outcome.was_created(),
                    "Course payment confirmed"
                );
                PaymentResult::from_intent(&intent).with_enrollment(outcome)
            }
            Err(err) => {
                tracing::warn!(
                    user_id = %cmd.user_id,
                    payment_intent_id = %intent.id,
                    status = %intent.status,
                    error = %err,
                    "Course payment confirmation failed"
                );
                PaymentResult::failure_for_intent(&intent, err.message())
                    .with_error_code(err.code())
            }
        }
    }

    async fn enroll_from_intent(
        &self,
        caller: &UserId,
        intent: &PaymentIntent,
    ) -> Result<EnrollmentOutcome, EnrollmentError> {
        if !intent.status.is_succeeded() {
            return Err(EnrollmentError::payment_not_completed(intent.status.as_str()));
        }

        let metadata = intent
            .decode_metadata()
            .map_err(|e| EnrollmentError::invalid_metadata(e.to_string()))?;

        if &metadata.user_id != caller {
            return Err(EnrollmentError::NotPaymentOwner);
        }

        self.enrollments
            .ensure_enrolled(EnrollmentRequest {
                user_id: metadata.user_id,
                course_id: metadata.course_id,
                enrollment_type: metadata.enrollment_type,
                payment_intent_id: Some(intent.id.clone()),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryCourseReader, InMemoryEnrollmentRepository};
    use crate::adapters::stripe::MockPaymentGateway;
    use crate::domain::course::Course;
    use crate::domain::payment::PaymentIntentStatus;
    use crate::ports::{PaymentError, PaymentErrorCode};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    struct Fixture {
        service: PaymentService,
        gateway: MockPaymentGateway,
        repo: InMemoryEnrollmentRepository,
    }

    fn fixture() -> Fixture {
        let courses = InMemoryCourseReader::with_courses(vec![
            Course::new(
                CourseId::new("course-300").unwrap(),
                "Advanced Rust",
                Decimal::from_str("300.00").unwrap(),
            )
            .unwrap(),
            Course::new(
                CourseId::new("course-4999").unwrap(),
                "Intro",
                Decimal::from_str("49.99").unwrap(),
            )
            .unwrap(),
        ]);
        let gateway = MockPaymentGateway::new();
        let repo = InMemoryEnrollmentRepository::new();
        let creator = Arc::new(EnrollmentCreator::new(Arc::new(repo.clone())));
        let service = PaymentService::new(
            Arc::new(courses),
            Arc::new(gateway.clone()),
            creator,
            "USD",
        );
        Fixture {
            service,
            gateway,
            repo,
        }
    }

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    fn create_cmd(course: &str, enrollment_type: &str) -> CreateCoursePaymentCommand {
        CreateCoursePaymentCommand {
            user_id: user(),
            course_id: course.to_string(),
            enrollment_type: enrollment_type.to_string(),
        }
    }

    fn confirm_cmd(intent_id: &str) -> ConfirmCoursePaymentCommand {
        ConfirmCoursePaymentCommand {
            user_id: user(),
            payment_intent_id: intent_id.to_string(),
        }
    }

    async fn paid_intent(f: &Fixture, enrollment_type: &str) -> String {
        let created = f
            .service
            .create_course_payment(create_cmd("course-300", enrollment_type))
            .await;
        let id = created.payment_intent_id.unwrap();
        f.gateway.set_intent_status(&id, PaymentIntentStatus::Succeeded);
        id
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Create
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn full_payment_charges_course_price() {
        let f = fixture();
        let result = f
            .service
            .create_course_payment(create_cmd("course-4999", "FULL"))
            .await;

        assert!(result.success);
        assert_eq!(result.amount, Some(Decimal::from_str("49.99").unwrap()));
        assert_eq!(result.currency.as_deref(), Some("usd"));
        assert!(result.client_secret.is_some());
    }

    #[tokio::test]
    async fn installment_payment_charges_surcharged_third() {
        let f = fixture();
        let result = f
            .service
            .create_course_payment(create_cmd("course-300", "INSTALLMENT"))
            .await;

        assert!(result.success);
        assert_eq!(result.amount, Some(Decimal::from_str("110.00").unwrap()));
        let calls = f.gateway.calls();
        assert_eq!(calls[0].args[0], "11000");
    }

    #[tokio::test]
    async fn intent_metadata_links_user_course_and_type() {
        let f = fixture();
        let result = f
            .service
            .create_course_payment(create_cmd("course-300", "INSTALLMENT"))
            .await;

        let intent = f.gateway.intent(&result.payment_intent_id.unwrap()).unwrap();
        let metadata = intent.decode_metadata().unwrap();
        assert_eq!(metadata.user_id, user());
        assert_eq!(metadata.course_id.as_str(), "course-300");
        assert_eq!(metadata.enrollment_type, EnrollmentType::Installment);
    }

    #[tokio::test]
    async fn each_checkout_uses_a_fresh_idempotency_key() {
        let f = fixture();
        f.service
            .create_course_payment(create_cmd("course-300", "FULL"))
            .await;
        f.service
            .create_course_payment(create_cmd("course-300", "FULL"))
            .await;

        let keys: Vec<String> = f.gateway.calls().into_iter().map(|c| c.args[2].clone()).collect();
        assert_eq!(keys.len(), 2);
        assert_ne!(keys[0], keys[1]);
        assert!(keys[0].starts_with("course-payment-"));
    }

    #[tokio::test]
    async fn unknown_course_fails_without_provider_call() {
        let f = fixture();
        let result = f
            .service
            .create_course_payment(create_cmd("missing", "FULL"))
            .await;

        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("Course not found"));
        assert_eq!(result.error_code, Some(ErrorCode::CourseNotFound));
        assert_eq!(f.gateway.call_count("create_payment_intent"), 0);
    }

    #[tokio::test]
    async fn invalid_enrollment_type_fails() {
        let f = fixture();
        let result = f
            .service
            .create_course_payment(create_cmd("course-300", "monthly"))
            .await;

        assert!(!result.success);
        assert!(result.error_message.unwrap().contains("monthly"));
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_result() {
        let f = fixture();
        f.gateway.set_method_error(
            "create_payment_intent",
            PaymentError::new(PaymentErrorCode::ProviderError, "Your card was declined"),
        );

        let result = f
            .service
            .create_course_payment(create_cmd("course-300", "FULL"))
            .await;

        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("Your card was declined"));
        assert!(!result.is_internal_failure());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Confirm
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn confirm_succeeded_intent_creates_enrollment() {
        let f = fixture();
        let intent_id = paid_intent(&f, "FULL").await;

        let result = f.service.confirm_course_payment(confirm_cmd(&intent_id)).await;

        assert!(result.success);
        let outcome = result.enrollment.unwrap();
        assert!(outcome.was_created());
        assert_eq!(outcome.enrollment().course_id.as_str(), "course-300");
        assert_eq!(outcome.enrollment().payment_intent_id.as_deref(), Some(intent_id.as_str()));
        assert_eq!(f.repo.count().await, 1);
    }

    #[tokio::test]
    async fn confirm_unpaid_intent_reports_payment_not_completed() {
        let f = fixture();
        let created = f
            .service
            .create_course_payment(create_cmd("course-300", "FULL"))
            .await;

        let result = f
            .service
            .confirm_course_payment(confirm_cmd(&created.payment_intent_id.unwrap()))
            .await;

        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("Payment not completed"));
        assert_eq!(f.repo.count().await, 0);
    }

    #[tokio::test]
    async fn repeated_confirm_is_a_no_op() {
        let f = fixture();
        let intent_id = paid_intent(&f, "INSTALLMENT").await;

        let first = f.service.confirm_course_payment(confirm_cmd(&intent_id)).await;
        let second = f.service.confirm_course_payment(confirm_cmd(&intent_id)).await;

        assert!(first.success && second.success);
        assert!(matches!(second.enrollment, Some(EnrollmentOutcome::AlreadyEnrolled(_))));
        assert_eq!(f.repo.count().await, 1);
    }

    #[tokio::test]
    async fn confirm_by_another_user_is_rejected() {
        let f = fixture();
        let intent_id = paid_intent(&f, "FULL").await;

        let result = f
            .service
            .confirm_course_payment(ConfirmCoursePaymentCommand {
                user_id: UserId::new("intruder").unwrap(),
                payment_intent_id: intent_id,
            })
            .await;

        assert!(!result.success);
        assert_eq!(
            result.error_message.as_deref(),
            Some("Payment does not belong to this user")
        );
        assert_eq!(f.repo.count().await, 0);
    }

    #[tokio::test]
    async fn confirm_unknown_intent_fails() {
        let f = fixture();
        let result = f.service.confirm_course_payment(confirm_cmd("pi_nope")).await;

        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("Payment intent not found"));
    }

    #[tokio::test]
    async fn confirm_with_broken_metadata_fails() {
        let f = fixture();
        f.gateway.insert_intent(PaymentIntent {
            id: "pi_bare".to_string(),
            amount_minor: 100,
            currency: "usd".to_string(),
            status: PaymentIntentStatus::Succeeded,
            client_secret: None,
            metadata: Default::default(),
        });

        let result = f.service.confirm_course_payment(confirm_cmd("pi_bare")).await;

        assert!(!result.success);
        assert!(result.error_message.unwrap().contains("userId"));
        assert_eq!(f.repo.count().await, 0);
    }

    #[tokio::test]
    async fn confirm_store_failure_is_internal() {
        let f = fixture();
        let intent_id = paid_intent(&f, "FULL").await;
        f.repo.set_unavailable(true);

        let result = f.service.confirm_course_payment(confirm_cmd(&intent_id)).await;

        assert!(!result.success);
        assert!(result.is_internal_failure());
    }
}
