//! EnrollmentCreator - the single idempotent enrollment routine.
//!
//! Both the synchronous confirm call and the `payment_intent.succeeded`
//! webhook enroll through here, so whichever arrives first creates the
//! enrollment and the other observes it.

use std::sync::Arc;

use crate::domain::enrollment::{Enrollment, EnrollmentError, EnrollmentOutcome, EnrollmentType};
use crate::domain::foundation::{CourseId, UserId};
use crate::ports::{EnrollmentRepository, SaveResult};

/// Request to make sure a user is enrolled in a course.
#[derive(Debug, Clone)]
pub struct EnrollmentRequest {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub enrollment_type: EnrollmentType,
    pub payment_intent_id: Option<String>,
}

/// Creates enrollments at most once per (user, course).
///
/// The lookup is only a shortcut. The store's unique key decides the race:
/// an `AlreadyExists` from `insert_if_absent` is reported as
/// `AlreadyEnrolled`, never as an error.
pub struct EnrollmentCreator {
    repository: Arc<dyn EnrollmentRepository>,
}

impl EnrollmentCreator {
    pub fn new(repository: Arc<dyn EnrollmentRepository>) -> Self {
        Self { repository }
    }

    pub async fn ensure_enrolled(
        &self,
        request: EnrollmentRequest,
    ) -> Result<EnrollmentOutcome, EnrollmentError> {
        // 1. Fast path: enrollment already recorded
        if let Some(existing) = self
            .repository
            .find_by_user_and_course(&request.user_id, &request.course_id)
            .await?
        {
            tracing::warn!(
                user_id = %request.user_id,
                course_id = %request.course_id,
                payment_intent_id = ?request.payment_intent_id,
                enrollment_id = %existing.id,
                "Duplicate enrollment detected, skipping"
            );
            return Ok(EnrollmentOutcome::AlreadyEnrolled(existing));
        }

        // 2. Atomic insert keyed on (user_id, course_id)
        let enrollment = Enrollment::new(
            request.user_id.clone(),
            request.course_id.clone(),
            request.enrollment_type,
            request.payment_intent_id.clone(),
        );

        match self.repository.insert_if_absent(&enrollment).await? {
            SaveResult::Inserted => {
                tracing::info!(
                    user_id = %enrollment.user_id,
                    course_id = %enrollment.course_id,
                    payment_intent_id = ?enrollment.payment_intent_id,
                    enrollment_id = %enrollment.id,
                    enrollment_type = %enrollment.enrollment_type,
                    "Enrollment created"
                );
                Ok(EnrollmentOutcome::Created(enrollment))
            }
            SaveResult::AlreadyExists => {
                // 3. Lost the race; report the row that won
                let winner = self
                    .repository
                    .find_by_user_and_course(&request.user_id, &request.course_id)
                    .await?
                    .ok_or_else(|| {
                        EnrollmentError::infrastructure(
                            "Enrollment conflict reported but no row found",
                        )
                    })?;

                tracing::warn!(
                    user_id = %request.user_id,
                    course_id = %request.course_id,
                    payment_intent_id = ?request.payment_intent_id,
                    enrollment_id = %winner.id,
                    "Concurrent enrollment detected, using existing record"
                );
                Ok(EnrollmentOutcome::AlreadyEnrolled(winner))
            }
        }
    }
}
