//! Enrollment entity.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CourseId, EnrollmentId, Timestamp, UserId};

use super::{EnrollmentStatus, EnrollmentType};

/// A user's paid (or installment-committed) access to a course.
///
/// At most one enrollment exists per (user_id, course_id). The store
/// enforces this; see `EnrollmentRepository::insert_if_absent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub enrollment_type: EnrollmentType,
    pub status: EnrollmentStatus,
    /// Payment intent that produced this enrollment, if any.
    pub payment_intent_id: Option<String>,
    pub created_at: Timestamp,
}

impl Enrollment {
    /// Creates a new active enrollment.
    pub fn new(
        user_id: UserId,
        course_id: CourseId,
        enrollment_type: EnrollmentType,
        payment_intent_id: Option<String>,
    ) -> Self {
        Self {
            id: EnrollmentId::new(),
            user_id,
            course_id,
            enrollment_type,
            status: EnrollmentStatus::Active,
            payment_intent_id,
            created_at: Timestamp::now(),
        }
    }

    /// Returns true if this enrollment is for the given user and course.
    pub fn matches(&self, user_id: &UserId, course_id: &CourseId) -> bool {
        &self.user_id == user_id && &self.course_id == course_id
    }
}

/// Result of an idempotent enrollment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentOutcome {
    /// This call created the enrollment.
    Created(Enrollment),

    /// An enrollment for the pair already existed; nothing was written.
    AlreadyEnrolled(Enrollment),
}

impl EnrollmentOutcome {
    pub fn enrollment(&self) -> &Enrollment {
        match self {
            EnrollmentOutcome::Created(e) | EnrollmentOutcome::AlreadyEnrolled(e) => e,
        }
    }

    pub fn into_enrollment(self) -> Enrollment {
        match self {
            EnrollmentOutcome::Created(e) | EnrollmentOutcome::AlreadyEnrolled(e) => e,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, EnrollmentOutcome::Created(_))
    }
}
