//! EnrollmentRepository port - storage for course enrollments.
//!
//! The store owns the uniqueness of (user_id, course_id). Confirmation and
//! webhook delivery can race to enroll the same user; implementations must
//! settle that race with a constraint or a single critical section, never
//! with a read followed by a separate write.

use async_trait::async_trait;

use crate::domain::enrollment::Enrollment;
use crate::domain::foundation::{CourseId, DomainError, UserId};

/// Result of attempting to insert an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Record was inserted (first enrollment for this pair).
    Inserted,

    /// An enrollment for the same user and course already exists.
    AlreadyExists,
}

/// Port for storing and retrieving enrollments.
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Find the enrollment for a user in a course.
    ///
    /// Returns `None` if the user is not enrolled.
    async fn find_by_user_and_course(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<Enrollment>, DomainError>;

    /// Insert the enrollment unless one exists for its (user, course) pair.
    ///
    /// Uses `ON CONFLICT DO NOTHING` semantics. Returns
    /// `SaveResult::AlreadyExists` if another writer got there first; the
    /// passed record is then discarded.
    async fn insert_if_absent(&self, enrollment: &Enrollment) -> Result<SaveResult, DomainError>;

    /// All enrollments of a user, newest first.
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Enrollment>, DomainError>;
}
