//! GetEnrollmentHandler - Query handler for a caller's course enrollment.

use std::sync::Arc;

use crate::domain::enrollment::{Enrollment, EnrollmentError};
use crate::domain::foundation::{CourseId, UserId};
use crate::ports::EnrollmentRepository;

/// Query for the enrollment of one user in one course.
#[derive(Debug, Clone)]
pub struct GetEnrollmentQuery {
    pub user_id: UserId,
    pub course_id: String,
}

/// `None` when the user is not enrolled.
pub type GetEnrollmentResult = Option<Enrollment>;

pub struct GetEnrollmentHandler {
    repository: Arc<dyn EnrollmentRepository>,
}

impl GetEnrollmentHandler {
    pub fn new(repository: Arc<dyn EnrollmentRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(
        &self,
        query: GetEnrollmentQuery,
    ) -> Result<GetEnrollmentResult, EnrollmentError> {
        let course_id = CourseId::new(query.course_id)
            .map_err(|e| EnrollmentError::validation("courseId", e.to_string()))?;

        self.repository
            .find_by_user_and_course(&query.user_id, &course_id)
            .await
            .map_err(|e| EnrollmentError::infrastructure(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryEnrollmentRepository;
    use crate::domain::enrollment::EnrollmentType;
    use crate::ports::SaveResult;

    fn query(user: &str, course: &str) -> GetEnrollmentQuery {
        GetEnrollmentQuery {
            user_id: UserId::new(user).unwrap(),
            course_id: course.to_string(),
        }
    }

    #[tokio::test]
    async fn returns_callers_enrollment() {
        let repo = InMemoryEnrollmentRepository::new();
        let enrollment = Enrollment::new(
            UserId::new("u-1").unwrap(),
            CourseId::new("c-1").unwrap(),
            EnrollmentType::Full,
            Some("pi_1".to_string()),
        );
        assert_eq!(
            repo.insert_if_absent(&enrollment).await.unwrap(),
            SaveResult::Inserted
        );
        let handler = GetEnrollmentHandler::new(Arc::new(repo));

        let found = handler.handle(query("u-1", "c-1")).await.unwrap();
        assert_eq!(found, Some(enrollment));

        let other_user = handler.handle(query("u-2", "c-1")).await.unwrap();
        assert!(other_user.is_none());
    }

    #[tokio::test]
    async fn blank_course_id_is_validation_error() {
        let handler = GetEnrollmentHandler::new(Arc::new(InMemoryEnrollmentRepository::new()));

        let err = handler.handle(query("u-1", " ")).await.unwrap_err();
        assert!(matches!(err, EnrollmentError::ValidationFailed { .. }));
    }

    #[tokio::test]
    async fn store_failure_is_infrastructure() {
        let repo = InMemoryEnrollmentRepository::new();
        repo.set_unavailable(true);
        let handler = GetEnrollmentHandler::new(Arc::new(repo));

        let err = handler.handle(query("u-1", "c-1")).await.unwrap_err();
        assert!(matches!(err, EnrollmentError::Infrastructure(_)));
    }
}
