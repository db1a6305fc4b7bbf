//! In-Memory Enrollment Repository
//!
//! The whole check-and-insert runs under one write lock, which gives the
//! same per-pair uniqueness as the Postgres constraint.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::enrollment::Enrollment;
use crate::domain::foundation::{CourseId, DomainError, UserId};
use crate::ports::{EnrollmentRepository, SaveResult};

/// In-memory storage for enrollments keyed by (user, course).
#[derive(Debug, Clone, Default)]
pub struct InMemoryEnrollmentRepository {
    enrollments: Arc<RwLock<HashMap<(UserId, CourseId), Enrollment>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryEnrollmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with a database error (for failure-path tests).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Get the number of stored enrollments
    pub async fn count(&self) -> usize {
        self.enrollments.read().await.len()
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::database("Enrollment store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryEnrollmentRepository {
    async fn find_by_user_and_course(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<Enrollment>, DomainError> {
        self.check_available()?;
        let enrollments = self.enrollments.read().await;
        Ok(enrollments
            .get(&(user_id.clone(), course_id.clone()))
            .cloned())
    }

    async fn insert_if_absent(&self, enrollment: &Enrollment) -> Result<SaveResult, DomainError> {
        self.check_available()?;
        let mut enrollments = self.enrollments.write().await;
        let key = (enrollment.user_id.clone(), enrollment.course_id.clone());

        if enrollments.contains_key(&key) {
            return Ok(SaveResult::AlreadyExists);
        }
        enrollments.insert(key, enrollment.clone());
        Ok(SaveResult::Inserted)
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Enrollment>, DomainError> {
        self.check_available()?;
        let enrollments = self.enrollments.read().await;
        let mut found: Vec<Enrollment> = enrollments
            .values()
            .filter(|e| &e.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}
