//! CourseReader port - read-only access to the course catalog.

use async_trait::async_trait;

use crate::domain::course::Course;
use crate::domain::foundation::{CourseId, DomainError};

/// Looks up courses by id.
///
/// Catalog management lives elsewhere; checkout only needs a price.
#[async_trait]
pub trait CourseReader: Send + Sync {
    /// Returns `None` if no course has this id.
    async fn find_by_id(&self, course_id: &CourseId) -> Result<Option<Course>, DomainError>;
}
