//! In-memory course catalog.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::course::Course;
use crate::domain::foundation::{CourseId, DomainError};
use crate::ports::CourseReader;

#[derive(Debug, Clone, Default)]
pub struct InMemoryCourseReader {
    courses: Arc<RwLock<HashMap<CourseId, Course>>>,
}

impl InMemoryCourseReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog holding the given courses.
    pub fn with_courses(courses: impl IntoIterator<Item = Course>) -> Self {
        let map = courses.into_iter().map(|c| (c.id.clone(), c)).collect();
        Self {
            courses: Arc::new(RwLock::new(map)),
        }
    }

    pub async fn insert(&self, course: Course) {
        self.courses.write().await.insert(course.id.clone(), course);
    }
}

#[async_trait]
impl CourseReader for InMemoryCourseReader {
    async fn find_by_id(&self, course_id: &CourseId) -> Result<Option<Course>, DomainError> {
        Ok(self.courses.read().await.get(course_id).cloned())
    }
}
