//! PostgreSQL implementation of CourseReader.

use crate::domain::course::Course;
use crate::domain::foundation::{CourseId, DomainError, ErrorCode};
use crate::ports::CourseReader;
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

/// Reads courses from the `courses` table.
pub struct PostgresCourseReader {
    pool: PgPool,
}

impl PostgresCourseReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CourseRow {
    id: String,
    title: String,
    price: Decimal,
}

impl TryFrom<CourseRow> for Course {
    type Error = DomainError;

    fn try_from(row: CourseRow) -> Result<Self, Self::Error> {
        let id = CourseId::new(row.id).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid course id: {}", e))
        })?;
        Course::new(id, row.title, row.price).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid course row: {}", e))
        })
    }
}

#[async_trait]
impl CourseReader for PostgresCourseReader {
    async fn find_by_id(&self, course_id: &CourseId) -> Result<Option<Course>, DomainError> {
        let row: Option<CourseRow> = sqlx::query_as(
            r#"
            SELECT id, title, price
            FROM courses
            WHERE id = $1
            "#,
        )
        .bind(course_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to fetch course: {}", e))
        })?;

        row.map(Course::try_from).transpose()
    }
}
