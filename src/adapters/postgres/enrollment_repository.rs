//! PostgreSQL implementation of EnrollmentRepository.
//!
//! Uniqueness of (user_id, course_id) is enforced by the
//! `enrollments_user_course_key` constraint; inserts never read first.

use crate::domain::enrollment::{Enrollment, EnrollmentStatus, EnrollmentType};
use crate::domain::foundation::{CourseId, DomainError, EnrollmentId, ErrorCode, Timestamp, UserId};
use crate::ports::{EnrollmentRepository, SaveResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const COURSE_FOREIGN_KEY: &str = "enrollments_course_id_fkey";

/// PostgreSQL implementation of the EnrollmentRepository port.
pub struct PostgresEnrollmentRepository {
    pool: PgPool,
}

impl PostgresEnrollmentRepository {
    /// Creates a new PostgresEnrollmentRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an enrollment.
#[derive(Debug, sqlx::FromRow)]
struct EnrollmentRow {
    id: Uuid,
    user_id: String,
    course_id: String,
    enrollment_type: String,
    status: String,
    payment_intent_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<EnrollmentRow> for Enrollment {
    type Error = DomainError;

    fn try_from(row: EnrollmentRow) -> Result<Self, Self::Error> {
        let enrollment_type: EnrollmentType = row
            .enrollment_type
            .parse()
            .map_err(|e| corrupt_row("enrollment_type", e))?;
        let status: EnrollmentStatus = row.status.parse().map_err(|e| corrupt_row("status", e))?;

        Ok(Enrollment {
            id: EnrollmentId::from_uuid(row.id),
            user_id: UserId::new(row.user_id).map_err(|e| corrupt_row("user_id", e))?,
            course_id: CourseId::new(row.course_id).map_err(|e| corrupt_row("course_id", e))?,
            enrollment_type,
            status,
            payment_intent_id: row.payment_intent_id,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

fn corrupt_row(column: &str, err: impl std::fmt::Display) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Invalid {} value: {}", column, err),
    )
}

fn query_error(action: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Failed to {}: {}", action, e))
}

#[async_trait]
impl EnrollmentRepository for PostgresEnrollmentRepository {
    async fn find_by_user_and_course(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<Enrollment>, DomainError> {
        let row: Option<EnrollmentRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, course_id, enrollment_type, status, payment_intent_id, created_at
            FROM enrollments
            WHERE user_id = $1 AND course_id = $2
            "#,
        )
        .bind(user_id.as_str())
        .bind(course_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("fetch enrollment", e))?;

        row.map(Enrollment::try_from).transpose()
    }

    async fn insert_if_absent(&self, enrollment: &Enrollment) -> Result<SaveResult, DomainError> {
        let inserted: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO enrollments (
                id, user_id, course_id, enrollment_type, status, payment_intent_id, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, course_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(enrollment.id.as_uuid())
        .bind(enrollment.user_id.as_str())
        .bind(enrollment.course_id.as_str())
        .bind(enrollment.enrollment_type.as_str())
        .bind(enrollment.status.as_str())
        .bind(&enrollment.payment_intent_id)
        .bind(enrollment.created_at.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some(COURSE_FOREIGN_KEY) {
                    return DomainError::new(ErrorCode::CourseNotFound, "Course not found")
                        .with_detail("course_id", enrollment.course_id.as_str());
                }
            }
            query_error("save enrollment", e)
        })?;

        Ok(match inserted {
            Some(_) => SaveResult::Inserted,
            None => SaveResult::AlreadyExists,
        })
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Enrollment>, DomainError> {
        let rows: Vec<EnrollmentRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, course_id, enrollment_type, status, payment_intent_id, created_at
            FROM enrollments
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("list enrollments", e))?;

        rows.into_iter().map(Enrollment::try_from).collect()
    }
}
