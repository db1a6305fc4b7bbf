//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! This module provides adapters for PostgreSQL-backed persistence:
//! - `PostgresEnrollmentRepository` - Enrollments with per-pair uniqueness
//! - `PostgresCourseReader` - Course catalog lookups

mod course_reader;
mod enrollment_repository;

pub use course_reader::PostgresCourseReader;
pub use enrollment_repository::PostgresEnrollmentRepository;
