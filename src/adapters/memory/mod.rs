//! In-memory adapters for development and tests.

mod course_reader;
mod enrollment_repository;

pub use course_reader::InMemoryCourseReader;
pub use enrollment_repository::InMemoryEnrollmentRepository;
