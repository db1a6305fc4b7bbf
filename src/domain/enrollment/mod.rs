//! Enrollment domain - course access records created from completed payments.

mod enrollment;
mod enrollment_type;
mod errors;

pub use enrollment::{Enrollment, EnrollmentOutcome};
pub use enrollment_type::{EnrollmentStatus, EnrollmentType};
pub use errors::EnrollmentError;
