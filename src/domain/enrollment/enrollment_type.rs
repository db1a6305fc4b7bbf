//! Enrollment plan and lifecycle status.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::EnrollmentError;

/// How the student pays for a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentType {
    /// One payment of the full course price.
    Full,

    /// First of three payments, with a 10% surcharge on the total.
    Installment,
}

impl EnrollmentType {
    /// Wire and storage representation (`FULL` / `INSTALLMENT`).
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentType::Full => "FULL",
            EnrollmentType::Installment => "INSTALLMENT",
        }
    }
}

impl FromStr for EnrollmentType {
    type Err = EnrollmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FULL" => Ok(EnrollmentType::Full),
            "INSTALLMENT" => Ok(EnrollmentType::Installment),
            other => Err(EnrollmentError::invalid_enrollment_type(other)),
        }
    }
}

impl std::fmt::Display for EnrollmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Cancelled,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "ACTIVE",
            EnrollmentStatus::Completed => "COMPLETED",
            EnrollmentStatus::Cancelled => "CANCELLED",
        }
    }
}

impl FromStr for EnrollmentStatus {
    type Err = EnrollmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(EnrollmentStatus::Active),
            "COMPLETED" => Ok(EnrollmentStatus::Completed),
            "CANCELLED" => Ok(EnrollmentStatus::Cancelled),
            other => Err(EnrollmentError::infrastructure(format!(
                "Invalid enrollment status value: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
