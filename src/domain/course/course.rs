//! Course catalogue entry, as far as checkout needs it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::enrollment::EnrollmentType;
use crate::domain::foundation::{CourseId, ValidationError};

use super::pricing::{quote, PriceQuote};

/// Read-only view of a course used for pricing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    /// List price in major currency units.
    pub price: Decimal,
}

impl Course {
    /// Creates a course, rejecting negative prices.
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        price: Decimal,
    ) -> Result<Self, ValidationError> {
        if price.is_sign_negative() && !price.is_zero() {
            return Err(ValidationError::negative("price"));
        }
        Ok(Self {
            id,
            title: title.into(),
            price,
        })
    }

    /// Price of one checkout for the given enrollment type.
    pub fn quote(&self, enrollment_type: EnrollmentType) -> Result<PriceQuote, ValidationError> {
        quote(self.price, enrollment_type)
    }
}
