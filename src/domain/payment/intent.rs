//! Payment intent as seen from this service.
//!
//! The provider owns the intent; we hold a snapshot plus the metadata that
//! links it back to a user, course and enrollment type.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::enrollment::EnrollmentType;
use crate::domain::foundation::{CourseId, UserId};

/// Metadata key carrying the paying user's id.
pub const USER_ID_KEY: &str = "userId";

/// Metadata key carrying the purchased course id.
pub const COURSE_ID_KEY: &str = "courseId";

/// Metadata key carrying `FULL` or `INSTALLMENT`.
pub const ENROLLMENT_TYPE_KEY: &str = "enrollmentType";

/// Provider-side lifecycle of an intent, collapsed to what checkout needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    /// Waiting on the customer (payment method, confirmation, 3DS...).
    RequiresPayment,
    /// Submitted, outcome not yet known.
    Processing,
    Succeeded,
    /// Canceled, or the last attempt failed.
    Failed,
}

impl PaymentIntentStatus {
    /// Maps a Stripe intent status.
    ///
    /// Stripe moves a failed attempt back to `requires_payment_method` and
    /// records `last_payment_error`; that combination is reported as Failed.
    pub fn from_provider(status: &str, has_payment_error: bool) -> Self {
        match status {
            "succeeded" => PaymentIntentStatus::Succeeded,
            "processing" => PaymentIntentStatus::Processing,
            "canceled" => PaymentIntentStatus::Failed,
            s if s.starts_with("requires_") && has_payment_error => PaymentIntentStatus::Failed,
            _ => PaymentIntentStatus::RequiresPayment,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentIntentStatus::RequiresPayment => "requires_payment",
            PaymentIntentStatus::Processing => "processing",
            PaymentIntentStatus::Succeeded => "succeeded",
            PaymentIntentStatus::Failed => "failed",
        }
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, PaymentIntentStatus::Succeeded)
    }
}

impl std::fmt::Display for PaymentIntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors decoding intent metadata.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("missing metadata key '{0}'")]
    Missing(&'static str),

    #[error("invalid metadata value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// The durable link between a provider payment and our domain objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentMetadata {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub enrollment_type: EnrollmentType,
}

impl IntentMetadata {
    pub fn new(user_id: UserId, course_id: CourseId, enrollment_type: EnrollmentType) -> Self {
        Self {
            user_id,
            course_id,
            enrollment_type,
        }
    }

    /// Key/value pairs to attach to the provider intent.
    pub fn to_pairs(&self) -> [(&'static str, String); 3] {
        [
            (USER_ID_KEY, self.user_id.as_str().to_string()),
            (COURSE_ID_KEY, self.course_id.as_str().to_string()),
            (ENROLLMENT_TYPE_KEY, self.enrollment_type.as_str().to_string()),
        ]
    }

    /// Metadata as a provider-style map.
    pub fn to_map(&self) -> HashMap<String, String> {
        self.to_pairs()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    /// Decodes metadata read back from the provider.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, MetadataError> {
        let user_id =
            UserId::new(required(map, USER_ID_KEY)?).map_err(|e| MetadataError::Invalid {
                key: USER_ID_KEY,
                reason: e.to_string(),
            })?;
        let course_id =
            CourseId::new(required(map, COURSE_ID_KEY)?).map_err(|e| MetadataError::Invalid {
                key: COURSE_ID_KEY,
                reason: e.to_string(),
            })?;
        let enrollment_type = required(map, ENROLLMENT_TYPE_KEY)?
            .parse::<EnrollmentType>()
            .map_err(|e| MetadataError::Invalid {
                key: ENROLLMENT_TYPE_KEY,
                reason: e.to_string(),
            })?;

        Ok(Self {
            user_id,
            course_id,
            enrollment_type,
        })
    }
}

fn required<'a>(
    map: &'a HashMap<String, String>,
    key: &'static str,
) -> Result<&'a str, MetadataError> {
    map.get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or(MetadataError::Missing(key))
}

/// Snapshot of a provider payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    /// Provider intent id (pi_...).
    pub id: String,

    /// Amount in minor currency units.
    pub amount_minor: i64,

    /// Lowercase ISO currency code.
    pub currency: String,

    pub status: PaymentIntentStatus,

    /// Secret handed to the browser to complete payment.
    pub client_secret: Option<String>,

    /// Raw provider metadata; decode with `IntentMetadata::from_map`.
    pub metadata: HashMap<String, String>,
}

impl PaymentIntent {
    pub fn decode_metadata(&self) -> Result<IntentMetadata, MetadataError> {
        IntentMetadata::from_map(&self.metadata)
    }
}
