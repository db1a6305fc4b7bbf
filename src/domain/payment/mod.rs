//! Payment domain - provider intents, checkout results and webhook errors.

mod intent;
mod result;
mod webhook_errors;

pub use intent::{
    IntentMetadata, MetadataError, PaymentIntent, PaymentIntentStatus, COURSE_ID_KEY,
    ENROLLMENT_TYPE_KEY, USER_ID_KEY,
};
pub use result::PaymentResult;
pub use webhook_errors::WebhookError;
