//! Course payment handlers.
//!
//! ## Commands
//! - Creating a course payment intent
//! - Confirming a finished payment
//! - Processing provider webhooks
//!
//! ## Queries
//! - Get a caller's enrollment in a course

mod enrollment_creator;
mod get_enrollment;
mod payment_service;
mod webhook_dispatcher;

// Commands
pub use enrollment_creator::{EnrollmentCreator, EnrollmentRequest};
pub use payment_service::{ConfirmCoursePaymentCommand, CreateCoursePaymentCommand, PaymentService};
pub use webhook_dispatcher::{WebhookDispatcher, WebhookReceipt};

// Queries
pub use get_enrollment::{GetEnrollmentHandler, GetEnrollmentQuery, GetEnrollmentResult};
