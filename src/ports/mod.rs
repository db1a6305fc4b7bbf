//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Payment Ports
//!
//! - `PaymentGateway` - Payment intents and webhook verification
//!
//! ## Storage Ports
//!
//! - `EnrollmentRepository` - Enrollment persistence with per-pair uniqueness
//! - `CourseReader` - Course catalog lookups
//!
//! ## Auth Ports
//!
//! - `SessionValidator` - Bearer token validation

mod course_reader;
mod enrollment_repository;
mod payment_gateway;
mod session_validator;

pub use course_reader::CourseReader;
pub use enrollment_repository::{EnrollmentRepository, SaveResult};
pub use payment_gateway::{
    CreatePaymentIntentRequest, PaymentError, PaymentErrorCode, PaymentGateway, WebhookEvent,
    WebhookEventData, WebhookEventType,
};
pub use session_validator::SessionValidator;
