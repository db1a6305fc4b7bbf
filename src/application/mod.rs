//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod handlers;

pub use handlers::payment::{
    ConfirmCoursePaymentCommand, CreateCoursePaymentCommand, EnrollmentCreator,
    EnrollmentRequest, GetEnrollmentHandler, GetEnrollmentQuery, GetEnrollmentResult,
    PaymentService, WebhookDispatcher, WebhookReceipt,
};
