//! HTTP adapter for course payment endpoints.
//!
//! - `POST /api/payments/course/initialize` - Start a course checkout
//! - `POST /api/payments/course/confirm` - Confirm payment and enroll
//! - `GET /api/payments/course/:course_id/enrollment` - Caller's enrollment
//! - `POST /api/payments/webhook` - Handle provider webhooks

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::PaymentsAppState;
pub use routes::payments_router;
