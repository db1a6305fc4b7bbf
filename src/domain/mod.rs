//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, auth, errors)
//! - `course` - Course data and the checkout pricing rule
//! - `enrollment` - Enrollment records and their idempotent creation outcome
//! - `payment` - Provider intents, intent metadata, checkout results, webhook errors

pub mod course;
pub mod enrollment;
pub mod foundation;
pub mod payment;
