//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `stripe` - Payment gateway (Stripe) and a mock for tests
//! - `postgres` - Enrollment store and course catalog
//! - `memory` - In-memory store and catalog for tests and local runs
//! - `auth` - Bearer token validation
//! - `http` - Axum routes, handlers and middleware

pub mod auth;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod stripe;
