//! Course Payments - Checkout, confirmation and enrollment for paid courses
//!
//! This crate takes payments for courses through Stripe and turns a
//! succeeded payment into exactly one enrollment, whether the client
//! confirms it or the provider's webhook arrives first.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
