//! Course domain - catalogue data consumed by checkout.

mod course;
pub mod pricing;

pub use course::Course;
pub use pricing::{quote, PriceQuote};
