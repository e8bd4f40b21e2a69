pub mod aggregate;

pub use aggregate::{AggregateResult, Portfolio};
