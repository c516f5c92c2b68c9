//! Aggregation of collector results into the final report and message.

pub mod aggregator;

pub use aggregator::*;
