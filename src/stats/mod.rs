//! Stats module - aggregation over canonical datasets

mod aggregator;
mod insights;

pub use aggregator::{AggregateError, Aggregator, Direction, FieldSummary};
pub use insights::{insights, Insight};
