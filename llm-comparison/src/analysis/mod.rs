//! Aggregation of trial records for reporting

pub mod aggregate;

pub use aggregate::{group_records, AggregateGroup, MetricSummary};
