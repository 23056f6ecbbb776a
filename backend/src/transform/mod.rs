//! Transformation module.
//!
//! - Aggregate: raw rows to one record per student
//! - Classify: raw outcome text to a [`Status`](crate::models::Status)
//! - Reports: students partitioned into department sheets
//! - Pipeline: decode, aggregate and build reports in one call

pub mod aggregate;
pub mod classify;
pub mod pipeline;
pub mod reports;

pub use aggregate::{aggregate, aggregate_with, Aggregation, ColumnAliases, StudentAggregates};
pub use classify::classify;
pub use pipeline::*;
pub use reports::{build_reports, unassigned_count};
