//! Telemetry Collection
//!
//! Drives the proprietary battery queries over an established bus session
//! and aggregates the results into a snapshot. One failing field never
//! blocks the others: errors are logged and the field is omitted.

mod collector;
mod fields;
mod snapshot;

pub use collector::{collect, query_addressed};
pub use fields::{FieldQuery, FIELD_QUERIES};
pub use snapshot::TelemetrySnapshot;
