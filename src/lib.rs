//! `tabular-transform` is the data library behind a spreadsheet analysis platform: users upload
//! spreadsheet files, the backend parses them into typed rows, profiles their columns, and turns
//! those rows into chart-ready records according to a user-configured "analysis".
//!
//! ## What you can ingest
//!
//! The reader is chosen from the file extension: `.csv`; `.json` or `.ndjson` (an array of
//! objects, one object, or one object per line); and, with the `excel` cargo feature,
//! `.xlsx`/`.xlsm`/`.xlsb`/`.xls`/`.ods` workbooks.
//!
//! Ingestion produces a [`types::Workbook`] (sheet name → rows). Every cell is a typed
//! [`types::Value`]: null, integer, float, boolean, text or date. No schema is required; cell
//! types are inferred, and [`profiling`] summarizes them per column.
//!
//! ## Transforming rows
//!
//! [`processing::transform`] runs a declarative [`processing::PipelineConfig`] over a row
//! sequence: filters (AND) → group-by with aggregations → multi-key stable sort.
//!
//! ```rust
//! use tabular_transform::processing::{transform, AggregateFunction, Aggregation, OrderSpec, PipelineConfig};
//! use tabular_transform::types::{Row, Value};
//!
//! let rows = vec![
//!     Row::from([("g", Value::from("x")), ("v", Value::Int64(10))]),
//!     Row::from([("g", Value::from("x")), ("v", Value::Int64(20))]),
//!     Row::from([("g", Value::from("y")), ("v", Value::Int64(5))]),
//! ];
//!
//! let config = PipelineConfig {
//!     group_by: vec!["g".to_string()],
//!     aggregations: vec![Aggregation::new("v", AggregateFunction::Sum)],
//!     order_by: vec![OrderSpec::asc("v_sum")],
//!     ..Default::default()
//! };
//!
//! let out = transform(&rows, &config);
//! assert_eq!(out[0].value("g"), &Value::from("y"));
//! assert_eq!(out[1].value("v_sum"), &Value::Float64(30.0));
//! ```
//!
//! The same pipeline is reachable from JSON (as sent by a web client) via
//! [`processing::transform_json`], where the configuration uses `filters`, `groupBy`,
//! `aggregations` and `orderBy`.
//!
//! ### Aggregations
//!
//! Aggregations only see numeric-coercible cells; text that does not parse and nulls are left
//! out rather than counted as zero.
//!
//! - `sum` (0 for no values), `count` (number of numeric values)
//! - `avg`, `min`, `max`, `median`, `std_dev` (population): null when a group has no numeric
//!   values
//!
//! ## Modules
//!
//! - [`ingestion`]: unified ingestion entrypoints and format-specific implementations
//! - [`types`]: cell values, rows, sheets and workbooks
//! - [`profiling`]: per-column type / null / unique / sample statistics
//! - [`processing`]: the filter → group/aggregate → sort pipeline
//! - [`execution`]: parallel batch execution with row ceilings, throttling and metrics
//! - [`error`]: error types

pub mod error;
pub mod execution;
pub mod ingestion;
pub mod processing;
pub mod profiling;
pub mod types;

pub use error::{IngestionError, IngestionResult, PipelineError, PipelineResult};
