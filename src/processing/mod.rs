//! In-memory row transformations.
//!
//! The processing layer turns rows produced by ingestion into chart-ready records. It is purely
//! in-memory and synchronous: every function takes its input by reference and returns new rows.
//!
//! Stages, in the order [`transform`] runs them:
//!
//! - [`filter`]: declarative row predicates ([`Filter`]) combined with AND
//! - [`aggregate`]: partition by group-by columns and compute [`Aggregation`]s per group
//! - [`sort`]: stable multi-key sort ([`OrderSpec`])
//!
//! [`reduce`] applies a single aggregation to a whole row set for summary statistics.
//!
//! ## Example: filter → group → sort
//!
//! ```rust
//! use tabular_transform::processing::{
//!     transform, AggregateFunction, Aggregation, Filter, FilterOperator, FilterValue, OrderSpec,
//!     PipelineConfig,
//! };
//! use tabular_transform::types::{Row, Value};
//!
//! let rows = vec![
//!     Row::from([("region", Value::from("north")), ("sales", Value::Int64(10))]),
//!     Row::from([("region", Value::from("south")), ("sales", Value::Int64(40))]),
//!     Row::from([("region", Value::from("north")), ("sales", Value::from("30"))]),
//!     Row::from([("region", Value::from("east")), ("sales", Value::Null)]),
//! ];
//!
//! let config = PipelineConfig {
//!     filters: vec![Filter::new("sales", FilterOperator::GreaterThan, FilterValue::scalar(5_i64))],
//!     group_by: vec!["region".to_string()],
//!     aggregations: vec![Aggregation::new("sales", AggregateFunction::Sum)],
//!     order_by: vec![OrderSpec::desc("sales_sum")],
//! };
//!
//! let out = transform(&rows, &config);
//! assert_eq!(out.len(), 2);
//! assert_eq!(out[0].value("region"), &Value::from("north"));
//! assert_eq!(out[0].value("sales_sum"), &Value::Float64(40.0));
//! ```

pub mod aggregate;
pub mod filter;
pub mod pipeline;
pub mod sort;

pub use aggregate::{group_and_aggregate, reduce, AggregateFunction, Aggregation, GroupKey};
pub use filter::{apply_filters, filter, Filter, FilterOperator, FilterValue};
pub use pipeline::{transform, transform_json, PipelineConfig};
pub use sort::{sort_rows, OrderSpec, SortDirection};
