//! Grouping and aggregation.
//!
//! Rows are partitioned by a structured [`GroupKey`] (the typed tuple of group-by values), so a
//! numeric group column stays numeric in the output and differently-typed values never collide.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Row, Value};

/// Built-in aggregation functions over the numeric-coercible values of a column.
///
/// An unrecognised or missing name deserializes to [`AggregateFunction::Unknown`]; such
/// aggregations are skipped when grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunction {
    /// Sum of values; `0` for an empty set.
    Sum,
    /// Arithmetic mean.
    Avg,
    /// Number of numeric-coercible values (not the number of rows).
    Count,
    /// Minimum value.
    Min,
    /// Maximum value.
    Max,
    /// Middle value; mean of the two central values for even counts.
    Median,
    /// Population standard deviation (divides by `n`).
    StdDev,
    /// Unrecognised function; evaluates to null.
    #[serde(other)]
    Unknown,
}

impl AggregateFunction {
    /// The `snake_case` name used in output column names.
    pub fn name(self) -> &'static str {
        match self {
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Count => "count",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::Median => "median",
            AggregateFunction::StdDev => "std_dev",
            AggregateFunction::Unknown => "unknown",
        }
    }

    /// Apply the function to already-coerced values.
    ///
    /// - `Sum` returns `Float64(0.0)` and `Count` returns `Int64(0)` for an empty input.
    /// - Every other function returns [`Value::Null`] for an empty input.
    pub fn apply(self, values: &[f64]) -> Value {
        match self {
            AggregateFunction::Sum => Value::Float64(values.iter().sum()),
            AggregateFunction::Count => Value::Int64(values.len() as i64),
            AggregateFunction::Unknown => Value::Null,
            _ if values.is_empty() => Value::Null,
            AggregateFunction::Avg => Value::Float64(mean(values)),
            AggregateFunction::Min => Value::Float64(values.iter().copied().fold(f64::INFINITY, f64::min)),
            AggregateFunction::Max => {
                Value::Float64(values.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            }
            AggregateFunction::Median => {
                let mut sorted = values.to_vec();
                sorted.sort_by(f64::total_cmp);
                let mid = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    Value::Float64((sorted[mid - 1] + sorted[mid]) / 2.0)
                } else {
                    Value::Float64(sorted[mid])
                }
            }
            AggregateFunction::StdDev => {
                let m = mean(values);
                let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
                Value::Float64(var.sqrt())
            }
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// One aggregation: `function` applied to `column` within each group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    #[serde(default)]
    pub column: String,
    #[serde(default = "unknown_function")]
    pub function: AggregateFunction,
}

fn unknown_function() -> AggregateFunction {
    AggregateFunction::Unknown
}

impl Aggregation {
    /// Create an aggregation.
    pub fn new(column: impl Into<String>, function: AggregateFunction) -> Self {
        Self {
            column: column.into(),
            function,
        }
    }

    /// Output column name: `<column>_<function>`.
    pub fn output_column(&self) -> String {
        format!("{}_{}", self.column, self.function.name())
    }

    fn evaluate<'a>(&self, rows: impl Iterator<Item = &'a Row>) -> Value {
        let values: Vec<f64> = rows
            .filter_map(|row| row.value(&self.column).as_number())
            .collect();
        self.function.apply(&values)
    }
}

/// Hashable identity of one group-by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyPart {
    Null,
    Int(i64),
    Float(u64),
    Bool(bool),
    Text(String),
    Date(NaiveDate),
}

impl From<&Value> for KeyPart {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => KeyPart::Null,
            Value::Int64(i) => KeyPart::Int(*i),
            Value::Float64(f) => match integral(*f) {
                Some(i) => KeyPart::Int(i),
                None => KeyPart::Float(float_key(*f)),
            },
            Value::Bool(b) => KeyPart::Bool(*b),
            Value::Utf8(s) => KeyPart::Text(s.clone()),
            Value::Date(d) => KeyPart::Date(*d),
        }
    }
}

// `1.0` groups with `1`.
fn integral(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound.
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

// All NaNs share a group.
fn float_key(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else {
        f.to_bits()
    }
}

/// The tuple of group-by values identifying a partition of rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey(Vec<KeyPart>);

impl GroupKey {
    /// Build the key of `row` for the given group-by columns (missing columns read as null).
    pub fn from_row(row: &Row, columns: &[String]) -> Self {
        GroupKey(columns.iter().map(|c| KeyPart::from(row.value(c))).collect())
    }
}

struct Group<'a> {
    key_values: Vec<Value>,
    rows: Vec<&'a Row>,
}

/// Partition `rows` by `group_by` and compute `aggregations` per group.
///
/// - If `group_by` is empty, rows pass through unchanged and `aggregations` are ignored.
/// - Groups are emitted in first-seen order of their keys.
/// - Aggregations with an [`AggregateFunction::Unknown`] function add no column.
/// - Each output row holds the group-by columns followed by one `<column>_<function>` field per
///   aggregation.
pub fn group_and_aggregate(rows: &[Row], group_by: &[String], aggregations: &[Aggregation]) -> Vec<Row> {
    if group_by.is_empty() {
        return rows.to_vec();
    }

    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<Group<'_>> = Vec::new();

    for row in rows {
        match index.entry(GroupKey::from_row(row, group_by)) {
            Entry::Occupied(e) => groups[*e.get()].rows.push(row),
            Entry::Vacant(e) => {
                e.insert(groups.len());
                groups.push(Group {
                    key_values: group_by.iter().map(|c| row.value(c).clone()).collect(),
                    rows: vec![row],
                });
            }
        }
    }

    log::trace!("grouped {} rows into {} groups", rows.len(), groups.len());

    groups
        .into_iter()
        .map(|group| {
            let mut out = Row::with_capacity(group_by.len() + aggregations.len());
            for (column, value) in group_by.iter().zip(group.key_values) {
                out.insert(column.as_str(), value);
            }
            for agg in aggregations.iter().filter(|a| a.function != AggregateFunction::Unknown) {
                out.insert(agg.output_column(), agg.evaluate(group.rows.iter().copied()));
            }
            out
        })
        .collect()
}

/// Aggregate `column` over all rows without grouping.
///
/// Useful for single-number statistical summaries; follows the same empty-set rules as
/// [`AggregateFunction::apply`].
pub fn reduce(rows: &[Row], column: &str, function: AggregateFunction) -> Value {
    Aggregation::new(column, function).evaluate(rows.iter())
}
