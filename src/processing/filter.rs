//! Row filtering.
//!
//! Declarative [`Filter`]s are evaluated per row against `row[column]`; a missing column reads
//! as [`Value::Null`]. Multiple filters combine with logical AND in the order given.

use serde::{Deserialize, Serialize};

use crate::types::{Row, Value};

/// Comparison applied by a [`Filter`].
///
/// Operator names are `snake_case` on the JSON boundary. Any unrecognised name deserializes to
/// [`FilterOperator::Unknown`], which keeps every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    /// Loose equality (`"5"` equals `5`).
    Equals,
    /// Negated loose equality.
    NotEquals,
    /// Case-insensitive substring match on the text renderings.
    Contains,
    /// Negated case-insensitive substring match.
    NotContains,
    /// Numeric `cell > value`.
    GreaterThan,
    /// Numeric `cell < value`.
    LessThan,
    /// Numeric `lo <= cell <= hi`, inclusive on both ends.
    Between,
    /// Loose membership in a list.
    In,
    /// Negated loose membership in a list.
    NotIn,
    /// Unrecognised operator; the predicate always holds.
    #[default]
    #[serde(other)]
    Unknown,
}

/// Right-hand side of a [`Filter`]: a scalar or a list of scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// A list, used by `between` (`[lo, hi]`), `in` and `not_in`.
    List(Vec<Value>),
    /// A single value.
    Scalar(Value),
}

impl Default for FilterValue {
    fn default() -> Self {
        FilterValue::Scalar(Value::Null)
    }
}

impl FilterValue {
    /// Build a scalar filter value.
    pub fn scalar(v: impl Into<Value>) -> Self {
        FilterValue::Scalar(v.into())
    }

    /// Build a list filter value.
    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        FilterValue::List(values.into_iter().map(Into::into).collect())
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            FilterValue::Scalar(v) => v.as_number(),
            FilterValue::List(_) => None,
        }
    }

    fn to_text(&self) -> String {
        match self {
            FilterValue::Scalar(v) => v.to_text(),
            FilterValue::List(items) => items
                .iter()
                .map(Value::to_text)
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

impl From<Value> for FilterValue {
    fn from(v: Value) -> Self {
        FilterValue::Scalar(v)
    }
}

impl From<Vec<Value>> for FilterValue {
    fn from(v: Vec<Value>) -> Self {
        FilterValue::List(v)
    }
}

/// A single row predicate: `row[column] <operator> value`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Filter {
    pub column: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

impl Filter {
    /// Create a filter.
    pub fn new(column: impl Into<String>, operator: FilterOperator, value: FilterValue) -> Self {
        Self {
            column: column.into(),
            operator,
            value,
        }
    }

    /// Evaluate this filter against `row`.
    ///
    /// Never fails: non-numeric operands make numeric comparisons false, and `in` / `not_in`
    /// with a non-list value are both false.
    pub fn matches(&self, row: &Row) -> bool {
        let cell = row.value(&self.column);
        match self.operator {
            FilterOperator::Equals => self.scalar_eq(cell),
            FilterOperator::NotEquals => !self.scalar_eq(cell),
            FilterOperator::Contains => self.contains(cell),
            FilterOperator::NotContains => !self.contains(cell),
            FilterOperator::GreaterThan => match (cell.as_number(), self.value.as_number()) {
                (Some(c), Some(v)) => c > v,
                _ => false,
            },
            FilterOperator::LessThan => match (cell.as_number(), self.value.as_number()) {
                (Some(c), Some(v)) => c < v,
                _ => false,
            },
            FilterOperator::Between => match &self.value {
                FilterValue::List(bounds) if bounds.len() == 2 => {
                    match (cell.as_number(), bounds[0].as_number(), bounds[1].as_number()) {
                        (Some(c), Some(lo), Some(hi)) => lo <= c && c <= hi,
                        _ => false,
                    }
                }
                _ => false,
            },
            FilterOperator::In => match &self.value {
                FilterValue::List(items) => items.iter().any(|v| cell.loose_eq(v)),
                FilterValue::Scalar(_) => false,
            },
            // A non-list value is false here too, mirroring `in` rather than negating it.
            FilterOperator::NotIn => match &self.value {
                FilterValue::List(items) => !items.iter().any(|v| cell.loose_eq(v)),
                FilterValue::Scalar(_) => false,
            },
            FilterOperator::Unknown => true,
        }
    }

    fn scalar_eq(&self, cell: &Value) -> bool {
        match &self.value {
            FilterValue::Scalar(v) => cell.loose_eq(v),
            FilterValue::List(_) => false,
        }
    }

    fn contains(&self, cell: &Value) -> bool {
        let haystack = cell.to_text().to_lowercase();
        let needle = self.value.to_text().to_lowercase();
        haystack.contains(&needle)
    }
}

/// Returns the rows for which `predicate` returns `true`, preserving order.
pub fn filter<F>(rows: &[Row], mut predicate: F) -> Vec<Row>
where
    F: FnMut(&Row) -> bool,
{
    rows.iter().filter(|row| predicate(row)).cloned().collect()
}

/// Returns the rows that satisfy every filter in `filters`.
///
/// An empty filter list keeps all rows.
pub fn apply_filters(rows: &[Row], filters: &[Filter]) -> Vec<Row> {
    filter(rows, |row| filters.iter().all(|f| f.matches(row)))
}

#[cfg(test)]
mod tests {
    use super::{apply_filters, filter, Filter, FilterOperator, FilterValue};
    use crate::types::{Row, Value};

    fn a_rows() -> Vec<Row> {
        vec![
            Row::from([("a", 1_i64)]),
            Row::from([("a", 2_i64)]),
            Row::from([("a", 3_i64)]),
        ]
    }

    fn people() -> Vec<Row> {
        vec![
            Row::from([("name", Value::from("Ada Lovelace")), ("age", Value::from("36"))]),
            Row::from([("name", Value::from("Grace Hopper")), ("age", Value::Int64(85))]),
            Row::from([("name", Value::from("Alan Turing")), ("age", Value::Null)]),
        ]
    }

    fn names(rows: &[Row]) -> Vec<String> {
        rows.iter().map(|r| r.value("name").to_text()).collect()
    }

    #[test]
    fn greater_than_keeps_larger_values() {
        let f = Filter::new("a", FilterOperator::GreaterThan, FilterValue::scalar(1_i64));
        let out = apply_filters(&a_rows(), &[f]);
        assert_eq!(out, vec![Row::from([("a", 2_i64)]), Row::from([("a", 3_i64)])]);
    }

    #[test]
    fn between_is_inclusive() {
        let f = Filter::new("a", FilterOperator::Between, FilterValue::list([2_i64, 3]));
        let out = apply_filters(&a_rows(), &[f]);
        assert_eq!(out, vec![Row::from([("a", 2_i64)]), Row::from([("a", 3_i64)])]);
    }

    #[test]
    fn between_requires_two_bounds() {
        let f = Filter::new("a", FilterOperator::Between, FilterValue::scalar(2_i64));
        assert!(apply_filters(&a_rows(), &[f]).is_empty());
    }

    #[test]
    fn equals_uses_loose_equality() {
        let f = Filter::new("age", FilterOperator::Equals, FilterValue::scalar(36_i64));
        assert_eq!(names(&apply_filters(&people(), &[f])), vec!["Ada Lovelace"]);

        let f = Filter::new("age", FilterOperator::NotEquals, FilterValue::scalar(36_i64));
        assert_eq!(
            names(&apply_filters(&people(), &[f])),
            vec!["Grace Hopper", "Alan Turing"]
        );
    }

    #[test]
    fn contains_is_case_insensitive() {
        let f = Filter::new("name", FilterOperator::Contains, FilterValue::scalar("HOPPER"));
        assert_eq!(names(&apply_filters(&people(), &[f])), vec!["Grace Hopper"]);

        let f = Filter::new("name", FilterOperator::NotContains, FilterValue::scalar("a"));
        assert!(apply_filters(&people(), &[f]).is_empty());
    }

    #[test]
    fn numeric_comparison_with_null_is_false() {
        let lt = Filter::new("age", FilterOperator::LessThan, FilterValue::scalar(100_i64));
        assert_eq!(
            names(&apply_filters(&people(), &[lt])),
            vec!["Ada Lovelace", "Grace Hopper"]
        );
    }

    #[test]
    fn in_and_not_in_need_a_list() {
        let list = FilterValue::list(["36", "85"]);
        let f = Filter::new("age", FilterOperator::In, list.clone());
        assert_eq!(
            names(&apply_filters(&people(), &[f])),
            vec!["Ada Lovelace", "Grace Hopper"]
        );

        let f = Filter::new("age", FilterOperator::NotIn, list);
        assert_eq!(names(&apply_filters(&people(), &[f])), vec!["Alan Turing"]);

        let f = Filter::new("age", FilterOperator::In, FilterValue::scalar(36_i64));
        assert!(apply_filters(&people(), &[f]).is_empty());
        let f = Filter::new("age", FilterOperator::NotIn, FilterValue::scalar(36_i64));
        assert!(apply_filters(&people(), &[f]).is_empty());
    }

    #[test]
    fn unknown_operator_keeps_rows() {
        let f: Filter =
            serde_json::from_str(r#"{"column":"a","operator":"starts_with","value":"x"}"#).unwrap();
        assert_eq!(f.operator, FilterOperator::Unknown);
        assert_eq!(apply_filters(&a_rows(), &[f]).len(), 3);
    }

    #[test]
    fn missing_column_reads_as_null() {
        let f = Filter::new("missing", FilterOperator::Equals, FilterValue::scalar(Value::Null));
        assert_eq!(apply_filters(&a_rows(), &[f]).len(), 3);
    }

    #[test]
    fn filters_combine_with_and() {
        let filters = vec![
            Filter::new("a", FilterOperator::GreaterThan, FilterValue::scalar(1_i64)),
            Filter::new("a", FilterOperator::LessThan, FilterValue::scalar(3_i64)),
        ];
        assert_eq!(apply_filters(&a_rows(), &filters), vec![Row::from([("a", 2_i64)])]);
    }

    #[test]
    fn filter_by_closure_can_return_empty() {
        let rows = a_rows();
        assert!(filter(&rows, |_| false).is_empty());
        assert_eq!(rows.len(), 3);
    }
}
