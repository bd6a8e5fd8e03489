//! Pipeline driver: filter → group/aggregate → sort.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::types::Row;

use super::aggregate::{group_and_aggregate, AggregateFunction, Aggregation};
use super::filter::{apply_filters, Filter, FilterOperator, FilterValue};
use super::sort::{sort_rows, OrderSpec, SortDirection};

/// Declarative configuration of one [`transform`] call.
///
/// Every section is optional; the default configuration is the identity pipeline. On the JSON
/// boundary the fields are `filters`, `groupBy`, `aggregations` and `orderBy`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    pub filters: Vec<Filter>,
    pub group_by: Vec<String>,
    pub aggregations: Vec<Aggregation>,
    pub order_by: Vec<OrderSpec>,
}

impl PipelineConfig {
    /// Check the configuration's shape before handing it to [`transform`].
    ///
    /// [`transform`] tolerates every problem reported here by degrading (keeping rows, yielding
    /// nulls); callers that would rather reject a bad request should validate first.
    pub fn validate(&self) -> PipelineResult<()> {
        for (i, f) in self.filters.iter().enumerate() {
            if f.column.trim().is_empty() {
                return Err(invalid(format!("filters[{i}]: column is empty")));
            }
            match (f.operator, &f.value) {
                (FilterOperator::Unknown, _) => {
                    return Err(invalid(format!("filters[{i}]: unknown operator")));
                }
                (FilterOperator::Between, FilterValue::List(bounds)) if bounds.len() == 2 => {}
                (FilterOperator::Between, _) => {
                    return Err(invalid(format!(
                        "filters[{i}]: 'between' needs a [low, high] list"
                    )));
                }
                (FilterOperator::In | FilterOperator::NotIn, FilterValue::Scalar(_)) => {
                    return Err(invalid(format!("filters[{i}]: '{:?}' needs a list value", f.operator)));
                }
                _ => {}
            }
        }

        if let Some(i) = self.group_by.iter().position(|c| c.trim().is_empty()) {
            return Err(invalid(format!("groupBy[{i}]: column is empty")));
        }

        if !self.aggregations.is_empty() && self.group_by.is_empty() {
            return Err(invalid(
                "aggregations are ignored without groupBy".to_string(),
            ));
        }
        for (i, a) in self.aggregations.iter().enumerate() {
            if a.column.trim().is_empty() {
                return Err(invalid(format!("aggregations[{i}]: column is empty")));
            }
            if a.function == AggregateFunction::Unknown {
                return Err(invalid(format!("aggregations[{i}]: unknown or missing function")));
            }
        }

        for (i, o) in self.order_by.iter().enumerate() {
            if o.column.trim().is_empty() {
                return Err(invalid(format!("orderBy[{i}]: column is empty")));
            }
            if o.direction == SortDirection::Unknown {
                return Err(invalid(format!("orderBy[{i}]: direction must be 'asc' or 'desc'")));
            }
        }

        Ok(())
    }
}

fn invalid(message: String) -> PipelineError {
    PipelineError::InvalidConfig { message }
}

/// Run the pipeline over `rows`.
///
/// Stages run strictly in order, each consuming the previous stage's full output:
///
/// 1. filters (AND), skipped when empty
/// 2. group + aggregate, pass-through when `group_by` is empty
/// 3. sort, skipped when `order_by` is empty
///
/// Pure and infallible: the same input always yields the same output, and `rows` is never
/// modified.
///
/// ```rust
/// use tabular_transform::processing::{transform, AggregateFunction, Aggregation, PipelineConfig};
/// use tabular_transform::types::{Row, Value};
///
/// let rows = vec![
///     Row::from([("g", Value::from("x")), ("v", Value::Int64(10))]),
///     Row::from([("g", Value::from("x")), ("v", Value::Int64(20))]),
///     Row::from([("g", Value::from("y")), ("v", Value::Int64(5))]),
/// ];
/// let config = PipelineConfig {
///     group_by: vec!["g".to_string()],
///     aggregations: vec![Aggregation::new("v", AggregateFunction::Sum)],
///     ..Default::default()
/// };
///
/// let out = transform(&rows, &config);
/// assert_eq!(out.len(), 2);
/// assert_eq!(out[0].value("v_sum"), &Value::Float64(30.0));
/// ```
pub fn transform(rows: &[Row], config: &PipelineConfig) -> Vec<Row> {
    let filtered = if config.filters.is_empty() {
        rows.to_vec()
    } else {
        apply_filters(rows, &config.filters)
    };
    log::debug!(
        "filter stage: {} of {} rows kept by {} filters",
        filtered.len(),
        rows.len(),
        config.filters.len()
    );

    let mut grouped = if config.group_by.is_empty() {
        filtered
    } else {
        group_and_aggregate(&filtered, &config.group_by, &config.aggregations)
    };
    log::debug!(
        "group stage: {} output rows ({} group-by columns, {} aggregations)",
        grouped.len(),
        config.group_by.len(),
        config.aggregations.len()
    );

    sort_rows(&mut grouped, &config.order_by);
    grouped
}

/// JSON boundary for [`transform`], as consumed by a REST handler.
///
/// - `rows` must be a JSON array of objects; anything else is [`PipelineError::InvalidRows`].
/// - `config` must deserialize into a [`PipelineConfig`] (`null` means the identity pipeline).
///
/// Returns the output rows as a JSON array of objects.
pub fn transform_json(
    rows: &serde_json::Value,
    config: &serde_json::Value,
) -> PipelineResult<serde_json::Value> {
    let items = rows.as_array().ok_or_else(|| PipelineError::InvalidRows {
        message: format!("expected an array of objects, got {}", json_kind(rows)),
    })?;

    let mut parsed: Vec<Row> = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        if !item.is_object() {
            return Err(PipelineError::InvalidRows {
                message: format!("rows[{i}] is {}, expected an object", json_kind(item)),
            });
        }
        parsed.push(Row::deserialize(item)?);
    }

    let config = if config.is_null() {
        PipelineConfig::default()
    } else {
        PipelineConfig::deserialize(config)?
    };

    let out = transform(&parsed, &config);
    Ok(serde_json::to_value(out)?)
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{transform, transform_json, PipelineConfig};
    use crate::error::PipelineError;
    use crate::processing::{AggregateFunction, Aggregation, Filter, FilterOperator, FilterValue, OrderSpec};
    use crate::types::{Row, Value};

    fn regions() -> Vec<Row> {
        vec![
            Row::from([("region", Value::from("north")), ("sales", Value::Int64(10))]),
            Row::from([("region", Value::from("south")), ("sales", Value::Int64(40))]),
            Row::from([("region", Value::from("north")), ("sales", Value::Int64(30))]),
            Row::from([("region", Value::from("east")), ("sales", Value::from("n/a"))]),
            Row::from([("region", Value::from("south")), ("sales", Value::Int64(2))]),
        ]
    }

    #[test]
    fn default_config_is_identity() {
        let rows = regions();
        assert_eq!(transform(&rows, &PipelineConfig::default()), rows);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let config = PipelineConfig {
            filters: vec![Filter::new("a", FilterOperator::Equals, FilterValue::scalar(1_i64))],
            group_by: vec!["a".to_string()],
            aggregations: vec![Aggregation::new("b", AggregateFunction::Avg)],
            order_by: vec![OrderSpec::desc("a")],
        };
        assert!(transform(&[], &config).is_empty());
    }

    #[test]
    fn stages_run_in_order() {
        let config = PipelineConfig {
            filters: vec![Filter::new("region", FilterOperator::NotEquals, FilterValue::scalar("east"))],
            group_by: vec!["region".to_string()],
            aggregations: vec![
                Aggregation::new("sales", AggregateFunction::Sum),
                Aggregation::new("sales", AggregateFunction::Count),
            ],
            order_by: vec![OrderSpec::desc("sales_sum")],
        };
        let out = transform(&regions(), &config);
        assert_eq!(
            out,
            vec![
                Row::from([
                    ("region", Value::from("south")),
                    ("sales_sum", Value::Float64(42.0)),
                    ("sales_count", Value::Int64(2)),
                ]),
                Row::from([
                    ("region", Value::from("north")),
                    ("sales_sum", Value::Float64(40.0)),
                    ("sales_count", Value::Int64(2)),
                ]),
            ]
        );
    }

    #[test]
    fn aggregations_without_group_by_are_ignored() {
        let rows = regions();
        let config = PipelineConfig {
            aggregations: vec![Aggregation::new("sales", AggregateFunction::Sum)],
            ..Default::default()
        };
        assert_eq!(transform(&rows, &config), rows);
    }

    #[test]
    fn config_deserializes_from_camel_case_json() {
        let config: PipelineConfig = serde_json::from_value(json!({
            "filters": [{"column": "sales", "operator": "greater_than", "value": 5}],
            "groupBy": ["region"],
            "aggregations": [{"column": "sales", "function": "median"}],
            "orderBy": [{"column": "region"}]
        }))
        .unwrap();
        assert_eq!(config.group_by, vec!["region".to_string()]);
        assert_eq!(config.order_by, vec![OrderSpec::asc("region")]);
        assert_eq!(config.filters[0].value, FilterValue::scalar(5_i64));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_reports_shape_errors() {
        let bad = [
            json!({"filters": [{"operator": "equals", "value": 1}]}),
            json!({"filters": [{"column": "a", "operator": "like", "value": 1}]}),
            json!({"filters": [{"column": "a", "operator": "between", "value": [1]}]}),
            json!({"filters": [{"column": "a", "operator": "in", "value": 1}]}),
            json!({"aggregations": [{"column": "a", "function": "sum"}]}),
            json!({"orderBy": [{"direction": "desc"}]}),
            json!({"groupBy": ["g"], "aggregations": [{"column": "a", "function": "mode"}]}),
            json!({"groupBy": ["g"], "aggregations": [{"column": "a"}]}),
            json!({"orderBy": [{"column": "a", "direction": "sideways"}]}),
        ];
        for cfg in bad {
            let config: PipelineConfig = serde_json::from_value(cfg.clone()).unwrap();
            match config.validate() {
                Err(PipelineError::InvalidConfig { .. }) => {}
                other => panic!("expected InvalidConfig for {cfg}, got {other:?}"),
            }
        }
    }

    #[test]
    fn transform_json_round_trips_rows() {
        let out = transform_json(
            &json!([{"g": "x", "v": 10}, {"g": "x", "v": 20}, {"g": "y", "v": 5}]),
            &json!({"groupBy": ["g"], "aggregations": [{"column": "v", "function": "sum"}]}),
        )
        .unwrap();
        assert_eq!(out, json!([{"g": "x", "v_sum": 30.0}, {"g": "y", "v_sum": 5.0}]));
    }

    #[test]
    fn transform_json_rejects_non_array_rows() {
        let err = transform_json(&json!({"a": 1}), &json!({})).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRows { .. }));
        assert!(err.to_string().contains("an object"));

        let err = transform_json(&json!([{"a": 1}, 2]), &json!(null)).unwrap_err();
        assert!(err.to_string().contains("rows[1]"));
    }

    #[test]
    fn transform_json_degrades_on_unrecognised_names() {
        let rows = json!([{"g": "x", "v": 1}, {"g": "y", "v": 4}, {"g": "x", "v": 2}]);
        let out = transform_json(
            &rows,
            &json!({
                "groupBy": ["g"],
                "aggregations": [
                    {"column": "v", "function": "mode"},
                    {"column": "v"},
                    {"column": "v", "function": "max"}
                ],
                "orderBy": [{"column": "v_max", "direction": "DESC"}]
            }),
        )
        .unwrap();
        assert_eq!(out, json!([{"g": "y", "v_max": 4.0}, {"g": "x", "v_max": 2.0}]));

        let out = transform_json(&rows, &json!({"orderBy": [{"column": "v", "direction": "up"}]})).unwrap();
        assert_eq!(out, json!([{"g": "x", "v": 1}, {"g": "x", "v": 2}, {"g": "y", "v": 4}]));
    }

    #[test]
    fn transform_json_groups_integral_floats_with_integers() {
        let out = transform_json(
            &json!([{"k": 1, "v": 2}, {"k": 1.0, "v": 3}]),
            &json!({"groupBy": ["k"], "aggregations": [{"column": "v", "function": "sum"}]}),
        )
        .unwrap();
        assert_eq!(out, json!([{"k": 1, "v_sum": 5.0}]));
    }

    #[test]
    fn transform_json_rejects_malformed_config() {
        let err = transform_json(&json!([]), &json!({"groupBy": "region"})).unwrap_err();
        assert!(matches!(err, PipelineError::Json(_)));
    }
}
