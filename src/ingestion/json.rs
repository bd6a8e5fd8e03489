//! JSON ingestion implementation.
//!
//! Supported inputs:
//! - A JSON array of objects: `[{"a":1}, {"a":2}]`
//! - A single JSON object: `{"a":1}`
//! - Newline-delimited JSON (NDJSON): `{"a":1}\n{"a":2}\n`
//!
//! Nested objects are flattened into dot-path columns (`{"user":{"name":"x"}}` → `user.name`).
//! Arrays are kept as their JSON text.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{Row, Sheet, Value};

use super::csv::sheet_name_from_path;

/// Ingest a JSON or NDJSON file into a [`Sheet`] named after the file stem.
pub fn ingest_json_from_path(path: impl AsRef<Path>) -> IngestionResult<Sheet> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    ingest_json_from_str(&text, &sheet_name_from_path(path))
}

/// Ingest JSON from an in-memory string into a [`Sheet`].
///
/// Columns are the union of all (flattened) keys, in first-seen order.
pub fn ingest_json_from_str(input: &str, sheet_name: &str) -> IngestionResult<Sheet> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(IngestionError::InvalidInput {
            message: "json input is empty".to_string(),
        });
    }

    // First try parsing as a single JSON value (array or object).
    let values = match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Array(items)) => items,
        Ok(v @ serde_json::Value::Object(_)) => vec![v],
        Ok(_) => {
            return Err(IngestionError::InvalidInput {
                message: "json must be an object, an array of objects, or NDJSON".to_string(),
            });
        }
        Err(_) => parse_ndjson(trimmed)?,
    };

    let mut columns: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut rows: Vec<Row> = Vec::with_capacity(values.len());

    for (idx0, v) in values.into_iter().enumerate() {
        let serde_json::Value::Object(obj) = v else {
            return Err(IngestionError::InvalidInput {
                message: format!("row {} is not a json object", idx0 + 1),
            });
        };

        let mut row = Row::with_capacity(obj.len());
        flatten_into(&mut row, None, obj);
        for column in row.columns() {
            if seen.insert(column.to_owned()) {
                columns.push(column.to_owned());
            }
        }
        rows.push(row);
    }

    Ok(Sheet::new(sheet_name, columns, rows))
}

fn parse_ndjson(input: &str) -> IngestionResult<Vec<serde_json::Value>> {
    let mut values = Vec::new();
    for (i, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let v = serde_json::from_str::<serde_json::Value>(line).map_err(|e| {
            IngestionError::InvalidInput {
                message: format!("invalid ndjson at line {}: {}", i + 1, e),
            }
        })?;
        values.push(v);
    }
    Ok(values)
}

fn flatten_into(row: &mut Row, prefix: Option<&str>, obj: serde_json::Map<String, serde_json::Value>) {
    for (key, value) in obj {
        let column = match prefix {
            Some(p) => format!("{p}.{key}"),
            None => key,
        };
        match value {
            serde_json::Value::Object(nested) => flatten_into(row, Some(column.as_str()), nested),
            leaf => row.insert(column, Value::from(leaf)),
        }
    }
}
