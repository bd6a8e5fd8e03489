//! CSV ingestion implementation.

use std::path::Path;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{Row, Sheet, Value};

use super::header::normalize_headers;

/// Ingest a CSV file into a [`Sheet`] named after the file stem.
///
/// Rules:
///
/// - CSV must have a header row; header names are normalized (blank → `column_N`, duplicates
///   suffixed).
/// - Each cell is typed with [`Value::infer_from_str`]; empty cells are null.
/// - Rows may be ragged: missing trailing cells are null, extra cells are dropped.
/// - Fully empty records are skipped.
pub fn ingest_csv_from_path(path: impl AsRef<Path>) -> IngestionResult<Sheet> {
    let path = path.as_ref();
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    ingest_csv_from_reader(&mut rdr, &sheet_name_from_path(path))
}

/// Ingest CSV data from an existing CSV reader.
///
/// The reader must be configured with `has_headers(true)`; build it with `flexible(true)` to
/// accept ragged rows.
pub fn ingest_csv_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
    sheet_name: &str,
) -> IngestionResult<Sheet> {
    let headers = rdr.headers()?.clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(IngestionError::InvalidInput {
            message: "csv has no header row".to_string(),
        });
    }
    let columns = normalize_headers(headers.iter());

    let mut rows: Vec<Row> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let mut row = Row::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            let raw = record.get(idx).unwrap_or("");
            row.insert(column.as_str(), Value::infer_from_str(raw));
        }
        rows.push(row);
    }

    Ok(Sheet::new(sheet_name, columns, rows))
}

pub(crate) fn sheet_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Sheet1".to_string())
}
