#![cfg(feature = "excel")]

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Days, NaiveDate};

use crate::error::{IngestionError, IngestionResult};
use crate::types::{Row, Sheet, Value, Workbook, DATE_FORMAT};

use super::header::normalize_headers;

/// Read one worksheet (`sheet_name`, or the first one) of a spreadsheet file into a [`Sheet`].
///
/// Leading blank rows are skipped and the first non-blank row supplies the column names. Later
/// blank rows are dropped; remaining cells become typed [`Value`]s.
pub fn ingest_excel_from_path(path: impl AsRef<Path>, sheet_name: Option<&str>) -> IngestionResult<Sheet> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet = match sheet_name {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| IngestionError::InvalidInput {
                message: "workbook has no sheets".to_string(),
            })?,
    };
    let range = workbook.worksheet_range(&sheet)?;
    Ok(ingest_sheet_range(&sheet, &range))
}

/// Read several worksheets into a [`Workbook`], one [`Sheet`] each.
///
/// `None` reads every worksheet in workbook order; `Some(names)` reads just those, in the order
/// given. Each tab keeps its own header, and a blank tab yields a sheet with no columns.
pub fn ingest_excel_workbook_from_path(
    path: impl AsRef<Path>,
    sheet_names: Option<&[&str]>,
) -> IngestionResult<Workbook> {
    let mut workbook = open_workbook_auto(path)?;

    let names: Vec<String> = match sheet_names {
        Some(names) => names.iter().map(|name| (*name).to_owned()).collect(),
        None => workbook.sheet_names(),
    };
    if names.is_empty() {
        return Err(IngestionError::InvalidInput {
            message: "workbook has no sheets".to_string(),
        });
    }

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name)?;
        sheets.push(ingest_sheet_range(&name, &range));
    }

    Ok(Workbook::new(sheets))
}

fn ingest_sheet_range(sheet: &str, range: &calamine::Range<Data>) -> Sheet {
    let mut raw_rows = range
        .rows()
        .skip_while(|row| row.iter().all(|c| matches!(c, Data::Empty)));

    let Some(header) = raw_rows.next() else {
        return Sheet::new(sheet, Vec::new(), Vec::new());
    };
    let columns = normalize_headers(header.iter().map(|cell| convert_cell(cell).to_text()));

    let rows = raw_rows
        .filter(|row| row.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|cells| {
            let mut row = Row::with_capacity(columns.len());
            for (idx, column) in columns.iter().enumerate() {
                let cell = cells.get(idx).unwrap_or(&Data::Empty);
                row.insert(column.as_str(), convert_cell(cell));
            }
            row
        })
        .collect();

    Sheet::new(sheet, columns, rows)
}

// Largest integer an f64 holds exactly.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

fn convert_cell(c: &Data) -> Value {
    match c {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Value::Null
            } else {
                Value::Utf8(trimmed.to_owned())
            }
        }
        Data::Int(i) => Value::Int64(*i),
        // Spreadsheets store every number as a float; keep whole numbers integral.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < MAX_EXACT_INT => Value::Int64(*f as i64),
        Data::Float(f) => Value::Float64(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(Value::Date)
            .unwrap_or(Value::Float64(dt.as_f64())),
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok())
            .map(Value::Date)
            .unwrap_or_else(|| Value::Utf8(s.clone())),
        Data::DurationIso(s) => Value::Utf8(s.clone()),
    }
}

/// Convert an Excel 1900-system serial number to a calendar date (time of day dropped).
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    // Day 0 is 1899-12-30 once Excel's phantom 1900-02-29 is accounted for.
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_days(Days::new(serial.floor() as u64))
}

#[cfg(test)]
mod tests {
    use super::excel_serial_to_date;
    use chrono::NaiveDate;

    #[test]
    fn serial_numbers_map_to_dates() {
        assert_eq!(excel_serial_to_date(45292.0), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(excel_serial_to_date(45292.75), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(excel_serial_to_date(-1.0), None);
    }
}
