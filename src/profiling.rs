//! Column profiling for ingested sheets.
//!
//! A profile records, per column, the inferred [`DataType`], how many cells are null, how many
//! distinct non-null values appear, and a few sample values for previews.

use std::collections::HashSet;

use serde::Serialize;

use crate::processing::GroupKey;
use crate::types::{DataType, Row, Sheet, Value, Workbook};

/// Options for [`profile_sheet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileOptions {
    /// Maximum number of distinct sample values kept per column.
    pub sample_size: usize,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self { sample_size: 5 }
    }
}

/// Summary statistics for one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProfile {
    pub name: String,
    /// `None` when every cell is null.
    pub data_type: Option<DataType>,
    pub null_count: usize,
    pub unique_count: usize,
    /// First distinct non-null values, in row order.
    pub samples: Vec<Value>,
}

/// Profile of one sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProfile {
    pub name: String,
    pub row_count: usize,
    pub columns: Vec<ColumnProfile>,
}

/// Profile every column listed in `sheet.columns`.
///
/// A cell missing from a row counts as null.
pub fn profile_sheet(sheet: &Sheet, options: &ProfileOptions) -> SheetProfile {
    let columns = sheet
        .columns
        .iter()
        .map(|name| profile_column(name, &sheet.rows, options))
        .collect();

    SheetProfile {
        name: sheet.name.clone(),
        row_count: sheet.row_count(),
        columns,
    }
}

/// Profile every sheet of a workbook, in order.
pub fn profile_workbook(workbook: &Workbook, options: &ProfileOptions) -> Vec<SheetProfile> {
    workbook
        .sheets
        .iter()
        .map(|sheet| profile_sheet(sheet, options))
        .collect()
}

fn profile_column(name: &str, rows: &[Row], options: &ProfileOptions) -> ColumnProfile {
    let column = [name.to_string()];
    let mut null_count = 0;
    let mut distinct: HashSet<GroupKey> = HashSet::new();
    let mut samples = Vec::new();
    let mut data_type: Option<DataType> = None;

    for row in rows {
        let value = row.value(name);
        let Some(ty) = value.data_type() else {
            null_count += 1;
            continue;
        };
        data_type = Some(match data_type {
            None => ty,
            Some(prev) => widen(prev, ty),
        });
        if distinct.insert(GroupKey::from_row(row, &column)) && samples.len() < options.sample_size {
            samples.push(value.clone());
        }
    }

    ColumnProfile {
        name: name.to_string(),
        data_type,
        null_count,
        unique_count: distinct.len(),
        samples,
    }
}

/// Smallest type covering both `a` and `b`: integers widen to floats, anything else mixed is
/// text.
fn widen(a: DataType, b: DataType) -> DataType {
    match (a, b) {
        (a, b) if a == b => a,
        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => DataType::Float64,
        _ => DataType::Utf8,
    }
}

#[cfg(test)]
mod tests {
    use super::{profile_sheet, profile_workbook, ProfileOptions};
    use crate::types::{DataType, Row, Sheet, Value, Workbook};

    fn orders() -> Sheet {
        Sheet::new(
            "orders",
            vec!["id".into(), "amount".into(), "status".into(), "note".into()],
            vec![
                Row::from([("id", Value::Int64(1)), ("amount", Value::Int64(10)), ("status", Value::from("open"))]),
                Row::from([("id", Value::Int64(2)), ("amount", Value::Float64(2.5)), ("status", Value::from("open"))]),
                Row::from([("id", Value::Int64(3)), ("amount", Value::Null), ("status", Value::Bool(true))]),
            ],
        )
    }

    #[test]
    fn infers_widened_types() {
        let profile = profile_sheet(&orders(), &ProfileOptions::default());
        let types: Vec<Option<DataType>> = profile.columns.iter().map(|c| c.data_type).collect();
        assert_eq!(
            types,
            vec![Some(DataType::Int64), Some(DataType::Float64), Some(DataType::Utf8), None]
        );
    }

    #[test]
    fn counts_nulls_and_uniques() {
        let profile = profile_sheet(&orders(), &ProfileOptions::default());
        assert_eq!(profile.row_count, 3);

        let amount = &profile.columns[1];
        assert_eq!(amount.null_count, 1);
        assert_eq!(amount.unique_count, 2);

        let status = &profile.columns[2];
        assert_eq!(status.unique_count, 2);
        assert_eq!(status.samples, vec![Value::from("open"), Value::Bool(true)]);

        let note = &profile.columns[3];
        assert_eq!(note.null_count, 3);
        assert!(note.samples.is_empty());
    }

    #[test]
    fn integral_floats_count_once_with_integers() {
        let sheet = Sheet::new(
            "scores",
            vec!["score".into()],
            vec![
                Row::from([("score", Value::Int64(7))]),
                Row::from([("score", Value::Float64(7.0))]),
                Row::from([("score", Value::Float64(7.5))]),
            ],
        );
        let profile = profile_sheet(&sheet, &ProfileOptions::default());
        assert_eq!(profile.columns[0].unique_count, 2);
        assert_eq!(profile.columns[0].samples, vec![Value::Int64(7), Value::Float64(7.5)]);
    }

    #[test]
    fn samples_are_capped() {
        let opts = ProfileOptions { sample_size: 2 };
        let profile = profile_sheet(&orders(), &opts);
        assert_eq!(profile.columns[0].samples, vec![Value::Int64(1), Value::Int64(2)]);
        assert_eq!(profile.columns[0].unique_count, 3);
    }

    #[test]
    fn profiles_serialize_camel_case() {
        let profiles = profile_workbook(&Workbook::new(vec![orders()]), &ProfileOptions::default());
        let json = serde_json::to_value(&profiles[0].columns[0]).unwrap();
        assert_eq!(json["dataType"], "int64");
        assert_eq!(json["uniqueCount"], 3);
    }
}
