//! Core data model types.
//!
//! Cells are typed [`Value`]s, a [`Row`] is an ordered column → value mapping, and ingestion
//! groups rows into named [`Sheet`]s inside a [`Workbook`].
//!
//! All loose-typing rules (numeric coercion, text rendering, loose equality, sort order) are
//! defined here on [`Value`] so that filters, aggregations and sorting agree with each other.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// ISO date format used for parsing and rendering [`Value::Date`].
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Logical data type of a cell or an inferred column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
    /// Calendar date.
    Date,
}

/// A single typed cell value.
///
/// On the JSON boundary a `Value` maps to `null`, a boolean, a number or a string. Dates are
/// written as `YYYY-MM-DD` strings; reading JSON never produces [`Value::Date`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    /// Missing/empty value.
    #[default]
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
    /// Calendar date.
    Date(NaiveDate),
}

static NULL: Value = Value::Null;

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The logical type of this value, or `None` for null.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Int64(_) => Some(DataType::Int64),
            Value::Float64(_) => Some(DataType::Float64),
            Value::Bool(_) => Some(DataType::Bool),
            Value::Utf8(_) => Some(DataType::Utf8),
            Value::Date(_) => Some(DataType::Date),
        }
    }

    /// Infer a typed value from raw cell text.
    ///
    /// Tries, in order: empty → null, integer, finite float, `true`/`false`, ISO date, text.
    pub fn infer_from_str(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Value::Int64(i);
        }
        if let Some(f) = parse_finite(trimmed) {
            return Value::Float64(f);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            _ => {}
        }
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
            return Value::Date(d);
        }
        Value::Utf8(trimmed.to_owned())
    }

    /// Best-effort numeric coercion.
    ///
    /// - integers and floats convert directly (NaN is non-numeric)
    /// - booleans are `1` / `0`
    /// - text is trimmed and parsed; empty or non-finite text is non-numeric
    /// - null and dates are non-numeric
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int64(i) => Some(*i as f64),
            Value::Float64(f) if f.is_nan() => None,
            Value::Float64(f) => Some(*f),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Utf8(s) => parse_finite(s.trim()),
            Value::Null | Value::Date(_) => None,
        }
    }

    /// Render the value as text. Null renders as the empty string.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Int64(i) => i.to_string(),
            Value::Float64(f) => format_float(*f),
            Value::Bool(b) => b.to_string(),
            Value::Utf8(s) => s.clone(),
            Value::Date(d) => d.format(DATE_FORMAT).to_string(),
        }
    }

    /// Loose equality: `"5"` equals `5`, `1.0` equals `1`, null equals only null.
    ///
    /// Two texts compare as text. Otherwise, if both sides coerce to numbers they compare
    /// numerically. If only one side does, they differ (`true` is not `"true"`). If neither
    /// does, their text renderings are compared, so a date equals its `YYYY-MM-DD` text.
    /// NaN equals nothing.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Float64(f), _) | (_, Value::Float64(f)) if f.is_nan() => false,
            (Value::Utf8(a), Value::Utf8(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a == b,
                (None, None) => self.to_text() == other.to_text(),
                _ => false,
            },
        }
    }

    /// Total ordering used for sorting.
    ///
    /// Values are ranked by class first: numbers (including booleans) < dates < text < null.
    /// Within a class, numbers compare numerically, dates chronologically and text
    /// lexicographically.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        let (ra, rb) = (self.sort_class(), other.sort_class());
        if ra != rb {
            return ra.cmp(&rb);
        }
        match (self, other) {
            (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Utf8(a), Value::Utf8(b)) => a.cmp(b),
            (Value::Null, Value::Null) => Ordering::Equal,
            _ => self.sort_number().total_cmp(&other.sort_number()),
        }
    }

    fn sort_class(&self) -> u8 {
        match self {
            Value::Int64(_) | Value::Float64(_) | Value::Bool(_) => 0,
            Value::Date(_) => 1,
            Value::Utf8(_) => 2,
            Value::Null => 3,
        }
    }

    fn sort_number(&self) -> f64 {
        match self {
            Value::Int64(i) => *i as f64,
            Value::Float64(f) => *f,
            Value::Bool(b) => f64::from(u8::from(*b)),
            _ => f64::NAN,
        }
    }
}

fn parse_finite(s: &str) -> Option<f64> {
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        (f as i64).to_string()
    } else {
        f.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int64(i),
                None => n.as_f64().map(Value::Float64).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::Utf8(s),
            other @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                Value::Utf8(other.to_string())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Int64(i) => serde_json::Value::from(i),
            // JSON has no NaN/inf; those become null.
            Value::Float64(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Utf8(s) => serde_json::Value::String(s),
            Value::Date(d) => serde_json::Value::String(d.format(DATE_FORMAT).to_string()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Utf8(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Utf8(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

/// One flat record: an ordered mapping from column name to [`Value`].
///
/// Rows in one sequence need not share the same columns; reading an absent column yields
/// [`Value::Null`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty row with room for `n` columns.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            fields: Vec::with_capacity(n),
        }
    }

    /// Returns the value of `column`, if present.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    /// Returns the value of `column`, or [`Value::Null`] when the column is absent.
    pub fn value(&self, column: &str) -> &Value {
        self.get(column).unwrap_or(&NULL)
    }

    /// Set `column` to `value`, replacing an existing entry in place or appending a new one.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Iterate column names in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Iterate `(column, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, v)| (name.as_str(), v))
    }

    /// Number of columns present in this row.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Row
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = Row;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping column names to scalar values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
                let mut row = Row::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((k, v)) = access.next_entry::<String, Value>()? {
                    row.insert(k, v);
                }
                Ok(row)
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

/// A named list of rows, e.g. one worksheet of an uploaded workbook.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sheet {
    /// Sheet name (worksheet tab name, or the file stem for CSV/JSON).
    pub name: String,
    /// Column names in header order.
    pub columns: Vec<String>,
    /// Rows in file order.
    pub rows: Vec<Row>,
}

impl Sheet {
    /// Create a sheet.
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// Number of rows in the sheet.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// The parsed content of one uploaded file: sheet name → rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Workbook {
    /// Sheets in workbook order.
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Create a workbook from sheets.
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Returns the sheet named `name`, if present.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Iterate sheet names in order.
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }

    /// Total number of rows across all sheets.
    pub fn row_count(&self) -> usize {
        self.sheets.iter().map(Sheet::row_count).sum()
    }
}
