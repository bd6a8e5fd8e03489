//! Path-based ingestion for uploaded files.
//!
//! [`ingest_from_path`] picks a reader by extension (or by [`IngestionOptions::format`]), builds a
//! [`Workbook`], applies the per-sheet row ceiling and reports the outcome to the configured
//! [`IngestionObserver`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{IngestionError, IngestionResult};
use crate::types::Workbook;

use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};
use super::{csv, json};

/// File formats understood by [`ingest_from_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionFormat {
    Csv,
    /// Array of objects, a single object, or NDJSON.
    Json,
    /// Any workbook calamine can open; requires the `excel` feature.
    Excel,
}

impl IngestionFormat {
    /// Map a file extension to a format, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        let format = match ext.as_str() {
            "csv" => Self::Csv,
            "json" | "ndjson" => Self::Json,
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Self::Excel,
            _ => return None,
        };
        Some(format)
    }
}

/// Which worksheets of a workbook become sheets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExcelSheetSelection {
    /// Only the first worksheet.
    First,
    /// One worksheet by name.
    Sheet(String),
    /// Every worksheet, in workbook order.
    #[default]
    AllSheets,
    /// The named worksheets, in the given order.
    Sheets(Vec<String>),
}

/// Knobs for [`ingest_from_path`]; `Default` detects the format and applies no limits.
#[derive(Clone)]
pub struct IngestionOptions {
    /// Force a format instead of looking at the extension.
    pub format: Option<IngestionFormat>,
    pub excel_sheet_selection: ExcelSheetSelection,
    /// Fail the whole upload when a sheet has more rows than this.
    pub max_rows_per_sheet: Option<usize>,
    /// Receives success/failure/alert callbacks.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Failures at or above this severity also trigger `on_alert`.
    pub alert_at_or_above: IngestionSeverity,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            excel_sheet_selection: ExcelSheetSelection::AllSheets,
            max_rows_per_sheet: None,
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("excel_sheet_selection", &self.excel_sheet_selection)
            .field("max_rows_per_sheet", &self.max_rows_per_sheet)
            .field("has_observer", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

/// Parse the file at `path` into a [`Workbook`].
///
/// CSV and JSON files yield a single sheet named after the file stem; workbooks yield one sheet
/// per selected worksheet. With `max_rows_per_sheet` set, any larger sheet fails the call with
/// [`IngestionError::RowLimitExceeded`].
///
/// If `options.observer` is set it receives `on_success` with sheet/row counts, or
/// `on_failure` with a severity (plus `on_alert` once the severity reaches
/// `options.alert_at_or_above`).
///
/// ```no_run
/// use std::sync::Arc;
///
/// use tabular_transform::ingestion::{ingest_from_path, IngestionFormat, IngestionOptions, LogObserver};
///
/// # fn main() -> Result<(), tabular_transform::IngestionError> {
/// let opts = IngestionOptions {
///     format: Some(IngestionFormat::Csv),
///     max_rows_per_sheet: Some(100_000),
///     observer: Some(Arc::new(LogObserver)),
///     ..Default::default()
/// };
/// let workbook = ingest_from_path("upload-7f3a", &opts)?;
/// for sheet in &workbook.sheets {
///     println!("{}: {} rows", sheet.name, sheet.row_count());
/// }
/// # Ok(())
/// # }
/// ```
pub fn ingest_from_path(path: impl AsRef<Path>, options: &IngestionOptions) -> IngestionResult<Workbook> {
    let path = path.as_ref();
    let format = match options.format {
        Some(format) => format,
        None => detect_format(path)?,
    };

    let outcome = read_workbook(path, format, &options.excel_sheet_selection)
        .and_then(|wb| check_row_limit(wb, options.max_rows_per_sheet));

    if let Some(observer) = &options.observer {
        let ctx = IngestionContext {
            path: path.to_path_buf(),
            format,
        };
        report(observer.as_ref(), &ctx, &outcome, options.alert_at_or_above);
    }

    outcome
}

fn read_workbook(path: &Path, format: IngestionFormat, sheets: &ExcelSheetSelection) -> IngestionResult<Workbook> {
    match format {
        IngestionFormat::Csv => Ok(Workbook::new(vec![csv::ingest_csv_from_path(path)?])),
        IngestionFormat::Json => Ok(Workbook::new(vec![json::ingest_json_from_path(path)?])),
        IngestionFormat::Excel => read_excel(path, sheets),
    }
}

#[cfg(feature = "excel")]
fn read_excel(path: &Path, sheets: &ExcelSheetSelection) -> IngestionResult<Workbook> {
    use super::excel::{ingest_excel_from_path, ingest_excel_workbook_from_path};

    match sheets {
        ExcelSheetSelection::First => Ok(Workbook::new(vec![ingest_excel_from_path(path, None)?])),
        ExcelSheetSelection::Sheet(name) => {
            Ok(Workbook::new(vec![ingest_excel_from_path(path, Some(name.as_str()))?]))
        }
        ExcelSheetSelection::AllSheets => ingest_excel_workbook_from_path(path, None),
        ExcelSheetSelection::Sheets(names) => {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            ingest_excel_workbook_from_path(path, Some(names.as_slice()))
        }
    }
}

#[cfg(not(feature = "excel"))]
fn read_excel(_path: &Path, _sheets: &ExcelSheetSelection) -> IngestionResult<Workbook> {
    Err(IngestionError::InvalidInput {
        message: "excel ingestion not enabled (enable cargo feature 'excel')".to_string(),
    })
}

fn check_row_limit(wb: Workbook, limit: Option<usize>) -> IngestionResult<Workbook> {
    let Some(limit) = limit else {
        return Ok(wb);
    };
    if let Some(sheet) = wb.sheets.iter().find(|s| s.row_count() > limit) {
        return Err(IngestionError::RowLimitExceeded {
            sheet: sheet.name.clone(),
            limit,
        });
    }
    Ok(wb)
}

fn report(
    observer: &dyn IngestionObserver,
    ctx: &IngestionContext,
    outcome: &IngestionResult<Workbook>,
    alert_at_or_above: IngestionSeverity,
) {
    match outcome {
        Ok(wb) => observer.on_success(
            ctx,
            IngestionStats {
                sheets: wb.sheets.len(),
                rows: wb.row_count(),
            },
        ),
        Err(err) => {
            let severity = classify(err);
            observer.on_failure(ctx, severity, err);
            if severity >= alert_at_or_above {
                observer.on_alert(ctx, severity, err);
            }
        }
    }
}

/// I/O problems are infrastructure failures; bad content is an ordinary error; an oversized
/// upload is only a warning.
fn classify(err: &IngestionError) -> IngestionSeverity {
    match err {
        IngestionError::Io(_) => IngestionSeverity::Critical,
        IngestionError::Csv(e) if matches!(e.kind(), ::csv::ErrorKind::Io(_)) => IngestionSeverity::Critical,
        IngestionError::Json(e) if e.is_io() => IngestionSeverity::Critical,
        #[cfg(feature = "excel")]
        IngestionError::Excel(calamine::Error::Io(_)) => IngestionSeverity::Critical,
        IngestionError::RowLimitExceeded { .. } => IngestionSeverity::Warning,
        _ => IngestionSeverity::Error,
    }
}

fn detect_format(path: &Path) -> IngestionResult<IngestionFormat> {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return Err(IngestionError::InvalidInput {
            message: format!("{}: no file extension to infer the format from", path.display()),
        });
    };
    IngestionFormat::from_extension(ext).ok_or_else(|| IngestionError::InvalidInput {
        message: format!("{}: unsupported file extension '{ext}'", path.display()),
    })
}

/// An ingestion job that can be queued and run later.
#[derive(Debug, Clone)]
pub struct IngestionRequest {
    pub path: PathBuf,
    pub options: IngestionOptions,
}

impl IngestionRequest {
    /// Run [`ingest_from_path`] with this request's path and options.
    pub fn run(&self) -> IngestionResult<Workbook> {
        ingest_from_path(&self.path, &self.options)
    }
}
