//! Reading uploaded files into typed rows.
//!
//! [`ingest_from_path`] is the usual entry point: it chooses a reader from the file extension
//! (overridable through [`IngestionOptions`]), returns a [`crate::types::Workbook`], and reports
//! the outcome to an optional [`IngestionObserver`].
//!
//! The per-format readers are public too: [`csv`], [`json`], and `excel` behind the cargo
//! feature of the same name.

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
mod header;
pub mod json;
pub mod observability;
pub mod unified;

pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    LogObserver, StdErrObserver,
};
pub use unified::{ingest_from_path, ExcelSheetSelection, IngestionFormat, IngestionOptions, IngestionRequest};
