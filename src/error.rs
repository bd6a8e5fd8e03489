use thiserror::Error;

/// Result of the `ingestion` readers.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Result of the fallible pipeline entrypoints.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Everything that can go wrong while turning an uploaded file into a [`crate::types::Workbook`].
#[derive(Debug, Error)]
pub enum IngestionError {
    /// The file could not be opened or read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// calamine rejected the workbook.
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// Malformed CSV, or an I/O failure surfaced by the csv reader.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON input could not be parsed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The input is structurally unusable (no header row, unsupported format, etc.).
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// A sheet holds more rows than the configured ceiling.
    #[error("sheet '{sheet}' exceeds the row limit of {limit}")]
    RowLimitExceeded { sheet: String, limit: usize },
}

/// Error type returned by the fallible pipeline entrypoints.
///
/// [`crate::processing::transform`] itself never fails; these errors come from the JSON
/// boundary, from configuration validation, and from the execution engine's row ceiling.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The pipeline configuration is malformed.
    #[error("invalid pipeline config: {message}")]
    InvalidConfig { message: String },

    /// The `rows` argument is not a sequence of records.
    #[error("invalid rows: {message}")]
    InvalidRows { message: String },

    /// JSON (de)serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The request carries more input rows than the engine accepts.
    #[error("{rows} input rows exceed the limit of {limit}")]
    RowLimitExceeded { rows: usize, limit: usize },

    /// The execution engine's worker pool could not be started.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
