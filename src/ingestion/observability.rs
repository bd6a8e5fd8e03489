//! Outcome reporting for [`super::ingest_from_path`].
//!
//! Every ingestion attempt ends in exactly one `on_success` or `on_failure` callback; failures
//! whose [`IngestionSeverity`] reaches the caller's threshold additionally get `on_alert`.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::IngestionError;

use super::unified::IngestionFormat;

/// How bad a failed ingestion is. Ordered, so thresholds compare with `>=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    Info,
    /// The upload was refused but nothing is broken (e.g. it is too large).
    Warning,
    /// The upload could not be parsed.
    Error,
    /// The file could not be read at all.
    Critical,
}

impl fmt::Display for IngestionSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestionSeverity::Info => "info",
            IngestionSeverity::Warning => "warning",
            IngestionSeverity::Error => "error",
            IngestionSeverity::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// What was being ingested.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    pub path: PathBuf,
    pub format: IngestionFormat,
}

/// Size of a successfully ingested workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    pub sheets: usize,
    /// Rows summed over all sheets.
    pub rows: usize,
}

/// Receives ingestion outcomes. All methods default to doing nothing, except `on_alert`, which
/// falls back to `on_failure`.
pub trait IngestionObserver: Send + Sync {
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &IngestionError) {}

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.on_failure(ctx, severity, error)
    }
}

fn describe_success(ctx: &IngestionContext, stats: IngestionStats) -> String {
    format!(
        "format={:?} path={} sheets={} rows={}",
        ctx.format,
        ctx.path.display(),
        stats.sheets,
        stats.rows
    )
}

fn describe_failure(ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) -> String {
    format!(
        "severity={severity} format={:?} path={} err={error}",
        ctx.format,
        ctx.path.display()
    )
}

/// Forwards every callback to each inner observer, in order.
#[derive(Default)]
pub struct CompositeObserver {
    inner: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { inner: observers }
    }

    /// Add another observer to the end of the list.
    pub fn push(&mut self, observer: Arc<dyn IngestionObserver>) {
        self.inner.push(observer);
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompositeObserver({} observers)", self.inner.len())
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.inner.iter().for_each(|o| o.on_success(ctx, stats));
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.inner.iter().for_each(|o| o.on_failure(ctx, severity, error));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.inner.iter().for_each(|o| o.on_alert(ctx, severity, error));
    }
}

/// Prints one line per event to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl IngestionObserver for StdErrObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        eprintln!("[ingest] ok {}", describe_success(ctx, stats));
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        eprintln!("[ingest] fail {}", describe_failure(ctx, severity, error));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        eprintln!("[ingest] ALERT {}", describe_failure(ctx, severity, error));
    }
}

const LOG_TARGET: &str = "tabular_transform::ingest";

/// Sends events to the [`log`] facade under the `tabular_transform::ingest` target.
///
/// Successes are `info`; `Info`/`Warning` failures are `warn`; everything else is `error`.
#[derive(Debug, Default)]
pub struct LogObserver;

impl IngestionObserver for LogObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        log::info!(target: LOG_TARGET, "ingested {}", describe_success(ctx, stats));
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        let level = if severity <= IngestionSeverity::Warning {
            log::Level::Warn
        } else {
            log::Level::Error
        };
        log::log!(target: LOG_TARGET, level, "ingestion failed {}", describe_failure(ctx, severity, error));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        log::error!(target: LOG_TARGET, "ALERT {}", describe_failure(ctx, severity, error));
    }
}

/// Appends `<unix-seconds> <ok|fail|ALERT> <details>` lines to a file.
///
/// The file is opened per event; I/O errors while logging are swallowed so that reporting never
/// changes the ingestion result.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileObserver {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    fn append(&self, kind: &str, details: &str) {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let file = OpenOptions::new().create(true).append(true).open(&self.path);
        if let Ok(mut file) = file {
            let _ = writeln!(file, "{secs} {kind} {details}");
        }
    }
}

impl IngestionObserver for FileObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.append("ok", &describe_success(ctx, stats));
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.append("fail", &describe_failure(ctx, severity, error));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.append("ALERT", &describe_failure(ctx, severity, error));
    }
}
