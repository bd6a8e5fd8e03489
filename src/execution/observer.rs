use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Lifecycle events of a [`super::PipelineEngine`] run.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted { requests: usize },
    ThrottleWaited { duration: Duration },
    RequestStarted { index: usize, input_rows: usize },
    RequestFinished { index: usize, output_rows: usize },
    RequestRejected { index: usize, input_rows: usize, limit: usize },
    RunFinished {
        elapsed: Duration,
        metrics: ExecutionMetricsSnapshot,
    },
}

/// Receives every [`ExecutionEvent`], possibly from several worker threads at once.
pub trait ExecutionObserver: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent);
}

/// Prints each event to stderr in `Debug` form.
#[derive(Default)]
pub struct StdErrExecutionObserver;

impl ExecutionObserver for StdErrExecutionObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        eprintln!("[engine] {event:?}");
    }
}

/// Forwards execution events to the [`log`] facade.
///
/// Rejections log at `warn`, run boundaries at `debug`, everything else at `trace`.
#[derive(Default)]
pub struct LogExecutionObserver;

impl ExecutionObserver for LogExecutionObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::RequestRejected { index, input_rows, limit } => {
                log::warn!("request {index} rejected: {input_rows} rows over limit {limit}");
            }
            ExecutionEvent::RunStarted { .. } => log::debug!("{event:?}"),
            ExecutionEvent::RunFinished { metrics, .. } => log::debug!("run finished: {metrics}"),
            _ => log::trace!("{event:?}"),
        }
    }
}

/// Live counters for the current (or last) engine run.
///
/// Counters reset when a run begins; [`ExecutionMetrics::snapshot`] is safe to call mid-run.
pub struct ExecutionMetrics {
    run_id: AtomicU64,
    elapsed_ns: AtomicU64,

    rows_processed: AtomicU64,
    requests_started: AtomicU64,
    requests_finished: AtomicU64,
    requests_rejected: AtomicU64,
    throttle_wait_ns: AtomicU64,

    active_requests: AtomicUsize,
    max_active_requests: AtomicUsize,
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self {
            run_id: AtomicU64::new(0),
            elapsed_ns: AtomicU64::new(0),
            rows_processed: AtomicU64::new(0),
            requests_started: AtomicU64::new(0),
            requests_finished: AtomicU64::new(0),
            requests_rejected: AtomicU64::new(0),
            throttle_wait_ns: AtomicU64::new(0),
            active_requests: AtomicUsize::new(0),
            max_active_requests: AtomicUsize::new(0),
        }
    }

    /// Reset counters for a new run.
    pub(crate) fn begin_run(&self) {
        self.run_id.fetch_add(1, Ordering::SeqCst);
        for counter in [
            &self.elapsed_ns,
            &self.rows_processed,
            &self.requests_started,
            &self.requests_finished,
            &self.requests_rejected,
            &self.throttle_wait_ns,
        ] {
            counter.store(0, Ordering::SeqCst);
        }
        self.active_requests.store(0, Ordering::SeqCst);
        self.max_active_requests.store(0, Ordering::SeqCst);
    }

    pub(crate) fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns.store(saturating_nanos(elapsed), Ordering::SeqCst);
    }

    pub(crate) fn on_request_start(&self) {
        self.requests_started.fetch_add(1, Ordering::SeqCst);
        let now = self.active_requests.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_requests.fetch_max(now, Ordering::SeqCst);
    }

    pub(crate) fn on_request_end(&self, input_rows: usize) {
        self.rows_processed.fetch_add(input_rows as u64, Ordering::SeqCst);
        self.requests_finished.fetch_add(1, Ordering::SeqCst);
        self.active_requests.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn on_request_rejected(&self) {
        self.requests_rejected.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn on_throttle_wait(&self, d: Duration) {
        self.throttle_wait_ns.fetch_add(saturating_nanos(d), Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ExecutionMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        ExecutionMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed: (elapsed_ns > 0).then(|| Duration::from_nanos(elapsed_ns)),
            rows_processed: self.rows_processed.load(Ordering::SeqCst),
            requests_started: self.requests_started.load(Ordering::SeqCst),
            requests_finished: self.requests_finished.load(Ordering::SeqCst),
            requests_rejected: self.requests_rejected.load(Ordering::SeqCst),
            throttle_wait: Duration::from_nanos(self.throttle_wait_ns.load(Ordering::SeqCst)),
            max_active_requests: self.max_active_requests.load(Ordering::SeqCst),
        }
    }
}

impl Default for ExecutionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn saturating_nanos(d: Duration) -> u64 {
    d.as_nanos().min(u64::MAX as u128) as u64
}

/// Point-in-time copy of [`ExecutionMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMetricsSnapshot {
    pub run_id: u64,
    pub elapsed: Option<Duration>,
    /// Input rows of every request that ran (rejected requests excluded).
    pub rows_processed: u64,
    pub requests_started: u64,
    pub requests_finished: u64,
    pub requests_rejected: u64,
    pub throttle_wait: Duration,
    pub max_active_requests: usize,
}

impl fmt::Display for ExecutionMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={}, rows_processed={}, requests={}/{} (rejected {}), max_active_requests={}, throttle_wait={:?}, elapsed={:?}",
            self.run_id,
            self.rows_processed,
            self.requests_finished,
            self.requests_started,
            self.requests_rejected,
            self.max_active_requests,
            self.throttle_wait,
            self.elapsed
        )
    }
}
