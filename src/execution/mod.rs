//! Execution engine for running many pipeline requests concurrently.
//!
//! This module sits "above" [`crate::processing`] and provides:
//!
//! - Parallel execution of independent [`TransformRequest`]s on a dedicated worker pool
//! - Resource limits: an input row ceiling per request and a cap on in-flight requests
//! - Real-time metrics + observer hooks for monitoring
//!
//! Each request owns its rows and configuration; nothing is shared between requests, so results
//! are identical to calling [`crate::processing::transform`] directly.

mod observer;
mod semaphore;

use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::processing::{transform, PipelineConfig};
use crate::types::Row;

pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver, LogExecutionObserver,
    StdErrExecutionObserver,
};

use semaphore::Semaphore;

/// Configuration for the [`PipelineEngine`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Upper bound on concurrently executing requests.
    ///
    /// This is an additional throttle on top of `num_threads`.
    pub max_in_flight_requests: usize,
    /// Reject requests with more input rows than this.
    pub max_input_rows: Option<usize>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        let n = available_threads();
        Self {
            num_threads: Some(n),
            max_in_flight_requests: n,
            max_input_rows: None,
        }
    }
}

fn available_threads() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// One unit of work: rows plus the pipeline configuration to run over them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformRequest {
    pub rows: Vec<Row>,
    pub config: PipelineConfig,
}

impl TransformRequest {
    /// Create a request.
    pub fn new(rows: Vec<Row>, config: PipelineConfig) -> Self {
        Self { rows, config }
    }
}

/// A configurable execution engine for pipeline requests.
pub struct PipelineEngine {
    pool: ThreadPool,
    opts: EngineOptions,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl PipelineEngine {
    /// Create a new engine with the given options.
    ///
    /// Fails with [`PipelineError::InvalidConfig`] if `max_in_flight_requests == 0` or
    /// `num_threads == Some(0)`, and with [`PipelineError::ThreadPool`] if the worker pool
    /// cannot be started.
    pub fn new(opts: EngineOptions) -> PipelineResult<Self> {
        if opts.max_in_flight_requests == 0 {
            return Err(PipelineError::InvalidConfig {
                message: "max_in_flight_requests must be > 0".to_string(),
            });
        }
        if opts.num_threads == Some(0) {
            return Err(PipelineError::InvalidConfig {
                message: "num_threads must be > 0 when set".to_string(),
            });
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(opts.num_threads.unwrap_or_else(available_threads))
            .thread_name(|i| format!("tabular-transform-{i}"))
            .build()?;

        Ok(Self {
            pool,
            opts,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        })
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run a single request on the calling thread, enforcing the row ceiling.
    pub fn transform(&self, rows: &[Row], config: &PipelineConfig) -> PipelineResult<Vec<Row>> {
        let start = Instant::now();
        self.begin(1);
        let sem = Semaphore::new(1);
        let out = self.run_one(0, rows, config, &sem);
        self.finish(start);
        out
    }

    /// Run every request in parallel; results are returned in request order.
    ///
    /// A request over the row ceiling yields [`PipelineError::RowLimitExceeded`] in its slot
    /// without affecting the others.
    pub fn run_batch(&self, requests: &[TransformRequest]) -> Vec<PipelineResult<Vec<Row>>> {
        let start = Instant::now();
        self.begin(requests.len());
        let sem = Semaphore::new(self.opts.max_in_flight_requests);

        let results = self.pool.install(|| {
            requests
                .par_iter()
                .enumerate()
                .map(|(index, req)| self.run_one(index, &req.rows, &req.config, &sem))
                .collect()
        });

        self.finish(start);
        results
    }

    fn run_one(
        &self,
        index: usize,
        rows: &[Row],
        config: &PipelineConfig,
        sem: &Semaphore,
    ) -> PipelineResult<Vec<Row>> {
        if let Some(limit) = self.opts.max_input_rows {
            if rows.len() > limit {
                self.metrics.on_request_rejected();
                self.emit(ExecutionEvent::RequestRejected {
                    index,
                    input_rows: rows.len(),
                    limit,
                });
                return Err(PipelineError::RowLimitExceeded {
                    rows: rows.len(),
                    limit,
                });
            }
        }

        let permit = sem.acquire();
        if permit.waited > Duration::ZERO {
            self.metrics.on_throttle_wait(permit.waited);
            self.emit(ExecutionEvent::ThrottleWaited {
                duration: permit.waited,
            });
        }

        self.metrics.on_request_start();
        self.emit(ExecutionEvent::RequestStarted {
            index,
            input_rows: rows.len(),
        });

        let out = transform(rows, config);

        self.emit(ExecutionEvent::RequestFinished {
            index,
            output_rows: out.len(),
        });
        self.metrics.on_request_end(rows.len());
        drop(permit);
        Ok(out)
    }

    fn begin(&self, requests: usize) {
        self.metrics.begin_run();
        self.emit(ExecutionEvent::RunStarted { requests });
    }

    fn finish(&self, start: Instant) {
        let elapsed = start.elapsed();
        self.metrics.end_run(elapsed);
        self.emit(ExecutionEvent::RunFinished {
            elapsed,
            metrics: self.metrics.snapshot(),
        });
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}
