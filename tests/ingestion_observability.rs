use std::sync::{Arc, Mutex};

use tabular_transform::ingestion::{
    ingest_from_path, CompositeObserver, FileObserver, IngestionContext, IngestionFormat, IngestionObserver,
    IngestionOptions, IngestionSeverity, IngestionStats,
};

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<IngestionStats>>,
    failures: Mutex<Vec<IngestionSeverity>>,
    alerts: Mutex<Vec<IngestionSeverity>>,
}

impl IngestionObserver for RecordingObserver {
    fn on_success(&self, _ctx: &IngestionContext, stats: IngestionStats) {
        self.successes.lock().unwrap().push(stats);
    }

    fn on_failure(
        &self,
        _ctx: &IngestionContext,
        severity: IngestionSeverity,
        _error: &tabular_transform::IngestionError,
    ) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(
        &self,
        _ctx: &IngestionContext,
        severity: IngestionSeverity,
        _error: &tabular_transform::IngestionError,
    ) {
        self.alerts.lock().unwrap().push(severity);
    }
}

#[test]
fn observer_receives_stats_on_success() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IngestionOptions {
        observer: Some(obs.clone()),
        ..Default::default()
    };

    ingest_from_path("tests/fixtures/sales.csv", &opts).unwrap();

    let successes = obs.successes.lock().unwrap().clone();
    assert_eq!(successes, vec![IngestionStats { sheets: 1, rows: 5 }]);
    assert!(obs.failures.lock().unwrap().is_empty());
}

#[test]
fn observer_receives_failure_and_alert_on_critical_io_error() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IngestionOptions {
        format: Some(IngestionFormat::Csv),
        observer: Some(obs.clone()),
        alert_at_or_above: IngestionSeverity::Critical,
        ..Default::default()
    };

    // Missing file -> Io error -> Critical
    let _ = ingest_from_path("tests/fixtures/does_not_exist.csv", &opts).unwrap_err();

    let failures = obs.failures.lock().unwrap().clone();
    let alerts = obs.alerts.lock().unwrap().clone();
    assert_eq!(failures, vec![IngestionSeverity::Critical]);
    assert_eq!(alerts, vec![IngestionSeverity::Critical]);
}

#[test]
fn observer_receives_failure_without_alert_for_non_critical_error() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IngestionOptions {
        observer: Some(obs.clone()),
        max_rows_per_sheet: Some(1),
        alert_at_or_above: IngestionSeverity::Error,
        ..Default::default()
    };

    // Row ceiling -> Warning severity (below threshold) -> should not alert
    let _ = ingest_from_path("tests/fixtures/sales.csv", &opts).unwrap_err();

    let failures = obs.failures.lock().unwrap().clone();
    assert_eq!(failures, vec![IngestionSeverity::Warning]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn composite_fans_out_and_file_observer_appends() {
    let log_path = std::env::temp_dir().join(format!(
        "tabular-transform-observer-{}.log",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&log_path);

    let recorder = Arc::new(RecordingObserver::default());
    let observers: Vec<Arc<dyn IngestionObserver>> =
        vec![recorder.clone(), Arc::new(FileObserver::new(&log_path))];
    let composite = CompositeObserver::new(observers);
    let opts = IngestionOptions {
        observer: Some(Arc::new(composite)),
        ..Default::default()
    };

    ingest_from_path("tests/fixtures/sales.json", &opts).unwrap();
    let _ = ingest_from_path("tests/fixtures/missing.json", &opts).unwrap_err();

    assert_eq!(recorder.successes.lock().unwrap().len(), 1);
    assert_eq!(recorder.alerts.lock().unwrap().len(), 1);

    let log = std::fs::read_to_string(&log_path).unwrap();
    let kinds: Vec<&str> = log.lines().filter_map(|l| l.split_whitespace().nth(1)).collect();
    assert_eq!(kinds, vec!["ok", "fail", "ALERT"]);
    assert!(log.contains("rows=3"));

    let _ = std::fs::remove_file(&log_path);
}
