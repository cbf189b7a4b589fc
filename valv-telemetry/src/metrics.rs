//! ## valv-telemetry::metrics
//! **Prometheus counters for backup runs**

use prometheus::{Counter, Histogram, HistogramOpts, Registry};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: prometheus::Registry,
    pub backup_runs: prometheus::Counter,
    pub artifacts_produced: prometheus::Counter,
    pub upload_failures: prometheus::Counter,
    pub artifacts_deleted: prometheus::Counter,
    pub alerts_emitted: prometheus::Counter,
    pub run_duration: prometheus::Histogram,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        let registry = Registry::new();
        let backup_runs =
            Counter::new("valv_backup_runs_total", "Total backup runs started").unwrap();
        let artifacts_produced = Counter::new(
            "valv_artifacts_produced_total",
            "Backup artifacts produced locally",
        )
        .unwrap();
        let upload_failures = Counter::new(
            "valv_upload_failures_total",
            "Remote publications that failed",
        )
        .unwrap();
        let artifacts_deleted = Counter::new(
            "valv_artifacts_deleted_total",
            "Local artifacts removed by retention",
        )
        .unwrap();
        let alerts_emitted =
            Counter::new("valv_alerts_emitted_total", "Alerts produced by monitoring").unwrap();

        let run_duration = Histogram::with_opts(
            HistogramOpts::new("valv_run_duration_seconds", "Wall time of one run")
                .buckets(vec![0.1, 1.0, 10.0, 60.0, 600.0]),
        )
        .unwrap();

        registry.register(Box::new(backup_runs.clone())).unwrap();
        registry
            .register(Box::new(artifacts_produced.clone()))
            .unwrap();
        registry.register(Box::new(upload_failures.clone())).unwrap();
        registry
            .register(Box::new(artifacts_deleted.clone()))
            .unwrap();
        registry.register(Box::new(alerts_emitted.clone())).unwrap();
        registry.register(Box::new(run_duration.clone())).unwrap();

        Self {
            registry,
            backup_runs,
            artifacts_produced,
            upload_failures,
            artifacts_deleted,
            alerts_emitted,
            run_duration,
        }
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer).unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_register_and_gather() {
        let metrics = MetricsRecorder::new();
        metrics.backup_runs.inc();
        metrics.artifacts_produced.inc_by(3.0);

        let text = metrics.gather_metrics().unwrap();
        assert!(text.contains("valv_backup_runs_total 1"));
        assert!(text.contains("valv_artifacts_produced_total 3"));
    }
}
