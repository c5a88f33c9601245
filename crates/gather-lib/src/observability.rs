//! Observability for metric gathering
//!
//! Provides:
//! - Prometheus metrics (gather latency, per-source successes and failures, pod gaps)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_int_counter_vec, register_int_gauge, Histogram, IntCounterVec,
    IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for gather latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<GatherMetricsInner> = OnceLock::new();

struct GatherMetricsInner {
    gather_latency_seconds: Histogram,
    metrics_gathered: IntCounterVec,
    metric_errors: IntCounterVec,
    pods_missing: IntGauge,
    pods_ignored: IntGauge,
}

impl GatherMetricsInner {
    fn new() -> Self {
        Self {
            gather_latency_seconds: register_histogram!(
                "k8s_gather_latency_seconds",
                "Time spent gathering all metrics of a scale target",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register gather_latency_seconds"),

            metrics_gathered: register_int_counter_vec!(
                "k8s_gather_metrics_total",
                "Metric specs gathered successfully",
                &["source"]
            )
            .expect("Failed to register metrics_total"),

            metric_errors: register_int_counter_vec!(
                "k8s_gather_metric_errors_total",
                "Metric specs that failed validation or gathering",
                &["source"]
            )
            .expect("Failed to register metric_errors_total"),

            pods_missing: register_int_gauge!(
                "k8s_gather_pods_missing",
                "Pods without a sample in the last resource or pods metric gathered"
            )
            .expect("Failed to register pods_missing"),

            pods_ignored: register_int_gauge!(
                "k8s_gather_pods_ignored",
                "Pods left out as still initializing in the last resource metric gathered"
            )
            .expect("Failed to register pods_ignored"),
        }
    }
}

/// Handle to the global gather metrics
///
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct GatherMetrics {
    inner: &'static GatherMetricsInner,
}

impl Default for GatherMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GatherMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatherMetrics").finish_non_exhaustive()
    }
}

impl GatherMetrics {
    /// Create a handle, registering the metrics on first use
    pub fn new() -> Self {
        Self {
            inner: GLOBAL_METRICS.get_or_init(GatherMetricsInner::new),
        }
    }

    pub fn observe_gather_latency(&self, duration_secs: f64) {
        self.inner.gather_latency_seconds.observe(duration_secs);
    }

    pub fn inc_gathered(&self, source: &str) {
        self.inner.metrics_gathered.with_label_values(&[source]).inc();
    }

    pub fn inc_errors(&self, source: &str) {
        self.inner.metric_errors.with_label_values(&[source]).inc();
    }

    pub fn set_pod_gaps(&self, missing: usize, ignored: usize) {
        self.inner.pods_missing.set(missing as i64);
        self.inner.pods_ignored.set(ignored as i64);
    }

    pub fn gathered_count(&self, source: &str) -> u64 {
        self.inner.metrics_gathered.with_label_values(&[source]).get()
    }

    pub fn error_count(&self, source: &str) -> u64 {
        self.inner.metric_errors.with_label_values(&[source]).get()
    }
}

/// Structured logger for gather events
///
/// Emits consistent `event = ...` records for the gather run of one scale target.
#[derive(Clone)]
pub struct StructuredLogger {
    scale_target: String,
}

impl StructuredLogger {
    pub fn new(scale_target: impl Into<String>) -> Self {
        Self {
            scale_target: scale_target.into(),
        }
    }

    pub fn log_startup(&self, version: &str, namespace: &str, specs: usize) {
        info!(
            event = "gather_started",
            scale_target = %self.scale_target,
            version = %version,
            namespace = %namespace,
            specs,
            "Gathering metrics"
        );
    }

    pub fn log_gather_complete(&self, namespace: &str, gathered: usize, total: usize) {
        if gathered < total {
            warn!(
                event = "gather_partial",
                scale_target = %self.scale_target,
                namespace = %namespace,
                gathered,
                total,
                "Some metrics could not be gathered"
            );
        } else {
            info!(
                event = "gather_complete",
                scale_target = %self.scale_target,
                namespace = %namespace,
                gathered,
                total,
                "Gathered metrics"
            );
        }
    }

    pub fn log_gather_failed(&self, namespace: &str, error: &str) {
        warn!(
            event = "gather_failed",
            scale_target = %self.scale_target,
            namespace = %namespace,
            error = %error,
            "Metric gathering failed"
        );
    }
}
