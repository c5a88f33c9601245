//! Gather metrics for the scale target recorded in a snapshot

use anyhow::{anyhow, Result};
use gather_lib::{
    metric_name, target_type, GatherBuilder, Gatherer, Metric, MetricPayload, MetricSourceType,
    Snapshot, SnapshotSource, StructuredLogger,
};
use std::sync::Arc;
use tabled::Tabled;

use crate::config::Settings;
use crate::output::{
    color_gap, format_milli, print_success, print_table, print_warning, OutputFormat,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Row for the gathered metrics table
#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Ready")]
    ready: String,
    #[tabled(rename = "Missing")]
    missing: String,
    #[tabled(rename = "Ignored")]
    ignored: String,
    #[tabled(rename = "Replicas")]
    replicas: i32,
}

impl From<&Metric> for MetricRow {
    fn from(metric: &Metric) -> Self {
        let (current, missing, ignored) = match &metric.payload {
            MetricPayload::Resource(m) => (
                average_sample(m.pod_metrics_info.values().map(|s| s.value)),
                color_gap(m.missing_pods.len()),
                color_gap(m.ignored_pods.len()),
            ),
            MetricPayload::Pods(m) => (
                average_sample(m.pod_metrics_info.values().map(|s| s.value)),
                color_gap(m.missing_pods.len()),
                "-".to_string(),
            ),
            MetricPayload::Object(m) => (current_value(&m.current), "-".into(), "-".into()),
            MetricPayload::External(m) => (current_value(&m.current), "-".into(), "-".into()),
        };

        Self {
            source: MetricSourceType::from_type(&metric.spec.type_)
                .map(|s| s.to_string())
                .unwrap_or_else(|| metric.spec.type_.clone()),
            metric: metric_name(&metric.spec).unwrap_or("-").to_string(),
            target: target_type(&metric.spec).unwrap_or("-").to_string(),
            current,
            ready: metric
                .ready_pod_count()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string()),
            missing,
            ignored,
            replicas: metric.current_replicas,
        }
    }
}

fn average_sample(values: impl Iterator<Item = i64>) -> String {
    // i128 so summing i64 samples cannot overflow
    let (sum, count) = values.fold((0i128, 0i128), |(sum, count), v| {
        (sum + i128::from(v), count + 1)
    });
    if count == 0 {
        return "-".to_string();
    }
    format!("avg {}", format_milli((sum / count) as i64))
}

fn current_value(value: &gather_lib::MetricValue) -> String {
    match (value.value, value.average_value) {
        (Some(v), _) => format_milli(v),
        (None, Some(avg)) => format!("avg {}", format_milli(avg)),
        (None, None) => "-".to_string(),
    }
}

/// Run one gather pass over `snapshot`
pub async fn gather_snapshot(
    snapshot: Snapshot,
    namespace: Option<String>,
    settings: &Settings,
    format: OutputFormat,
) -> Result<()> {
    let namespace = namespace
        .or_else(|| snapshot.namespace.clone())
        .unwrap_or_else(|| settings.default_namespace.clone());
    let workload = snapshot.workload.clone();
    let specs = snapshot.metrics.clone();
    let scale = snapshot.scale;

    let logger = StructuredLogger::new(workload.describe());
    logger.log_startup(VERSION, &namespace, specs.len());

    let source = Arc::new(SnapshotSource::new(snapshot));
    let gather = GatherBuilder::new()
        .metrics_client(source.clone())
        .pod_lister(source)
        .config(settings.gather_config())
        .build()?;

    let metrics = match gather.get_metrics(&workload, &specs, &namespace, &scale).await {
        Ok(metrics) => metrics,
        Err(e) => {
            logger.log_gather_failed(&namespace, &e.to_string());
            return Err(anyhow!(e.to_string()));
        }
    };
    logger.log_gather_complete(&namespace, metrics.len(), specs.len());

    let rows: Vec<MetricRow> = metrics.iter().map(MetricRow::from).collect();
    print_table(&rows, &metrics, format)?;

    if let OutputFormat::Table = format {
        let summary = format!(
            "Gathered {} of {} metrics for {} in {}",
            metrics.len(),
            specs.len(),
            workload.describe(),
            namespace
        );
        if metrics.len() < specs.len() {
            print_warning(&summary);
        } else {
            print_success(&summary);
        }
    }

    Ok(())
}
