//! Metric gathering library for pod autoscaling
//!
//! This crate provides the core functionality for:
//! - Pod readiness classification against grace windows
//! - Resource, pods, object and external metric gathering
//! - Metric spec validation and partial-failure aggregation
//! - Snapshot-backed metric and pod sources
//!
//! Pods, metric specs and selectors are the `k8s-openapi` and `kube` types.
//! - Prometheus metrics and structured logging

pub mod client;
pub mod error;
pub mod gather;
pub mod metric;
pub mod metric_spec;
pub mod models;
pub mod observability;
pub mod podutil;
pub mod selector;
pub mod snapshot;

#[cfg(test)]
mod test_support;

pub use client::{MetricsClient, PodLister};
pub use error::GatherError;
pub use gather::{Gather, GatherBuilder, GatherConfig, Gatherer};
pub use metric::{Metric, MetricPayload, MetricValue};
pub use metric_spec::{metric_name, target_type, MetricSourceType};
pub use models::{PodMetric, PodMetricsInfo, ScaleState};
pub use observability::{GatherMetrics, StructuredLogger};
pub use selector::{parse_selector, SelectorResolver, Workload, WorkloadSelectorResolver};
pub use snapshot::{Snapshot, SnapshotSource};
