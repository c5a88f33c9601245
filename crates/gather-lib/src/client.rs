//! Capabilities consumed by the gatherers
//!
//! Transport to the metrics APIs and the pod cache live behind these traits;
//! the gatherers only see samples, timestamps and pod snapshots.

use crate::models::PodMetricsInfo;
use anyhow::Result;
use chrono::{DateTime, Utc};
use k8s_openapi::api::autoscaling::v2::CrossVersionObjectReference;
use k8s_openapi::api::core::v1::Pod;
use kube::core::Selector;

pub use async_trait::async_trait;

/// Access to the resource, custom and external metrics APIs
#[async_trait]
pub trait MetricsClient: Send + Sync {
    /// Per-pod usage of a resource (milli-units) for pods matching `selector`
    async fn resource_metric(
        &self,
        resource: &str,
        namespace: &str,
        selector: &Selector,
    ) -> Result<(PodMetricsInfo, DateTime<Utc>)>;

    /// Per-pod samples of a custom metric
    async fn raw_metric(
        &self,
        metric_name: &str,
        namespace: &str,
        selector: &Selector,
        metric_selector: &Selector,
    ) -> Result<(PodMetricsInfo, DateTime<Utc>)>;

    /// Single value of a metric describing `object`
    async fn object_metric(
        &self,
        metric_name: &str,
        namespace: &str,
        object: &CrossVersionObjectReference,
        metric_selector: &Selector,
    ) -> Result<(i64, DateTime<Utc>)>;

    /// Values of every external series matching `metric_selector`
    async fn external_metric(
        &self,
        metric_name: &str,
        namespace: &str,
        metric_selector: &Selector,
    ) -> Result<(Vec<i64>, DateTime<Utc>)>;
}

/// Lists pods of a namespace matching a selector
#[async_trait]
pub trait PodLister: Send + Sync {
    async fn list_pods(&self, namespace: &str, selector: &Selector) -> Result<Vec<Pod>>;
}
