//! Resource (cpu, memory) metric gathering

use crate::client::{MetricsClient, PodLister};
use crate::error::GatherError;
use crate::metric::ResourceMetric;
use crate::podutil::{calculate_pod_requests, group_pods, GraceWindows};
use chrono::Utc;
use kube::core::Selector;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Gathers resource usage for the pods of a scale target
#[derive(Clone)]
pub struct ResourceGather {
    metrics_client: Arc<dyn MetricsClient>,
    pod_lister: Arc<dyn PodLister>,
    windows: GraceWindows,
}

impl ResourceGather {
    pub fn new(
        metrics_client: Arc<dyn MetricsClient>,
        pod_lister: Arc<dyn PodLister>,
        windows: GraceWindows,
    ) -> Self {
        Self {
            metrics_client,
            pod_lister,
            windows,
        }
    }

    /// Usage plus per-pod requests, for utilization targets
    pub async fn get_metric(
        &self,
        resource: &str,
        namespace: &str,
        selector: &Selector,
    ) -> Result<ResourceMetric, GatherError> {
        self.gather(resource, namespace, selector, true).await
    }

    /// Raw usage only, for average value targets
    pub async fn get_raw_metric(
        &self,
        resource: &str,
        namespace: &str,
        selector: &Selector,
    ) -> Result<ResourceMetric, GatherError> {
        self.gather(resource, namespace, selector, false).await
    }

    async fn gather(
        &self,
        resource: &str,
        namespace: &str,
        selector: &Selector,
        with_requests: bool,
    ) -> Result<ResourceMetric, GatherError> {
        let (metrics, timestamp) = self
            .metrics_client
            .resource_metric(resource, namespace, selector)
            .await
            .map_err(|e| {
                GatherError::fetch(format!("unable to get metrics for resource {}", resource), e)
            })?;

        let pods = self
            .pod_lister
            .list_pods(namespace, selector)
            .await
            .map_err(|e| {
                GatherError::fetch("unable to get pods while calculating replica count", e)
            })?;

        if pods.is_empty() {
            return Err(GatherError::NoPods);
        }

        let group = group_pods(&pods, &metrics, &self.windows, Utc::now());

        let requests = if with_requests {
            calculate_pod_requests(&pods, resource)?
        } else {
            BTreeMap::new()
        };

        debug!(
            resource = %resource,
            namespace = %namespace,
            total = group.total_pods,
            ready = group.ready_pod_count,
            ignored = group.ignored_pods.len(),
            missing = group.missing_pods.len(),
            "Grouped pods for resource metric"
        );

        Ok(ResourceMetric {
            pod_metrics_info: group.ready_metrics,
            requests,
            ready_pod_count: group.ready_pod_count,
            ignored_pods: group.ignored_pods,
            missing_pods: group.missing_pods,
            total_pods: group.total_pods,
            timestamp,
        })
    }
}
