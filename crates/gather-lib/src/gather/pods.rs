//! Custom per-pod metric gathering

use crate::client::{MetricsClient, PodLister};
use crate::error::GatherError;
use crate::metric::PodsMetric;
use crate::models::PodMetricsInfo;
use crate::podutil::{group_pods, GraceWindows};
use chrono::Utc;
use kube::core::Selector;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Gathers a custom metric reported by each pod of a scale target
#[derive(Clone)]
pub struct PodsGather {
    metrics_client: Arc<dyn MetricsClient>,
    pod_lister: Arc<dyn PodLister>,
}

impl PodsGather {
    pub fn new(metrics_client: Arc<dyn MetricsClient>, pod_lister: Arc<dyn PodLister>) -> Self {
        Self {
            metrics_client,
            pod_lister,
        }
    }

    pub async fn get_metric(
        &self,
        metric_name: &str,
        namespace: &str,
        selector: &Selector,
        metric_selector: &Selector,
    ) -> Result<PodsMetric, GatherError> {
        let pods = self
            .pod_lister
            .list_pods(namespace, selector)
            .await
            .map_err(|e| {
                GatherError::fetch("unable to get pods while calculating replica count", e)
            })?;

        if pods.is_empty() {
            debug!(metric = %metric_name, namespace = %namespace, "No pods, skipping fetch");
            return Ok(PodsMetric {
                pod_metrics_info: PodMetricsInfo::new(),
                ready_pod_count: 0,
                ignored_pods: None,
                missing_pods: BTreeSet::new(),
                total_pods: 0,
                timestamp: Utc::now(),
            });
        }

        let (metrics, timestamp) = self
            .metrics_client
            .raw_metric(metric_name, namespace, selector, metric_selector)
            .await
            .map_err(|e| GatherError::fetch(format!("unable to get metric {}", metric_name), e))?;

        // Custom metrics have no initialization window: only ready vs missing
        let group = group_pods(&pods, &metrics, &GraceWindows::disabled(), Utc::now());

        Ok(PodsMetric {
            pod_metrics_info: group.ready_metrics,
            ready_pod_count: group.ready_pod_count,
            ignored_pods: None,
            missing_pods: group.missing_pods,
            total_pods: group.total_pods,
            timestamp,
        })
    }
}
