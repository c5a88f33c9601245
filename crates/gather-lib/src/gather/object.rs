//! Metrics describing a single Kubernetes object

use super::average_over_ready;
use crate::client::MetricsClient;
use crate::error::GatherError;
use crate::metric::{MetricValue, ObjectMetric};
use crate::podutil::PodReadyCounter;
use k8s_openapi::api::autoscaling::v2::CrossVersionObjectReference;
use kube::core::Selector;
use std::sync::Arc;

#[derive(Clone)]
pub struct ObjectGather {
    metrics_client: Arc<dyn MetricsClient>,
    ready_counter: PodReadyCounter,
}

impl ObjectGather {
    pub fn new(metrics_client: Arc<dyn MetricsClient>, ready_counter: PodReadyCounter) -> Self {
        Self {
            metrics_client,
            ready_counter,
        }
    }

    /// Value target: the object's value as-is
    pub async fn get_metric(
        &self,
        metric_name: &str,
        namespace: &str,
        object: &CrossVersionObjectReference,
        selector: &Selector,
        metric_selector: &Selector,
    ) -> Result<ObjectMetric, GatherError> {
        let (value, timestamp) = self
            .fetch(metric_name, namespace, object, metric_selector)
            .await?;
        let ready_pod_count = self.ready_counter.ready_pod_count(namespace, selector).await?;

        Ok(ObjectMetric {
            current: MetricValue::value(value),
            ready_pod_count: Some(ready_pod_count),
            timestamp,
        })
    }

    /// Average value target: the object's value spread across ready pods
    pub async fn get_per_pod_metric(
        &self,
        metric_name: &str,
        namespace: &str,
        object: &CrossVersionObjectReference,
        selector: &Selector,
        metric_selector: &Selector,
    ) -> Result<ObjectMetric, GatherError> {
        let (value, timestamp) = self
            .fetch(metric_name, namespace, object, metric_selector)
            .await?;
        let ready_pod_count = self.ready_counter.ready_pod_count(namespace, selector).await?;

        Ok(ObjectMetric {
            current: MetricValue::average_value(average_over_ready(value, ready_pod_count)),
            ready_pod_count: Some(ready_pod_count),
            timestamp,
        })
    }

    async fn fetch(
        &self,
        metric_name: &str,
        namespace: &str,
        object: &CrossVersionObjectReference,
        metric_selector: &Selector,
    ) -> Result<(i64, chrono::DateTime<chrono::Utc>), GatherError> {
        self.metrics_client
            .object_metric(metric_name, namespace, object, metric_selector)
            .await
            .map_err(|e| {
                GatherError::fetch(
                    format!(
                        "unable to get metric {}: {} on {} {}",
                        metric_name, object.kind, namespace, object.name
                    ),
                    e,
                )
            })
    }
}
