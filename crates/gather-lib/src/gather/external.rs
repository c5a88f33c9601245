//! Metrics from systems outside the cluster

use super::average_over_ready;
use crate::client::MetricsClient;
use crate::error::GatherError;
use crate::metric::{ExternalMetric, MetricValue};
use crate::podutil::PodReadyCounter;
use chrono::{DateTime, Utc};
use kube::core::Selector;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct ExternalGather {
    metrics_client: Arc<dyn MetricsClient>,
    ready_counter: PodReadyCounter,
}

impl ExternalGather {
    pub fn new(metrics_client: Arc<dyn MetricsClient>, ready_counter: PodReadyCounter) -> Self {
        Self {
            metrics_client,
            ready_counter,
        }
    }

    /// Value target: sum of all matching series
    pub async fn get_metric(
        &self,
        metric_name: &str,
        namespace: &str,
        metric_selector: &Selector,
        selector: &Selector,
    ) -> Result<ExternalMetric, GatherError> {
        let (total, timestamp) = self.fetch_total(metric_name, namespace, metric_selector).await?;
        let ready_pod_count = self.ready_counter.ready_pod_count(namespace, selector).await?;

        Ok(ExternalMetric {
            current: MetricValue::value(total),
            ready_pod_count: Some(ready_pod_count),
            timestamp,
        })
    }

    /// Average value target: sum of all matching series spread across ready pods
    pub async fn get_per_pod_metric(
        &self,
        metric_name: &str,
        namespace: &str,
        metric_selector: &Selector,
        selector: &Selector,
    ) -> Result<ExternalMetric, GatherError> {
        let (total, timestamp) = self.fetch_total(metric_name, namespace, metric_selector).await?;
        let ready_pod_count = self.ready_counter.ready_pod_count(namespace, selector).await?;

        Ok(ExternalMetric {
            current: MetricValue::average_value(average_over_ready(total, ready_pod_count)),
            ready_pod_count: Some(ready_pod_count),
            timestamp,
        })
    }

    async fn fetch_total(
        &self,
        metric_name: &str,
        namespace: &str,
        metric_selector: &Selector,
    ) -> Result<(i64, DateTime<Utc>), GatherError> {
        let (values, timestamp) = self
            .metrics_client
            .external_metric(metric_name, namespace, metric_selector)
            .await
            .map_err(|e| {
                GatherError::fetch(
                    format!(
                        "unable to get external metric {}/{}/{{{}}}",
                        namespace, metric_name, metric_selector
                    ),
                    e,
                )
            })?;

        debug!(metric = %metric_name, series = values.len(), "Fetched external metric");
        let total = values
            .iter()
            .try_fold(0i64, |sum, v| sum.checked_add(*v))
            .ok_or_else(|| {
                GatherError::Overflow(format!("sum of external metric {}", metric_name))
            })?;
        Ok((total, timestamp))
    }
}
