//! File-backed metric and pod sources
//!
//! A [`Snapshot`] captures everything one gather pass needs: the scale target,
//! its metric specs, the pods in its namespace and the samples each metrics API
//! would return. [`SnapshotSource`] serves it through [`MetricsClient`] and
//! [`PodLister`] so the gatherers run unchanged against recorded data.

use crate::client::{async_trait, MetricsClient, PodLister};
use crate::models::{PodMetricsInfo, ScaleState};
use crate::selector::Workload;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use k8s_openapi::api::autoscaling::v2::{CrossVersionObjectReference, MetricSpec};
use k8s_openapi::api::core::v1::Pod;
use kube::core::{Selector, SelectorExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Value reported for a single object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSample {
    pub object: CrossVersionObjectReference,
    pub metric: String,
    pub value: i64,
    pub timestamp: DateTime<Utc>,
}

/// One labelled external series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalSample {
    pub metric: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    pub value: i64,
    pub timestamp: DateTime<Utc>,
}

/// Recorded state of a scale target and its metrics APIs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub namespace: Option<String>,
    pub workload: Workload,
    #[serde(default)]
    pub scale: ScaleState,
    #[serde(default)]
    pub metrics: Vec<MetricSpec>,
    #[serde(default)]
    pub pods: Vec<Pod>,
    /// Resource name -> per-pod usage
    #[serde(default)]
    pub resource_metrics: BTreeMap<String, PodMetricsInfo>,
    /// Custom metric name -> per-pod samples
    #[serde(default)]
    pub pod_metrics: BTreeMap<String, PodMetricsInfo>,
    #[serde(default)]
    pub object_metrics: Vec<ObjectSample>,
    #[serde(default)]
    pub external_metrics: Vec<ExternalSample>,
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse snapshot")
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut json = String::new();
        reader
            .read_to_string(&mut json)
            .context("Failed to read snapshot")?;
        Self::from_json(&json)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&json)
    }
}

/// Serves a [`Snapshot`] as metrics APIs and pod cache
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    snapshot: Snapshot,
    captured_at: DateTime<Utc>,
}

impl SnapshotSource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            captured_at: Utc::now(),
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    fn pod_names(&self, selector: &Selector) -> Vec<&str> {
        self.snapshot
            .pods
            .iter()
            .filter(|p| pod_matches(p, selector))
            .filter_map(|p| p.metadata.name.as_deref())
            .collect()
    }

    /// Samples of the selected pods, stamped with the newest sample time
    fn select_samples(
        &self,
        samples: &PodMetricsInfo,
        selector: &Selector,
    ) -> (PodMetricsInfo, DateTime<Utc>) {
        let names = self.pod_names(selector);
        let selected: PodMetricsInfo = samples
            .iter()
            .filter(|(name, _)| names.contains(&name.as_str()))
            .map(|(name, sample)| (name.clone(), *sample))
            .collect();
        let timestamp = selected
            .values()
            .map(|s| s.timestamp)
            .max()
            .unwrap_or(self.captured_at);
        (selected, timestamp)
    }
}

#[async_trait]
impl MetricsClient for SnapshotSource {
    async fn resource_metric(
        &self,
        resource: &str,
        _namespace: &str,
        selector: &Selector,
    ) -> Result<(PodMetricsInfo, DateTime<Utc>)> {
        let samples = self
            .snapshot
            .resource_metrics
            .get(resource)
            .ok_or_else(|| anyhow!("no metrics returned from resource metrics API"))?;
        Ok(self.select_samples(samples, selector))
    }

    async fn raw_metric(
        &self,
        metric_name: &str,
        _namespace: &str,
        selector: &Selector,
        _metric_selector: &Selector,
    ) -> Result<(PodMetricsInfo, DateTime<Utc>)> {
        let samples = self
            .snapshot
            .pod_metrics
            .get(metric_name)
            .ok_or_else(|| anyhow!("no metrics returned from custom metrics API"))?;
        Ok(self.select_samples(samples, selector))
    }

    async fn object_metric(
        &self,
        metric_name: &str,
        _namespace: &str,
        object: &CrossVersionObjectReference,
        _metric_selector: &Selector,
    ) -> Result<(i64, DateTime<Utc>)> {
        self.snapshot
            .object_metrics
            .iter()
            .find(|s| {
                s.metric == metric_name
                    && s.object.kind == object.kind
                    && s.object.name == object.name
            })
            .map(|s| (s.value, s.timestamp))
            .ok_or_else(|| anyhow!("no metrics returned from custom metrics API"))
    }

    async fn external_metric(
        &self,
        metric_name: &str,
        _namespace: &str,
        metric_selector: &Selector,
    ) -> Result<(Vec<i64>, DateTime<Utc>)> {
        let series: Vec<&ExternalSample> = self
            .snapshot
            .external_metrics
            .iter()
            .filter(|s| s.metric == metric_name && metric_selector.matches(&s.labels))
            .collect();

        let timestamp = series
            .iter()
            .map(|s| s.timestamp)
            .max()
            .ok_or_else(|| anyhow!("no metrics returned from external metrics API"))?;

        Ok((series.iter().map(|s| s.value).collect(), timestamp))
    }
}

#[async_trait]
impl PodLister for SnapshotSource {
    async fn list_pods(&self, _namespace: &str, selector: &Selector) -> Result<Vec<Pod>> {
        Ok(self
            .snapshot
            .pods
            .iter()
            .filter(|p| pod_matches(p, selector))
            .cloned()
            .collect())
    }
}

fn pod_matches(pod: &Pod, selector: &Selector) -> bool {
    match &pod.metadata.labels {
        Some(labels) => selector.matches(labels),
        None => selector.matches(&BTreeMap::new()),
    }
}
