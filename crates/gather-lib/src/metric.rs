//! Gathered metric values handed to the replica evaluation step

use crate::models::PodMetricsInfo;
use chrono::{DateTime, Utc};
use k8s_openapi::api::autoscaling::v2::MetricSpec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Current value of an object or external metric
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_utilization: Option<i32>,
}

impl MetricValue {
    pub fn value(value: i64) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    pub fn average_value(average_value: i64) -> Self {
        Self {
            average_value: Some(average_value),
            ..Self::default()
        }
    }
}

/// Resource usage (cpu, memory) of the target's pods
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMetric {
    pub pod_metrics_info: PodMetricsInfo,
    /// Per-pod request totals; only populated for utilization targets
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub requests: BTreeMap<String, i64>,
    pub ready_pod_count: i64,
    pub ignored_pods: BTreeSet<String>,
    pub missing_pods: BTreeSet<String>,
    pub total_pods: usize,
    pub timestamp: DateTime<Utc>,
}

/// Custom per-pod metric of the target's pods
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodsMetric {
    pub pod_metrics_info: PodMetricsInfo,
    pub ready_pod_count: i64,
    /// Always `None`: custom pod metrics have no initialization window
    pub ignored_pods: Option<BTreeSet<String>>,
    pub missing_pods: BTreeSet<String>,
    pub total_pods: usize,
    pub timestamp: DateTime<Utc>,
}

/// Metric describing a single object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetric {
    pub current: MetricValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_pod_count: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

/// Metric from outside the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalMetric {
    pub current: MetricValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_pod_count: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

/// Source-specific part of a gathered metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricPayload {
    Object(ObjectMetric),
    Pods(PodsMetric),
    Resource(ResourceMetric),
    External(ExternalMetric),
}

/// One gathered metric per successful spec
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub current_replicas: i32,
    pub spec: MetricSpec,
    #[serde(flatten)]
    pub payload: MetricPayload,
}

impl Metric {
    pub fn object(&self) -> Option<&ObjectMetric> {
        match &self.payload {
            MetricPayload::Object(m) => Some(m),
            _ => None,
        }
    }

    pub fn pods(&self) -> Option<&PodsMetric> {
        match &self.payload {
            MetricPayload::Pods(m) => Some(m),
            _ => None,
        }
    }

    pub fn resource(&self) -> Option<&ResourceMetric> {
        match &self.payload {
            MetricPayload::Resource(m) => Some(m),
            _ => None,
        }
    }

    pub fn external(&self) -> Option<&ExternalMetric> {
        match &self.payload {
            MetricPayload::External(m) => Some(m),
            _ => None,
        }
    }

    /// Ready pod count reported by the payload, if it has one
    pub fn ready_pod_count(&self) -> Option<i64> {
        match &self.payload {
            MetricPayload::Object(m) => m.ready_pod_count,
            MetricPayload::Pods(m) => Some(m.ready_pod_count),
            MetricPayload::Resource(m) => Some(m.ready_pod_count),
            MetricPayload::External(m) => m.ready_pod_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{external_spec, identifier};
    use serde_json::json;

    #[test]
    fn test_metric_serializes_payload_under_source_key() {
        let timestamp = "2024-01-01T00:00:00Z".parse().unwrap();
        let metric = Metric {
            current_replicas: 3,
            spec: external_spec(identifier("queue_depth"), "Value"),
            payload: MetricPayload::External(ExternalMetric {
                current: MetricValue::value(2000),
                ready_pod_count: Some(3),
                timestamp,
            }),
        };

        let value = serde_json::to_value(&metric).unwrap();
        assert_eq!(value["current_replicas"], json!(3));
        assert_eq!(value["external"]["current"], json!({"value": 2000}));
        assert_eq!(value["external"]["ready_pod_count"], json!(3));
        assert!(value.get("object").is_none());
        assert_eq!(value["spec"]["type"], json!("External"));

        let back: Metric = serde_json::from_value(value).unwrap();
        assert_eq!(back, metric);
        assert_eq!(back.ready_pod_count(), Some(3));
        assert!(back.object().is_none());
    }
}
