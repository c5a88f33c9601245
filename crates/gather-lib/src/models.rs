//! Core data models for metric gathering
//!
//! Pods, metric specs and object references are the Kubernetes API types
//! from `k8s-openapi`; this module only holds what the metrics APIs return.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single pod sample from a metrics API, value in milli-units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodMetric {
    pub timestamp: DateTime<Utc>,
    pub value: i64,
}

/// Pod name -> sample
pub type PodMetricsInfo = BTreeMap<String, PodMetric>;

/// Scale subresource view of the scale target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleState {
    #[serde(default)]
    pub replicas: i32,
}

impl ScaleState {
    pub fn new(replicas: i32) -> Self {
        Self { replicas }
    }

    /// Replica count attached to every gathered metric
    pub fn current_replicas(&self) -> i32 {
        self.replicas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_state_defaults_to_zero() {
        let scale: ScaleState = serde_json::from_str("{}").unwrap();
        assert_eq!(scale.current_replicas(), 0);
        assert_eq!(ScaleState::new(4).current_replicas(), 4);
    }

    #[test]
    fn test_pod_metric_deserialize() {
        let sample: PodMetric =
            serde_json::from_str(r#"{"timestamp": "2024-01-01T00:00:00Z", "value": 250}"#)
                .unwrap();
        assert_eq!(sample.value, 250);
        assert_eq!(sample.timestamp.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }
}
