//! Lifecycle facts read from a pod's metadata and status

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Pod;

/// What classification needs to know about one pod
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodFacts {
    pub name: String,
    /// Creation time, or the start time when the pod carries none
    pub created_at: Option<DateTime<Utc>>,
    /// Ready condition is `True`
    pub ready: bool,
    /// Last transition of the Ready condition; `None` if it was never recorded
    pub last_ready_transition: Option<DateTime<Utc>>,
    /// Being deleted, or in phase `Failed`
    pub terminated: bool,
    pub running: bool,
}

impl PodFacts {
    pub fn from_pod(pod: &Pod) -> Self {
        let status = pod.status.as_ref();
        let phase = status.and_then(|s| s.phase.as_deref());
        let ready_condition = status
            .and_then(|s| s.conditions.as_ref())
            .and_then(|conditions| conditions.iter().find(|c| c.type_ == "Ready"));

        Self {
            name: pod.metadata.name.clone().unwrap_or_default(),
            created_at: pod
                .metadata
                .creation_timestamp
                .as_ref()
                .or_else(|| status.and_then(|s| s.start_time.as_ref()))
                .map(|t| t.0),
            ready: ready_condition.is_some_and(|c| c.status == "True"),
            last_ready_transition: ready_condition
                .and_then(|c| c.last_transition_time.as_ref())
                .map(|t| t.0),
            terminated: pod.metadata.deletion_timestamp.is_some() || phase == Some("Failed"),
            running: phase == Some("Running"),
        }
    }

    pub fn is_running_and_ready(&self) -> bool {
        self.running && self.ready
    }
}
