//! Ready pod counting for object and external metrics

use super::facts::PodFacts;
use crate::client::PodLister;
use crate::error::GatherError;
use kube::core::Selector;
use std::sync::Arc;
use tracing::debug;

/// Counts running, ready pods of the scale target
#[derive(Clone)]
pub struct PodReadyCounter {
    pod_lister: Arc<dyn PodLister>,
}

impl PodReadyCounter {
    pub fn new(pod_lister: Arc<dyn PodLister>) -> Self {
        Self { pod_lister }
    }

    pub async fn ready_pod_count(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> Result<i64, GatherError> {
        let pods = self
            .pod_lister
            .list_pods(namespace, selector)
            .await
            .map_err(|e| {
                GatherError::fetch("unable to get pods while calculating replica count", e)
            })?;

        let ready = pods
            .iter()
            .filter(|p| PodFacts::from_pod(p).is_running_and_ready())
            .count() as i64;

        debug!(
            namespace = %namespace,
            selector = %selector,
            total = pods.len(),
            ready,
            "Counted ready pods"
        );

        Ok(ready)
    }
}
