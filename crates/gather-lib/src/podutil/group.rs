//! Grouping a pod population against a sample map

use super::classify::{classify, GraceWindows, PodClass};
use super::facts::PodFacts;
use super::quantity::milli_value;
use crate::error::GatherError;
use crate::models::PodMetricsInfo;
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Pod;
use std::collections::{BTreeMap, BTreeSet};

/// Result of grouping the target's pods
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodGroup {
    pub ready_pod_count: i64,
    pub total_pods: usize,
    pub missing_pods: BTreeSet<String>,
    pub ignored_pods: BTreeSet<String>,
    /// Samples of the pods classified ready
    pub ready_metrics: PodMetricsInfo,
}

/// Classify every pod and accumulate counts
///
/// Terminating and failed pods are counted in `total_pods` only. Samples for
/// pods that are not in `pods` are not counted anywhere.
pub fn group_pods(
    pods: &[Pod],
    metrics: &PodMetricsInfo,
    windows: &GraceWindows,
    now: DateTime<Utc>,
) -> PodGroup {
    let mut group = PodGroup {
        total_pods: pods.len(),
        ..PodGroup::default()
    };

    for pod in pods.iter().map(PodFacts::from_pod) {
        if pod.terminated {
            continue;
        }

        let sample = metrics.get(&pod.name);
        match classify(&pod, sample, windows, now) {
            PodClass::Missing => {
                group.missing_pods.insert(pod.name);
            }
            PodClass::Ignored => {
                group.ignored_pods.insert(pod.name);
            }
            PodClass::Ready => {
                group.ready_pod_count += 1;
                if let Some(sample) = sample {
                    group.ready_metrics.insert(pod.name, *sample);
                }
            }
        }
    }

    group
}

/// Sum container requests for `resource` per pod, in milli-units
pub fn calculate_pod_requests(
    pods: &[Pod],
    resource: &str,
) -> Result<BTreeMap<String, i64>, GatherError> {
    let mut requests = BTreeMap::new();

    for pod in pods {
        let name = pod.metadata.name.clone().unwrap_or_default();
        let containers = pod.spec.iter().flat_map(|spec| &spec.containers);

        let mut pod_sum = 0i64;
        for container in containers {
            let quantity = container
                .resources
                .as_ref()
                .and_then(|r| r.requests.as_ref())
                .and_then(|r| r.get(resource))
                .ok_or_else(|| GatherError::MissingRequest {
                    resource: resource.to_string(),
                })?;
            let request = milli_value(quantity).map_err(|reason| GatherError::Quantity {
                resource: resource.to_string(),
                quantity: quantity.0.clone(),
                reason,
            })?;
            pod_sum = pod_sum.checked_add(request).ok_or_else(|| {
                GatherError::Overflow(format!("{} request of pod {}", resource, name))
            })?;
        }
        requests.insert(name, pod_sum);
    }

    Ok(requests)
}
