//! Pod, spec and sample builders shared by unit tests

use crate::models::PodMetric;
use crate::selector::parse_selector;
use chrono::{DateTime, Duration, Utc};
use k8s_openapi::api::autoscaling::v2::{
    CrossVersionObjectReference, ExternalMetricSource, MetricIdentifier, MetricSpec,
    MetricTarget, ObjectMetricSource, PodsMetricSource, ResourceMetricSource,
};
use k8s_openapi::api::core::v1::{
    Container, Pod, PodCondition, PodSpec, PodStatus, ResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta, Time};
use kube::core::Selector;
use std::collections::BTreeMap;

pub fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Selector matching the given labels exactly
pub fn label_selector(pairs: &[(&str, &str)]) -> Selector {
    parse_selector(&LabelSelector {
        match_labels: Some(labels(pairs)),
        match_expressions: None,
    })
    .unwrap()
}

/// Container requesting the given quantities
pub fn container(name: &str, requests: &[(&str, &str)]) -> Container {
    Container {
        name: name.to_string(),
        resources: Some(ResourceRequirements {
            requests: Some(
                requests
                    .iter()
                    .map(|(r, q)| (r.to_string(), Quantity(q.to_string())))
                    .collect(),
            ),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn ready_condition(status: &str, transitioned: Option<DateTime<Utc>>) -> PodCondition {
    PodCondition {
        type_: "Ready".to_string(),
        status: status.to_string(),
        last_transition_time: transitioned.map(Time),
        ..Default::default()
    }
}

/// Running, ready pod created an hour before `now`, labelled `app=web`
pub fn ready_pod(name: &str, now: DateTime<Utc>) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(labels(&[("app", "web")])),
            creation_timestamp: Some(Time(now - Duration::hours(1))),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![container("app", &[("cpu", "500m"), ("memory", "1000")])],
            ..Default::default()
        }),
        status: Some(PodStatus {
            phase: Some("Running".to_string()),
            conditions: Some(vec![ready_condition(
                "True",
                Some(now - Duration::minutes(55)),
            )]),
            ..Default::default()
        }),
    }
}

/// Running pod with no recorded Ready transition, created `age` before `now`
///
/// A negative `age` puts the creation stamp ahead of `now`.
pub fn never_ready_pod(name: &str, age: Duration, now: DateTime<Utc>) -> Pod {
    let mut pod = ready_pod(name, now);
    pod.metadata.creation_timestamp = Some(Time(now - age));
    set_ready(&mut pod, ready_condition("False", None));
    pod
}

/// Currently unready pod whose Ready condition last changed at `transitioned`
pub fn unready_pod(name: &str, transitioned: DateTime<Utc>, now: DateTime<Utc>) -> Pod {
    let mut pod = ready_pod(name, now);
    set_ready(&mut pod, ready_condition("False", Some(transitioned)));
    pod
}

fn set_ready(pod: &mut Pod, condition: PodCondition) {
    if let Some(status) = pod.status.as_mut() {
        status.conditions = Some(vec![condition]);
    }
}

pub fn set_labels(pod: &mut Pod, pairs: &[(&str, &str)]) {
    pod.metadata.labels = Some(labels(pairs));
}

pub fn set_phase(pod: &mut Pod, phase: &str) {
    if let Some(status) = pod.status.as_mut() {
        status.phase = Some(phase.to_string());
    }
}

pub fn add_container(pod: &mut Pod, container: Container) {
    if let Some(spec) = pod.spec.as_mut() {
        spec.containers.push(container);
    }
}

pub fn sample(value: i64, timestamp: DateTime<Utc>) -> PodMetric {
    PodMetric { timestamp, value }
}

pub fn target(target_type: &str) -> MetricTarget {
    MetricTarget {
        type_: target_type.to_string(),
        ..Default::default()
    }
}

pub fn identifier(name: &str) -> MetricIdentifier {
    MetricIdentifier {
        name: name.to_string(),
        selector: None,
    }
}

pub fn resource_spec(name: &str, target_type: &str) -> MetricSpec {
    MetricSpec {
        type_: "Resource".to_string(),
        resource: Some(ResourceMetricSource {
            name: name.to_string(),
            target: target(target_type),
        }),
        ..Default::default()
    }
}

pub fn pods_spec(metric: MetricIdentifier, target_type: &str) -> MetricSpec {
    MetricSpec {
        type_: "Pods".to_string(),
        pods: Some(PodsMetricSource {
            metric,
            target: target(target_type),
        }),
        ..Default::default()
    }
}

pub fn object_spec(
    described_object: CrossVersionObjectReference,
    metric: MetricIdentifier,
    target_type: &str,
) -> MetricSpec {
    MetricSpec {
        type_: "Object".to_string(),
        object: Some(ObjectMetricSource {
            described_object,
            metric,
            target: target(target_type),
        }),
        ..Default::default()
    }
}

pub fn external_spec(metric: MetricIdentifier, target_type: &str) -> MetricSpec {
    MetricSpec {
        type_: "External".to_string(),
        external: Some(ExternalMetricSource {
            metric,
            target: target(target_type),
        }),
        ..Default::default()
    }
}

pub fn ingress() -> CrossVersionObjectReference {
    CrossVersionObjectReference {
        api_version: Some("networking.k8s.io/v1".to_string()),
        kind: "Ingress".to_string(),
        name: "main".to_string(),
    }
}
