//! Label selectors and pod selector resolution for scale targets
//!
//! A scale target is either one of the `apps/v1` workloads or any other
//! object carrying `spec.selector`. Both resolve to a validated
//! [`Selector`] used for pod listing and series matching.

use crate::error::GatherError;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::core::{DynamicObject, Selector};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Check a label selector's requirements and convert it for matching
///
/// `In`/`NotIn` need values, `Exists`/`DoesNotExist` must have none.
pub fn parse_selector(selector: &LabelSelector) -> Result<Selector, GatherError> {
    for req in selector.match_expressions.iter().flatten() {
        if req.key.is_empty() {
            return Err(GatherError::Selector(
                "invalid selector: requirement key must not be empty".to_string(),
            ));
        }
        let values = req.values.as_deref().unwrap_or_default();
        match req.operator.as_str() {
            "In" | "NotIn" if values.is_empty() => {
                return Err(GatherError::Selector(format!(
                    "invalid selector: values must be non-empty for {} on key {}",
                    req.operator, req.key
                )));
            }
            "Exists" | "DoesNotExist" if !values.is_empty() => {
                return Err(GatherError::Selector(format!(
                    "invalid selector: values must be empty for {} on key {}",
                    req.operator, req.key
                )));
            }
            _ => {}
        }
    }

    Selector::try_from(selector.clone())
        .map_err(|e| GatherError::Selector(format!("invalid selector: {}", e)))
}

/// The scale target whose pods are measured
#[derive(Debug, Clone)]
pub enum Workload {
    Deployment(Deployment),
    StatefulSet(StatefulSet),
    ReplicaSet(ReplicaSet),
    /// Any other kind, read through `spec.selector`
    Unstructured(DynamicObject),
}

impl Workload {
    /// Typed for `apps/v1` workloads, unstructured for everything else
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let api_version = value.get("apiVersion").and_then(Value::as_str);
        let kind = match (api_version, value.get("kind").and_then(Value::as_str)) {
            (Some("apps/v1"), Some(kind)) => kind.to_string(),
            _ => String::new(),
        };

        match kind.as_str() {
            "Deployment" => serde_json::from_value(value).map(Workload::Deployment),
            "StatefulSet" => serde_json::from_value(value).map(Workload::StatefulSet),
            "ReplicaSet" => serde_json::from_value(value).map(Workload::ReplicaSet),
            _ => serde_json::from_value(value).map(Workload::Unstructured),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Workload::Deployment(_) => "Deployment",
            Workload::StatefulSet(_) => "StatefulSet",
            Workload::ReplicaSet(_) => "ReplicaSet",
            Workload::Unstructured(obj) => obj
                .types
                .as_ref()
                .map(|t| t.kind.as_str())
                .or_else(|| obj.data.get("kind").and_then(Value::as_str))
                .unwrap_or("Unknown"),
        }
    }

    pub fn name(&self) -> Option<&str> {
        let metadata = match self {
            Workload::Deployment(w) => &w.metadata,
            Workload::StatefulSet(w) => &w.metadata,
            Workload::ReplicaSet(w) => &w.metadata,
            Workload::Unstructured(obj) => &obj.metadata,
        };
        metadata.name.as_deref()
    }

    /// `Kind/name` for log and error messages
    pub fn describe(&self) -> String {
        format!("{}/{}", self.kind(), self.name().unwrap_or("unnamed"))
    }

    fn label_selector(&self) -> Result<LabelSelector, String> {
        let typed = match self {
            Workload::Deployment(w) => w.spec.as_ref().map(|s| &s.selector),
            Workload::StatefulSet(w) => w.spec.as_ref().map(|s| &s.selector),
            Workload::ReplicaSet(w) => w.spec.as_ref().map(|s| &s.selector),
            Workload::Unstructured(obj) => return selector_from_value(&obj.data),
        };
        typed
            .cloned()
            .ok_or_else(|| "selector is not set".to_string())
    }
}

impl<'de> Deserialize<'de> for Workload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Workload::from_value(value).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Workload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Workload::Deployment(w) => w.serialize(serializer),
            Workload::StatefulSet(w) => w.serialize(serializer),
            Workload::ReplicaSet(w) => w.serialize(serializer),
            Workload::Unstructured(obj) => obj.serialize(serializer),
        }
    }
}

/// Resolves the pod selector of a scale target
pub trait SelectorResolver: Send + Sync {
    fn selector_for(&self, workload: &Workload) -> Result<Selector, GatherError>;
}

/// Reads the typed `spec.selector`, or the generic one for other kinds
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkloadSelectorResolver;

impl SelectorResolver for WorkloadSelectorResolver {
    fn selector_for(&self, workload: &Workload) -> Result<Selector, GatherError> {
        let selector = workload.label_selector().map_err(|reason| {
            GatherError::Selector(format!(
                "unable to resolve pod selector for {}: {}",
                workload.describe(),
                reason
            ))
        })?;

        parse_selector(&selector)
    }
}

/// `spec.selector` is either a LabelSelector or a flat label map
/// (ReplicationController style)
fn selector_from_value(data: &Value) -> Result<LabelSelector, String> {
    let raw = data
        .pointer("/spec/selector")
        .ok_or_else(|| "spec.selector is not set".to_string())?;

    let obj = raw
        .as_object()
        .ok_or_else(|| "spec.selector is not an object".to_string())?;

    if obj.contains_key("matchLabels") || obj.contains_key("matchExpressions") {
        return serde_json::from_value(raw.clone()).map_err(|e| e.to_string());
    }

    let mut labels = BTreeMap::new();
    for (key, val) in obj {
        let val = val
            .as_str()
            .ok_or_else(|| format!("spec.selector.{} is not a string", key))?;
        labels.insert(key.clone(), val.to_string());
    }
    Ok(LabelSelector {
        match_labels: Some(labels),
        match_expressions: None,
    })
}
