//! Source type helpers over `autoscaling/v2` metric specs

use k8s_openapi::api::autoscaling::v2::MetricSpec;
use std::fmt;

/// Source types a spec can route to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricSourceType {
    Object,
    Pods,
    Resource,
    External,
}

impl MetricSourceType {
    /// Parse the spec's `type` field; `None` for unsupported types
    pub fn from_type(type_: &str) -> Option<Self> {
        match type_ {
            "Object" => Some(MetricSourceType::Object),
            "Pods" => Some(MetricSourceType::Pods),
            "Resource" => Some(MetricSourceType::Resource),
            "External" => Some(MetricSourceType::External),
            _ => None,
        }
    }

    /// Lowercase name used in messages and metric labels
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricSourceType::Object => "object",
            MetricSourceType::Pods => "pods",
            MetricSourceType::Resource => "resource",
            MetricSourceType::External => "external",
        }
    }
}

impl fmt::Display for MetricSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label for metrics and logs: the source name, or the raw type if unsupported
pub fn source_label(spec: &MetricSpec) -> &str {
    MetricSourceType::from_type(&spec.type_)
        .map(|s| s.as_str())
        .unwrap_or(spec.type_.as_str())
}

/// Metric name of the populated source block, if it has one
pub fn metric_name(spec: &MetricSpec) -> Option<&str> {
    if let Some(resource) = &spec.resource {
        return Some(resource.name.as_str());
    }
    spec.pods
        .as_ref()
        .map(|s| &s.metric)
        .or_else(|| spec.object.as_ref().map(|s| &s.metric))
        .or_else(|| spec.external.as_ref().map(|s| &s.metric))
        .map(|m| m.name.as_str())
}

/// Target type of the populated source block
pub fn target_type(spec: &MetricSpec) -> Option<&str> {
    spec.resource
        .as_ref()
        .map(|s| &s.target)
        .or_else(|| spec.pods.as_ref().map(|s| &s.target))
        .or_else(|| spec.object.as_ref().map(|s| &s.target))
        .or_else(|| spec.external.as_ref().map(|s| &s.target))
        .map(|t| t.type_.as_str())
}

/// Names of every source block set on the spec
pub(crate) fn populated_blocks(spec: &MetricSpec) -> Vec<&'static str> {
    let mut set = Vec::new();
    if spec.object.is_some() {
        set.push(MetricSourceType::Object.as_str());
    }
    if spec.pods.is_some() {
        set.push(MetricSourceType::Pods.as_str());
    }
    if spec.resource.is_some() {
        set.push(MetricSourceType::Resource.as_str());
    }
    if spec.external.is_some() {
        set.push(MetricSourceType::External.as_str());
    }
    if spec.container_resource.is_some() {
        set.push("container resource");
    }
    set
}
