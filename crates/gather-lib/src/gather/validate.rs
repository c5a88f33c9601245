//! Metric spec validation
//!
//! Turns a loosely shaped [`MetricSpec`] into a [`ValidatedSource`] that the
//! dispatcher can route without further checks.

use crate::error::GatherError;
use crate::metric_spec::{populated_blocks, MetricSourceType};
use k8s_openapi::api::autoscaling::v2::{
    CrossVersionObjectReference, MetricIdentifier, MetricSpec, MetricTarget,
};

/// Resource metric target kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceTarget {
    AverageValue,
    Utilization,
}

/// Object and external metric target kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTarget {
    Value,
    AverageValue,
}

/// Borrowed view of a spec that passed validation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValidatedSource<'a> {
    Resource {
        name: &'a str,
        target: ResourceTarget,
    },
    Pods {
        metric: &'a MetricIdentifier,
    },
    Object {
        object: &'a CrossVersionObjectReference,
        metric: &'a MetricIdentifier,
        target: ValueTarget,
    },
    External {
        metric: &'a MetricIdentifier,
        target: ValueTarget,
    },
}

impl ValidatedSource<'_> {
    pub fn source_type(&self) -> MetricSourceType {
        match self {
            ValidatedSource::Resource { .. } => MetricSourceType::Resource,
            ValidatedSource::Pods { .. } => MetricSourceType::Pods,
            ValidatedSource::Object { .. } => MetricSourceType::Object,
            ValidatedSource::External { .. } => MetricSourceType::External,
        }
    }
}

/// Check the spec shape and that its target type suits the source
pub fn validate(spec: &MetricSpec) -> Result<ValidatedSource<'_>, GatherError> {
    let source = MetricSourceType::from_type(&spec.type_).ok_or_else(|| {
        GatherError::Validation(format!("unknown metric source type {:?}", spec.type_))
    })?;

    let others: Vec<&str> = populated_blocks(spec)
        .into_iter()
        .filter(|block| *block != source.as_str())
        .collect();
    if !others.is_empty() {
        return Err(invalid(source, &format!("must not set {}", others.join(", "))));
    }

    match source {
        MetricSourceType::Resource => {
            let resource = spec
                .resource
                .as_ref()
                .ok_or_else(|| missing_block(source))?;
            if resource.name.is_empty() {
                return Err(invalid(source, "name must be set"));
            }
            let target = match resource.target.type_.as_str() {
                "AverageValue" => ResourceTarget::AverageValue,
                "Utilization" => ResourceTarget::Utilization,
                _ => {
                    return Err(invalid(
                        source,
                        "must be either average value or average utilization",
                    ))
                }
            };
            Ok(ValidatedSource::Resource {
                name: &resource.name,
                target,
            })
        }
        MetricSourceType::Pods => {
            let pods = spec.pods.as_ref().ok_or_else(|| missing_block(source))?;
            check_metric_name(source, &pods.metric)?;
            if pods.target.type_ != "AverageValue" {
                return Err(invalid(source, "must be average value"));
            }
            Ok(ValidatedSource::Pods {
                metric: &pods.metric,
            })
        }
        MetricSourceType::Object => {
            let object = spec.object.as_ref().ok_or_else(|| missing_block(source))?;
            check_metric_name(source, &object.metric)?;
            let target = value_target(source, &object.target)?;
            Ok(ValidatedSource::Object {
                object: &object.described_object,
                metric: &object.metric,
                target,
            })
        }
        MetricSourceType::External => {
            let external = spec
                .external
                .as_ref()
                .ok_or_else(|| missing_block(source))?;
            check_metric_name(source, &external.metric)?;
            let target = value_target(source, &external.target)?;
            Ok(ValidatedSource::External {
                metric: &external.metric,
                target,
            })
        }
    }
}

fn value_target(
    source: MetricSourceType,
    target: &MetricTarget,
) -> Result<ValueTarget, GatherError> {
    match target.type_.as_str() {
        "Value" => Ok(ValueTarget::Value),
        "AverageValue" => Ok(ValueTarget::AverageValue),
        _ => Err(invalid(source, "must be either value or average value")),
    }
}

fn check_metric_name(
    source: MetricSourceType,
    metric: &MetricIdentifier,
) -> Result<(), GatherError> {
    if metric.name.is_empty() {
        return Err(invalid(source, "metric name must be set"));
    }
    Ok(())
}

fn missing_block(source: MetricSourceType) -> GatherError {
    invalid(source, &format!("{} must be set", source.as_str()))
}

fn invalid(source: MetricSourceType, reason: &str) -> GatherError {
    GatherError::Validation(format!("invalid {} metric source: {}", source, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        external_spec, identifier, ingress, object_spec, pods_spec, resource_spec, target,
    };
    use k8s_openapi::api::autoscaling::v2::ResourceMetricSource;

    fn message(spec: &MetricSpec) -> String {
        validate(spec).unwrap_err().to_string()
    }

    #[test]
    fn test_valid_resource_targets() {
        let spec = resource_spec("cpu", "Utilization");
        assert_eq!(
            validate(&spec).unwrap(),
            ValidatedSource::Resource {
                name: "cpu",
                target: ResourceTarget::Utilization
            }
        );

        let spec = resource_spec("memory", "AverageValue");
        assert!(matches!(
            validate(&spec).unwrap(),
            ValidatedSource::Resource {
                target: ResourceTarget::AverageValue,
                ..
            }
        ));
    }

    #[test]
    fn test_resource_value_target_rejected() {
        let spec = resource_spec("cpu", "Value");
        assert_eq!(
            message(&spec),
            "invalid resource metric source: must be either average value or average utilization"
        );
        assert!(matches!(validate(&spec), Err(GatherError::Validation(_))));
    }

    #[test]
    fn test_unknown_source_type() {
        let spec = MetricSpec {
            type_: "ContainerResource".to_string(),
            ..Default::default()
        };
        assert_eq!(
            message(&spec),
            "unknown metric source type \"ContainerResource\""
        );
    }

    #[test]
    fn test_unknown_target_type() {
        let spec = external_spec(identifier("queue"), "Percent");
        assert_eq!(
            message(&spec),
            "invalid external metric source: must be either value or average value"
        );
    }

    #[test]
    fn test_pods_requires_average_value() {
        let spec = pods_spec(identifier("qps"), "Value");
        assert_eq!(message(&spec), "invalid pods metric source: must be average value");

        let spec = pods_spec(identifier("qps"), "AverageValue");
        assert_eq!(validate(&spec).unwrap().source_type(), MetricSourceType::Pods);
    }

    #[test]
    fn test_object_and_external_reject_utilization() {
        let object = object_spec(ingress(), identifier("hits"), "Utilization");
        assert_eq!(
            message(&object),
            "invalid object metric source: must be either value or average value"
        );

        let external = external_spec(identifier("queue"), "Utilization");
        assert_eq!(
            message(&external),
            "invalid external metric source: must be either value or average value"
        );
    }

    #[test]
    fn test_object_keeps_described_object() {
        let spec = object_spec(ingress(), identifier("hits"), "AverageValue");
        match validate(&spec).unwrap() {
            ValidatedSource::Object {
                object,
                metric,
                target,
            } => {
                assert_eq!(object.kind, "Ingress");
                assert_eq!(metric.name, "hits");
                assert_eq!(target, ValueTarget::AverageValue);
            }
            other => panic!("unexpected source: {other:?}"),
        }
    }

    #[test]
    fn test_missing_source_block() {
        let mut spec = resource_spec("cpu", "Utilization");
        spec.type_ = "External".to_string();
        spec.resource = None;

        assert_eq!(
            message(&spec),
            "invalid external metric source: external must be set"
        );
    }

    #[test]
    fn test_extra_source_block() {
        let mut spec = pods_spec(identifier("qps"), "AverageValue");
        spec.resource = Some(ResourceMetricSource {
            name: "cpu".to_string(),
            target: target("Utilization"),
        });

        assert_eq!(
            message(&spec),
            "invalid pods metric source: must not set resource"
        );
    }

    #[test]
    fn test_empty_metric_name() {
        let spec = external_spec(identifier(""), "Value");
        assert_eq!(
            message(&spec),
            "invalid external metric source: metric name must be set"
        );
    }
}
