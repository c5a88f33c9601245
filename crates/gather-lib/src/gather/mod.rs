//! Metric gathering for a scale target
//!
//! Validates each metric spec, routes it to the gatherer for its source
//! type and folds the per-spec outcomes: failed specs are dropped unless
//! every spec failed.

mod external;
mod object;
mod pods;
mod resource;
mod validate;


pub use external::ExternalGather;
pub use object::ObjectGather;
pub use pods::PodsGather;
pub use resource::ResourceGather;
pub use validate::{validate, ResourceTarget, ValidatedSource, ValueTarget};

use crate::client::{MetricsClient, PodLister};
use crate::error::GatherError;
use crate::metric::{Metric, MetricPayload};
use crate::metric_spec::{metric_name, source_label};
use crate::models::ScaleState;
use crate::observability::GatherMetrics;
use crate::podutil::{GraceWindows, PodReadyCounter};
use crate::selector::{parse_selector, SelectorResolver, Workload, WorkloadSelectorResolver};
use anyhow::Result;
use async_trait::async_trait;
use k8s_openapi::api::autoscaling::v2::{MetricIdentifier, MetricSpec};
use kube::core::Selector;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Gathers every metric of a scale target
#[async_trait]
pub trait Gatherer: Send + Sync {
    async fn get_metrics(
        &self,
        workload: &Workload,
        specs: &[MetricSpec],
        namespace: &str,
        scale: &ScaleState,
    ) -> Result<Vec<Metric>, GatherError>;
}

/// Grace windows applied to resource metrics
#[derive(Debug, Clone)]
pub struct GatherConfig {
    /// How long after turning ready a pod's resource samples are distrusted (default: 5 minutes)
    pub cpu_initialization_period: Duration,
    /// How long after creation a never-ready pod is left out (default: 30 seconds)
    pub initial_readiness_delay: Duration,
}

impl Default for GatherConfig {
    fn default() -> Self {
        Self {
            cpu_initialization_period: Duration::from_secs(300),
            initial_readiness_delay: Duration::from_secs(30),
        }
    }
}

impl GatherConfig {
    pub fn grace_windows(&self) -> GraceWindows {
        GraceWindows::from_std(self.cpu_initialization_period, self.initial_readiness_delay)
    }
}

/// Dispatches metric specs to the source gatherers
#[derive(Clone)]
pub struct Gather {
    resource: ResourceGather,
    pods: PodsGather,
    object: ObjectGather,
    external: ExternalGather,
    resolver: Arc<dyn SelectorResolver>,
    metrics: GatherMetrics,
}

impl Gather {
    pub fn new(
        metrics_client: Arc<dyn MetricsClient>,
        pod_lister: Arc<dyn PodLister>,
        config: GatherConfig,
    ) -> Self {
        let ready_counter = PodReadyCounter::new(pod_lister.clone());

        Self {
            resource: ResourceGather::new(
                metrics_client.clone(),
                pod_lister.clone(),
                config.grace_windows(),
            ),
            pods: PodsGather::new(metrics_client.clone(), pod_lister),
            object: ObjectGather::new(metrics_client.clone(), ready_counter.clone()),
            external: ExternalGather::new(metrics_client, ready_counter),
            resolver: Arc::new(WorkloadSelectorResolver),
            metrics: GatherMetrics::new(),
        }
    }

    /// Replace the default selector resolver
    pub fn with_selector_resolver(mut self, resolver: Arc<dyn SelectorResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    async fn gather_one(
        &self,
        spec: &MetricSpec,
        namespace: &str,
        selector: &Selector,
    ) -> Result<MetricPayload, GatherError> {
        let source = validate(spec)?;
        let context = format!("failed to get {} metric", source.source_type());

        let payload = match source {
            ValidatedSource::Resource { name, target } => {
                let metric = match target {
                    ResourceTarget::AverageValue => {
                        self.resource.get_raw_metric(name, namespace, selector).await
                    }
                    ResourceTarget::Utilization => {
                        self.resource.get_metric(name, namespace, selector).await
                    }
                }
                .map_err(|e| e.within(&context))?;
                self.metrics
                    .set_pod_gaps(metric.missing_pods.len(), metric.ignored_pods.len());
                MetricPayload::Resource(metric)
            }
            ValidatedSource::Pods { metric } => {
                let metric_selector = metric_selector(metric).map_err(|e| e.within(&context))?;
                let metric = self
                    .pods
                    .get_metric(&metric.name, namespace, selector, &metric_selector)
                    .await
                    .map_err(|e| e.within(&context))?;
                self.metrics.set_pod_gaps(metric.missing_pods.len(), 0);
                MetricPayload::Pods(metric)
            }
            ValidatedSource::Object {
                object,
                metric,
                target,
            } => {
                let metric_selector = metric_selector(metric).map_err(|e| e.within(&context))?;
                let metric = match target {
                    ValueTarget::Value => {
                        self.object
                            .get_metric(&metric.name, namespace, object, selector, &metric_selector)
                            .await
                    }
                    ValueTarget::AverageValue => {
                        self.object
                            .get_per_pod_metric(
                                &metric.name,
                                namespace,
                                object,
                                selector,
                                &metric_selector,
                            )
                            .await
                    }
                }
                .map_err(|e| e.within(&context))?;
                MetricPayload::Object(metric)
            }
            ValidatedSource::External { metric, target } => {
                let metric_selector = metric_selector(metric).map_err(|e| e.within(&context))?;
                let metric = match target {
                    ValueTarget::Value => {
                        self.external
                            .get_metric(&metric.name, namespace, &metric_selector, selector)
                            .await
                    }
                    ValueTarget::AverageValue => {
                        self.external
                            .get_per_pod_metric(&metric.name, namespace, &metric_selector, selector)
                            .await
                    }
                }
                .map_err(|e| e.within(&context))?;
                MetricPayload::External(metric)
            }
        };

        Ok(payload)
    }
}

#[async_trait]
impl Gatherer for Gather {
    async fn get_metrics(
        &self,
        workload: &Workload,
        specs: &[MetricSpec],
        namespace: &str,
        scale: &ScaleState,
    ) -> Result<Vec<Metric>, GatherError> {
        let start = Instant::now();
        let selector = self.resolver.selector_for(workload)?;
        let current_replicas = scale.current_replicas();

        let mut outcomes = Vec::with_capacity(specs.len());
        for spec in specs {
            let outcome = self.gather_one(spec, namespace, &selector).await;
            match &outcome {
                Ok(_) => self.metrics.inc_gathered(source_label(spec)),
                Err(e) => {
                    self.metrics.inc_errors(source_label(spec));
                    debug!(
                        source = source_label(spec),
                        metric = metric_name(spec).unwrap_or_default(),
                        error = %e,
                        "Failed to gather metric"
                    );
                }
            }
            outcomes.push(outcome);
        }

        self.metrics
            .observe_gather_latency(start.elapsed().as_secs_f64());

        let result = fold_outcomes(specs, outcomes, current_replicas);
        if let Err(e) = &result {
            warn!(
                workload = %workload.describe(),
                namespace = %namespace,
                error = %e,
                "All metrics invalid"
            );
        }
        result
    }
}

/// Keep successes in spec order; fail only when every spec failed
fn fold_outcomes(
    specs: &[MetricSpec],
    outcomes: Vec<Result<MetricPayload, GatherError>>,
    current_replicas: i32,
) -> Result<Vec<Metric>, GatherError> {
    let total = outcomes.len();
    let mut metrics = Vec::with_capacity(total);
    let mut first_error = None;
    let mut invalid = 0;

    for (spec, outcome) in specs.iter().zip(outcomes) {
        match outcome {
            Ok(payload) => metrics.push(Metric {
                current_replicas,
                spec: spec.clone(),
                payload,
            }),
            Err(e) => {
                invalid += 1;
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(first) if invalid == total => Err(GatherError::Aggregate {
            invalid,
            total,
            first: Box::new(first),
        }),
        _ => Ok(metrics),
    }
}

/// Selector narrowing a metric's series, validated before fetching
///
/// An unset selector matches every series.
fn metric_selector(metric: &MetricIdentifier) -> Result<Selector, GatherError> {
    match &metric.selector {
        Some(selector) => parse_selector(selector),
        None => Ok(Selector::default()),
    }
}

/// Spread `total` across ready pods; the undivided total when none are ready
pub(crate) fn average_over_ready(total: i64, ready_pod_count: i64) -> i64 {
    if ready_pod_count > 0 {
        total / ready_pod_count
    } else {
        total
    }
}

/// Builder for [`Gather`]
pub struct GatherBuilder {
    metrics_client: Option<Arc<dyn MetricsClient>>,
    pod_lister: Option<Arc<dyn PodLister>>,
    resolver: Option<Arc<dyn SelectorResolver>>,
    config: GatherConfig,
}

impl GatherBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            metrics_client: None,
            pod_lister: None,
            resolver: None,
            config: GatherConfig::default(),
        }
    }

    pub fn metrics_client(mut self, client: Arc<dyn MetricsClient>) -> Self {
        self.metrics_client = Some(client);
        self
    }

    pub fn pod_lister(mut self, lister: Arc<dyn PodLister>) -> Self {
        self.pod_lister = Some(lister);
        self
    }

    pub fn selector_resolver(mut self, resolver: Arc<dyn SelectorResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn cpu_initialization_period(mut self, period: Duration) -> Self {
        self.config.cpu_initialization_period = period;
        self
    }

    pub fn initial_readiness_delay(mut self, delay: Duration) -> Self {
        self.config.initial_readiness_delay = delay;
        self
    }

    pub fn config(mut self, config: GatherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Gather> {
        let metrics_client = self
            .metrics_client
            .ok_or_else(|| anyhow::anyhow!("Metrics client is required"))?;
        let pod_lister = self
            .pod_lister
            .ok_or_else(|| anyhow::anyhow!("Pod lister is required"))?;

        let gather = Gather::new(metrics_client, pod_lister, self.config);
        Ok(match self.resolver {
            Some(resolver) => gather.with_selector_resolver(resolver),
            None => gather,
        })
    }
}

impl Default for GatherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
