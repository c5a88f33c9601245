//! Per-pod readiness classification

use super::facts::PodFacts;
use crate::models::PodMetric;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of classifying a single pod against its sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PodClass {
    /// Counted towards the metric
    Ready,
    /// Still initializing, left out without being a data gap
    Ignored,
    /// No sample available
    Missing,
}

/// Time windows during which an unready pod is not counted
///
/// Zero-length windows never ignore a pod.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraceWindows {
    /// How long after turning ready a pod's samples are still distrusted
    pub cpu_initialization_period: Duration,
    /// How long after creation a never-ready pod is treated as starting up
    pub initial_readiness_delay: Duration,
}

impl GraceWindows {
    pub fn new(cpu_initialization_period: Duration, initial_readiness_delay: Duration) -> Self {
        Self {
            cpu_initialization_period,
            initial_readiness_delay,
        }
    }

    /// Windows that classify purely on sample presence
    pub fn disabled() -> Self {
        Self::new(Duration::zero(), Duration::zero())
    }

    /// Convert from std durations, saturating values chrono cannot hold
    pub fn from_std(
        cpu_initialization_period: std::time::Duration,
        initial_readiness_delay: std::time::Duration,
    ) -> Self {
        let convert = |d: std::time::Duration| Duration::from_std(d).unwrap_or(Duration::MAX);
        Self::new(convert(cpu_initialization_period), convert(initial_readiness_delay))
    }
}

impl Default for GraceWindows {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Classify a pod given its sample (if any) at time `now`
pub fn classify(
    pod: &PodFacts,
    sample: Option<&PodMetric>,
    windows: &GraceWindows,
    now: DateTime<Utc>,
) -> PodClass {
    let Some(sample) = sample else {
        return PodClass::Missing;
    };

    if pod.ready {
        return PodClass::Ready;
    }

    match pod.last_ready_transition {
        // Never been ready: still starting up while young enough
        None => {
            // Creation stamps ahead of our clock count as age zero
            let age = pod
                .created_at
                .map(|created| now.signed_duration_since(created).max(Duration::zero()));
            if age.is_some_and(|age| age < windows.initial_readiness_delay) {
                return PodClass::Ignored;
            }
        }
        // Dropped out of ready shortly before the sample was taken
        Some(became_ready) => {
            let since = sample.timestamp.signed_duration_since(became_ready);
            if since >= Duration::zero() && since < windows.cpu_initialization_period {
                return PodClass::Ignored;
            }
        }
    }

    // Unready past every window but still sampled: count it
    PodClass::Ready
}
