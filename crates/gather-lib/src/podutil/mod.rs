//! Pod readiness classification and grouping
//!
//! Decides which pods of a scale target count towards a metric:
//! - ready pods contribute their sample
//! - ignored pods are still initializing and are left out
//! - missing pods have no sample at all

mod classify;
mod facts;
mod group;
mod quantity;
mod ready;


pub use classify::{classify, GraceWindows, PodClass};
pub use facts::PodFacts;
pub use group::{calculate_pod_requests, group_pods, PodGroup};
pub use quantity::milli_value;
pub use ready::PodReadyCounter;
