//! Error types for metric gathering

use thiserror::Error;

/// Boxed cause carried by [`GatherError::Fetch`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced while gathering metrics for a scale target
#[derive(Debug, Error)]
pub enum GatherError {
    /// A metric spec has the wrong shape or an unsupported target type
    #[error("{0}")]
    Validation(String),

    /// A workload or metric selector could not be resolved or is malformed
    #[error("{0}")]
    Selector(String),

    /// A fetch/listing capability failed, or an inner error wrapped with context
    #[error("{context}: {source}")]
    Fetch {
        context: String,
        #[source]
        source: BoxError,
    },

    /// The pod selector matched nothing
    #[error("no pods returned by selector while calculating replica count")]
    NoPods,

    /// A container has no request for the resource being measured
    #[error("missing request for {resource}")]
    MissingRequest { resource: String },

    /// A resource quantity could not be read as milli-units
    #[error("invalid quantity {quantity:?} for {resource}: {reason}")]
    Quantity {
        resource: String,
        quantity: String,
        reason: String,
    },

    /// A sum of samples or requests does not fit in 64 bits
    #[error("{0} overflows a 64-bit milli value")]
    Overflow(String),

    /// Every metric spec failed
    #[error("invalid metrics ({invalid} invalid out of {total}), first error is: {first}")]
    Aggregate {
        invalid: usize,
        total: usize,
        first: Box<GatherError>,
    },
}

impl GatherError {
    /// Wrap a capability failure with the operation that failed
    pub fn fetch(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        GatherError::Fetch {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Wrap this error with an outer context message
    pub fn within(self, context: impl Into<String>) -> Self {
        GatherError::Fetch {
            context: context.into(),
            source: Box::new(self),
        }
    }
}
