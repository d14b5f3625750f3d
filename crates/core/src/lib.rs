//! # Roadgen Core
//!
//! Core types and traits for the roadgen road-network generalization
//! library.
//!
//! This crate provides:
//! - `Feature`, `Fields`, `AttributeValue`: the vector feature model
//! - `FeatureSource` / `FeatureSink`: streaming boundary for passes
//! - `Feedback`: cooperative progress and cancellation
//! - A line geometry kernel (projection, sampling, averaging)
//! - The `Algorithm` trait for a consistent pass API

pub mod error;
pub mod feature;
pub mod feedback;
pub mod geometry;
pub mod stream;

pub use error::{Error, Result};
pub use feature::{attribute_key, AttributeValue, Feature, Fields, Predicate};
pub use feedback::{Feedback, NullFeedback};
pub use stream::{FeatureSink, FeatureSource, MemorySink, MemorySource};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::feature::{AttributeValue, Feature, Fields, Predicate};
    pub use crate::feedback::{Feedback, NullFeedback};
    pub use crate::stream::{FeatureSink, FeatureSource, MemorySink, MemorySource};
    pub use crate::Algorithm;
}

/// Core trait for all generalization passes.
///
/// A pass reads every feature from a source, transforms the network
/// according to its parameters, and writes the surviving features to a
/// sink. Cancellation requested through `feedback` stops input consumption
/// and flushes the work completed so far.
pub trait Algorithm {
    /// Parameters controlling pass behavior
    type Params;

    /// Returns the pass name
    fn name(&self) -> &'static str;

    /// Returns a description of what the pass does
    fn description(&self) -> &'static str;

    /// Execute the pass
    fn execute(
        &self,
        source: &dyn FeatureSource,
        sink: &mut dyn FeatureSink,
        params: Self::Params,
        feedback: &dyn Feedback,
    ) -> Result<()>;
}
