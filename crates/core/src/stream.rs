//! Feature stream boundary: sources feed algorithms, sinks collect output.
//!
//! Geometry and attribute serialization live outside the core; these
//! traits only move `(id, attributes, geometry)` records in and out of a
//! pass.

use crate::error::Result;
use crate::feature::{Feature, Fields};

/// A finite sequence of features with a shared field schema.
///
/// `features()` starts a fresh iteration on every call, so a source can be
/// consumed more than once. `feature_count()` feeds progress math and may
/// be 0 when unknown.
pub trait FeatureSource {
    fn fields(&self) -> &Fields;

    fn feature_count(&self) -> usize;

    fn features(&self) -> Box<dyn Iterator<Item = Feature> + '_>;
}

/// Receives the surviving/derived features of a pass, each exactly once.
pub trait FeatureSink {
    fn add_feature(&mut self, feature: Feature) -> Result<()>;
}

/// In-memory feature source, used by tests and by drivers that parse a
/// whole file up front.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    fields: Fields,
    features: Vec<Feature>,
}

impl MemorySource {
    pub fn new(fields: Fields, features: Vec<Feature>) -> Self {
        Self { fields, features }
    }
}

impl FeatureSource for MemorySource {
    fn fields(&self) -> &Fields {
        &self.fields
    }

    fn feature_count(&self) -> usize {
        self.features.len()
    }

    fn features(&self) -> Box<dyn Iterator<Item = Feature> + '_> {
        Box::new(self.features.iter().cloned())
    }
}

/// In-memory feature sink.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub features: Vec<Feature>,
}

impl FeatureSink for MemorySink {
    fn add_feature(&mut self, feature: Feature) -> Result<()> {
        self.features.push(feature);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::AttributeValue;
    use geo::{Geometry, LineString};

    #[test]
    fn test_memory_source_restartable() {
        let source = MemorySource::new(
            Fields::new(vec!["name".into()]),
            vec![Feature::new(
                1,
                vec![AttributeValue::String("a".into())],
                Geometry::LineString(LineString::from(vec![(0.0, 0.0), (1.0, 1.0)])),
            )],
        );

        assert_eq!(source.feature_count(), 1);
        assert_eq!(source.features().count(), 1);
        // second iteration starts over
        assert_eq!(source.features().count(), 1);
    }

    #[test]
    fn test_memory_sink_collects() {
        let mut sink = MemorySink::default();
        sink.add_feature(Feature::new(
            7,
            vec![],
            Geometry::LineString(LineString::from(vec![(0.0, 0.0), (2.0, 0.0)])),
        ))
        .unwrap();
        assert_eq!(sink.features.len(), 1);
        assert_eq!(sink.features[0].id, 7);
    }
}
