//! Cross-road removal.
//!
//! Dual carriageways crossing another road leave short link segments
//! between the carriageways. A link shorter than the threshold whose
//! endpoints each join at least two like-attributed roads is such an
//! artifact and is removed.

use geo::{Coord, Intersects, Point};

use roadgen_core::error::{Error, Result};
use roadgen_core::feature::{attribute_key, AttributeValue};
use roadgen_core::feedback::Feedback;
use roadgen_core::geometry::line_length;
use roadgen_core::stream::{FeatureSink, FeatureSource};
use roadgen_core::Algorithm;

use super::network::RoadNetwork;

/// Parameters for [`remove_crossroads`].
#[derive(Debug, Clone)]
pub struct RemoveCrossroadsParams {
    /// Attribute fields that must match between a link and its neighbors.
    pub fields: Vec<String>,
    /// Links shorter than this are candidates for removal, in map units.
    pub threshold: f64,
}

fn matching_neighbors_at(
    network: &RoadNetwork,
    id: u64,
    endpoint: Coord<f64>,
    key: &[AttributeValue],
    indices: &[usize],
    threshold: f64,
) -> usize {
    let point = Point::new(endpoint.x, endpoint.y);
    network
        .query_rect(endpoint, endpoint)
        .into_iter()
        .filter(|&other_id| other_id != id)
        .filter(|&other_id| {
            // only full-length roads count as flanking carriageways
            let other = network.get(other_id).unwrap();
            line_length(&other.line) >= threshold
                && attribute_key(&other.attributes, indices) == key
                && point.intersects(&other.line)
        })
        .count()
}

/// Remove short cross-link segments between carriageways.
pub fn remove_crossroads(
    source: &dyn FeatureSource,
    sink: &mut dyn FeatureSink,
    params: RemoveCrossroadsParams,
    feedback: &dyn Feedback,
) -> Result<()> {
    if !params.threshold.is_finite() || params.threshold <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "threshold",
            value: params.threshold.to_string(),
            reason: "must be a positive finite length".to_string(),
        });
    }
    let indices = source.fields().resolve(&params.fields)?;

    let mut network = RoadNetwork::load(source, 10.0, feedback)?;

    let ids = network.ids();
    let total = ids.len().max(1) as f64;
    let mut removed = 0usize;

    for (i, id) in ids.into_iter().enumerate() {
        if feedback.is_canceled() {
            break;
        }
        feedback.set_progress(10.0 + (i + 1) as f64 / total * 85.0);
        let road = network.get(id).unwrap();
        if line_length(&road.line) >= params.threshold {
            continue;
        }
        let key = attribute_key(&road.attributes, &indices);
        let first = road.line.0[0];
        let last = *road.line.0.last().unwrap();

        if matching_neighbors_at(&network, id, first, &key, &indices, params.threshold) >= 2
            && matching_neighbors_at(&network, id, last, &key, &indices, params.threshold) >= 2
        {
            network.remove(id);
            removed += 1;
        }
    }

    feedback.push_info(&format!("Removed {} cross roads", removed));

    feedback.set_progress(95.0);
    for feature in network.into_features() {
        sink.add_feature(feature)?;
    }
    feedback.set_progress(100.0);
    Ok(())
}

/// Cross-road removal pass.
pub struct RemoveCrossroads;

impl Algorithm for RemoveCrossroads {
    type Params = RemoveCrossroadsParams;

    fn name(&self) -> &'static str {
        "remove-crossroads"
    }

    fn description(&self) -> &'static str {
        "Removes short link roads left where dual carriageways cross"
    }

    fn execute(
        &self,
        source: &dyn FeatureSource,
        sink: &mut dyn FeatureSink,
        params: Self::Params,
        feedback: &dyn Feedback,
    ) -> Result<()> {
        remove_crossroads(source, sink, params, feedback)
    }
}
