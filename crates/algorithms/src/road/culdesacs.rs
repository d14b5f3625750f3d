//! Cul-de-sac removal.
//!
//! Short roads that dead-end are dropped. A road survives only when it is
//! at least the threshold length, or when both of its endpoints connect to
//! other roads. Keep/drop decisions are made against the full input set
//! and removals apply after the loop, so dropping one spur cannot cascade
//! into dropping a connector that touched it.

use geo::{Coord, Intersects, Point};

use roadgen_core::error::{Error, Result};
use roadgen_core::feedback::Feedback;
use roadgen_core::geometry::line_length;
use roadgen_core::stream::{FeatureSink, FeatureSource};
use roadgen_core::Algorithm;

use super::network::RoadNetwork;

/// Parameters for [`remove_culdesacs`].
#[derive(Debug, Clone, Copy)]
pub struct RemoveCuldesacsParams {
    /// Roads shorter than this are candidates for removal, in map units.
    pub threshold: f64,
}

impl Default for RemoveCuldesacsParams {
    fn default() -> Self {
        Self { threshold: 100.0 }
    }
}

fn endpoint_connects(network: &RoadNetwork, id: u64, endpoint: Coord<f64>) -> bool {
    let point = Point::new(endpoint.x, endpoint.y);
    for other_id in network.query_rect(endpoint, endpoint) {
        if other_id == id {
            continue;
        }
        let other = network.get(other_id).unwrap();
        if point.intersects(&other.line) {
            return true;
        }
    }
    false
}

/// Remove roads shorter than the threshold that do not connect through at
/// both ends.
pub fn remove_culdesacs(
    source: &dyn FeatureSource,
    sink: &mut dyn FeatureSink,
    params: RemoveCuldesacsParams,
    feedback: &dyn Feedback,
) -> Result<()> {
    if !params.threshold.is_finite() || params.threshold <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "threshold",
            value: params.threshold.to_string(),
            reason: "must be a positive finite length".to_string(),
        });
    }

    let mut network = RoadNetwork::load(source, 10.0, feedback)?;

    let ids = network.ids();
    let total = ids.len().max(1) as f64;
    let mut to_remove = Vec::new();

    for (i, id) in ids.into_iter().enumerate() {
        if feedback.is_canceled() {
            break;
        }
        feedback.set_progress(10.0 + (i + 1) as f64 / total * 85.0);
        let road = network.get(id).unwrap();
        if line_length(&road.line) >= params.threshold {
            continue;
        }
        let first = road.line.0[0];
        let last = *road.line.0.last().unwrap();
        let connected =
            endpoint_connects(&network, id, first) && endpoint_connects(&network, id, last);
        if !connected {
            to_remove.push(id);
        }
    }

    feedback.push_info(&format!("Removed {} cul-de-sacs", to_remove.len()));
    for id in to_remove {
        network.remove(id);
    }

    feedback.set_progress(95.0);
    for feature in network.into_features() {
        sink.add_feature(feature)?;
    }
    feedback.set_progress(100.0);
    Ok(())
}

/// Cul-de-sac removal pass.
pub struct RemoveCuldesacs;

impl Algorithm for RemoveCuldesacs {
    type Params = RemoveCuldesacsParams;

    fn name(&self) -> &'static str {
        "remove-culdesacs"
    }

    fn description(&self) -> &'static str {
        "Removes short dead-end roads from the network"
    }

    fn execute(
        &self,
        source: &dyn FeatureSource,
        sink: &mut dyn FeatureSink,
        params: Self::Params,
        feedback: &dyn Feedback,
    ) -> Result<()> {
        remove_culdesacs(source, sink, params, feedback)
    }
}
