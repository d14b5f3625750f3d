//! Dual-carriageway collapse.
//!
//! Pairs of like-attributed roads running within a Hausdorff distance of
//! each other are merged into their average centerline. Roads that joined
//! either carriageway are re-stitched onto the collapsed line; connectors
//! that spanned between the two carriageways are absorbed.
//!
//! The partner road is removed outright rather than kept as a second
//! record aliasing the averaged geometry, so a later road near an
//! already-collapsed pair can only pair against the surviving id. This
//! can shift which groups get counted as ambiguous, not which features
//! are emitted.

use std::collections::HashSet;

use geo::{BoundingRect, Coord, HausdorffDistance, LineString};
use tracing::debug;

use roadgen_core::error::{Error, Result};
use roadgen_core::feature::attribute_key;
use roadgen_core::feedback::Feedback;
use roadgen_core::geometry::{average_lines, closest_segment, move_vertex};
use roadgen_core::stream::{FeatureSink, FeatureSource};
use roadgen_core::Algorithm;

use super::network::RoadNetwork;

/// Parameters for [`collapse_dual_carriageways`].
#[derive(Debug, Clone)]
pub struct CollapseDualCarriagewaysParams {
    /// Attribute fields that must match between the two carriageways.
    pub fields: Vec<String>,
    /// Maximum Hausdorff distance between paired carriageways, in map
    /// units.
    pub threshold: f64,
}

fn dist(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

/// Orient `other` to run the same direction as `reference`.
fn co_oriented(reference: &LineString<f64>, other: &LineString<f64>) -> LineString<f64> {
    let r_first = reference.0[0];
    let r_last = *reference.0.last().unwrap();
    let o_first = other.0[0];
    let o_last = *other.0.last().unwrap();
    let aligned = dist(r_first, o_first) + dist(r_last, o_last);
    let crossed = dist(r_first, o_last) + dist(r_last, o_first);
    if crossed < aligned {
        let mut coords = other.0.clone();
        coords.reverse();
        LineString::new(coords)
    } else {
        other.clone()
    }
}

/// Collapse paired dual carriageways into averaged centerlines.
pub fn collapse_dual_carriageways(
    source: &dyn FeatureSource,
    sink: &mut dyn FeatureSink,
    params: CollapseDualCarriagewaysParams,
    feedback: &dyn Feedback,
) -> Result<()> {
    if !params.threshold.is_finite() || params.threshold <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "threshold",
            value: params.threshold.to_string(),
            reason: "must be a positive finite distance".to_string(),
        });
    }
    let indices = source.fields().resolve(&params.fields)?;

    let mut network = RoadNetwork::load(source, 10.0, feedback)?;

    let ids = network.ids();
    let total = ids.len().max(1) as f64;
    let mut processed: HashSet<u64> = HashSet::new();
    let mut collapsed = 0usize;
    let mut ambiguous = 0usize;

    for (i, id) in ids.iter().copied().enumerate() {
        if feedback.is_canceled() {
            break;
        }
        feedback.set_progress(10.0 + (i + 1) as f64 / total * 85.0);
        if processed.contains(&id) {
            continue;
        }
        let Some(candidate) = network.get(id) else {
            continue;
        };
        let candidate_line = candidate.line.clone();
        let key = attribute_key(&candidate.attributes, &indices);

        // partner search in a box grown by the pairing distance
        let Some(rect) = candidate_line.bounding_rect() else {
            continue;
        };
        let min = Coord {
            x: rect.min().x - params.threshold,
            y: rect.min().y - params.threshold,
        };
        let max = Coord {
            x: rect.max().x + params.threshold,
            y: rect.max().y + params.threshold,
        };
        let partners: Vec<u64> = network
            .query_rect(min, max)
            .into_iter()
            .filter(|&other_id| other_id != id && !processed.contains(&other_id))
            .filter(|&other_id| {
                let other = network.get(other_id).unwrap();
                attribute_key(&other.attributes, &indices) == key
                    && candidate_line.hausdorff_distance(&other.line) < params.threshold
            })
            .collect();

        match partners.as_slice() {
            [] => {
                processed.insert(id);
            }
            [partner_id] => {
                let partner_id = *partner_id;
                let other_line = network.get(partner_id).unwrap().line.clone();
                let oriented = co_oriented(&candidate_line, &other_line);
                let averaged = average_lines(&candidate_line, &oriented, 1.0);
                if averaged.0.len() < 2 {
                    processed.insert(id);
                    continue;
                }

                restitch_connected(
                    &mut network,
                    id,
                    partner_id,
                    &candidate_line,
                    &other_line,
                    &averaged,
                    params.threshold,
                    min,
                    max,
                )?;

                network.replace_geometry(id, averaged)?;
                network.remove(partner_id);
                processed.insert(id);
                processed.insert(partner_id);
                collapsed += 1;
                debug!(candidate = id, partner = partner_id, "collapsed pair");
            }
            many => {
                // more than one plausible partner: leave the whole group
                processed.insert(id);
                processed.extend(many.iter().copied());
                ambiguous += 1;
            }
        }
    }

    feedback.push_info(&format!("Collapsed {} dual carriageways", collapsed));
    if ambiguous > 0 {
        feedback.push_info(&format!(
            "Skipped {} roads with more than one pairing partner",
            ambiguous
        ));
    }

    feedback.set_progress(95.0);
    for feature in network.into_features() {
        sink.add_feature(feature)?;
    }
    feedback.set_progress(100.0);
    Ok(())
}

/// Move the endpoints of roads that sat within the pairing distance of
/// either original carriageway onto the averaged line. Roads whose both
/// endpoints move were connectors between the carriageways and are
/// absorbed.
#[allow(clippy::too_many_arguments)]
fn restitch_connected(
    network: &mut RoadNetwork,
    candidate_id: u64,
    partner_id: u64,
    candidate_line: &LineString<f64>,
    other_line: &LineString<f64>,
    averaged: &LineString<f64>,
    threshold: f64,
    min: Coord<f64>,
    max: Coord<f64>,
) -> Result<()> {
    let mut absorbed = Vec::new();
    for third_id in network.query_rect(min, max) {
        if third_id == candidate_id || third_id == partner_id {
            continue;
        }
        let third = network.get(third_id).unwrap();
        let mut line = third.line.clone();
        let last_index = line.0.len() - 1;
        let mut moved = 0usize;

        for index in [0, last_index] {
            let endpoint = line.0[index];
            let near_original = [candidate_line, other_line].iter().any(|original| {
                closest_segment(original, endpoint)
                    .is_some_and(|hit| hit.distance < threshold)
            });
            if !near_original {
                continue;
            }
            if let Some(hit) = closest_segment(averaged, endpoint) {
                move_vertex(&mut line, index, hit.point);
                moved += 1;
            }
        }

        if moved == 2 {
            absorbed.push(third_id);
        } else if moved > 0 {
            network.replace_geometry(third_id, line)?;
        }
    }
    for id in absorbed {
        network.remove(id);
    }
    Ok(())
}

/// Dual-carriageway collapse pass.
pub struct CollapseDualCarriageways;

impl Algorithm for CollapseDualCarriageways {
    type Params = CollapseDualCarriagewaysParams;

    fn name(&self) -> &'static str {
        "collapse-dual-carriageways"
    }

    fn description(&self) -> &'static str {
        "Merges paired carriageways into a single averaged centerline"
    }

    fn execute(
        &self,
        source: &dyn FeatureSource,
        sink: &mut dyn FeatureSink,
        params: Self::Params,
        feedback: &dyn Feedback,
    ) -> Result<()> {
        collapse_dual_carriageways(source, sink, params, feedback)
    }
}
