//! Roundabout removal.
//!
//! Roads classified as roundabouts are collected, merged back into rings,
//! and each ring is collapsed to its centroid. Approach roads touching
//! the ring are extended to the centroid; where two approach roads fork
//! from a shared far endpoint, they are averaged into one.

use geo::{BoundingRect, Centroid, Coord, Geometry, LineString, Relate};
use tracing::debug;

use roadgen_core::error::Result;
use roadgen_core::feature::Predicate;
use roadgen_core::feedback::Feedback;
use roadgen_core::geometry::{average_lines, closest_segment, move_vertex, single_linestring};
use roadgen_core::stream::{FeatureSink, FeatureSource};
use roadgen_core::Algorithm;

use super::merge::merge_lines;
use super::network::{Road, RoadNetwork};

/// Parameters for [`remove_roundabouts`].
pub struct RemoveRoundaboutsParams {
    /// Classifies which input features are roundabout parts.
    pub predicate: Predicate,
}

/// A road touching a ring, described by its ends.
struct Approach {
    id: u64,
    /// Vertex index of the endpoint on the ring (0 or last).
    near_index: usize,
    /// The endpoint away from the ring.
    far: Coord<f64>,
}

fn endpoint_distance_to_ring(ring: &LineString<f64>, point: Coord<f64>) -> f64 {
    closest_segment(ring, point).map_or(f64::INFINITY, |hit| hit.distance)
}

/// Orient a line so the vertex at `near_index` comes first.
fn oriented_from(line: &LineString<f64>, near_index: usize) -> LineString<f64> {
    if near_index == 0 {
        line.clone()
    } else {
        let mut coords = line.0.clone();
        coords.reverse();
        LineString::new(coords)
    }
}

/// Remove roundabout rings and reconnect their approach roads at the ring
/// centroid.
pub fn remove_roundabouts(
    source: &dyn FeatureSource,
    sink: &mut dyn FeatureSink,
    params: RemoveRoundaboutsParams,
    feedback: &dyn Feedback,
) -> Result<()> {
    // partition: roundabout parts on one side, the road network on the other
    let mut parts: Vec<LineString<f64>> = Vec::new();
    let mut network = RoadNetwork::new();
    let count = source.feature_count().max(1) as f64;
    let mut next_id = 1u64;
    for (i, feature) in source.features().enumerate() {
        if feedback.is_canceled() {
            break;
        }
        // multi-part inputs are exploded into one road per part
        let exploded: Vec<LineString<f64>> = match &feature.geometry {
            Geometry::MultiLineString(mls) => mls.0.clone(),
            other => vec![single_linestring(other)?],
        };
        if params.predicate.evaluate(&feature) {
            parts.extend(exploded);
        } else {
            for line in exploded {
                network.insert(Road {
                    id: next_id,
                    attributes: feature.attributes.clone(),
                    line,
                })?;
                next_id += 1;
            }
        }
        feedback.set_progress((i + 1) as f64 / count * 10.0);
    }

    let rings = merge_lines(&parts);
    feedback.set_progress(25.0);
    debug!(rings = rings.len(), "merged roundabout parts");

    let mut removed = 0usize;
    let mut ambiguous = 0usize;
    let ring_count = rings.len().max(1) as f64;

    for (i, ring) in rings.iter().enumerate() {
        if feedback.is_canceled() {
            break;
        }
        let Some(centroid) = ring.centroid() else {
            continue;
        };
        let centroid = Coord {
            x: centroid.x(),
            y: centroid.y(),
        };

        // roads whose geometry touches the ring
        let Some(rect) = ring.bounding_rect() else {
            continue;
        };
        let mut approaches: Vec<Approach> = Vec::new();
        for id in network.query_rect(rect.min(), rect.max()) {
            let road = network.get(id).unwrap();
            if !road.line.relate(ring).is_touches() {
                continue;
            }
            let first = road.line.0[0];
            let last = *road.line.0.last().unwrap();
            let near_index = if endpoint_distance_to_ring(ring, first)
                <= endpoint_distance_to_ring(ring, last)
            {
                0
            } else {
                road.line.0.len() - 1
            };
            let far = if near_index == 0 { last } else { first };
            approaches.push(Approach {
                id,
                near_index,
                far,
            });
        }

        // group approaches that fork from the same far endpoint
        let mut groups: Vec<Vec<Approach>> = Vec::new();
        for approach in approaches {
            match groups.iter_mut().find(|g| {
                g[0].far.x.to_bits() == approach.far.x.to_bits()
                    && g[0].far.y.to_bits() == approach.far.y.to_bits()
            }) {
                Some(group) => group.push(approach),
                None => groups.push(vec![approach]),
            }
        }

        for group in groups {
            match group.as_slice() {
                [single] => {
                    let mut line = network.get(single.id).unwrap().line.clone();
                    move_vertex(&mut line, single.near_index, centroid);
                    network.replace_geometry(single.id, line)?;
                }
                [first, second] => {
                    let a = oriented_from(&network.get(first.id).unwrap().line, first.near_index);
                    let b =
                        oriented_from(&network.get(second.id).unwrap().line, second.near_index);
                    let mut averaged = average_lines(&a, &b, 1.0);
                    move_vertex(&mut averaged, 0, centroid);
                    network.replace_geometry(first.id, averaged)?;
                    network.remove(second.id);
                }
                _ => {
                    ambiguous += 1;
                }
            }
        }

        removed += 1;
        feedback.set_progress(25.0 + (i + 1) as f64 / ring_count * 70.0);
    }

    feedback.push_info(&format!("Removed {} roundabouts", removed));
    if ambiguous > 0 {
        feedback.push_info(&format!(
            "Skipped {} junctions with more than two forking roads",
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

/// Roundabout removal pass.
pub struct RemoveRoundabouts;

impl Algorithm for RemoveRoundabouts {
    type Params = RemoveRoundaboutsParams;

    fn name(&self) -> &'static str {
        "remove-roundabouts"
    }

    fn description(&self) -> &'static str {
        "Collapses roundabout rings to their centroids and reconnects approach roads"
    }

    fn execute(
        &self,
        source: &dyn FeatureSource,
        sink: &mut dyn FeatureSink,
        params: Self::Params,
        feedback: &dyn Feedback,
    ) -> Result<()> {
        remove_roundabouts(source, sink, params, feedback)
    }
}
