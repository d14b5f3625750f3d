//! In-memory road network with a spatial index over segment bounding
//! boxes.

use std::collections::HashMap;

use geo::{BoundingRect, Coord, Geometry, LineString};
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};

use roadgen_core::error::{Error, Result};
use roadgen_core::feature::AttributeValue;
use roadgen_core::feedback::Feedback;
use roadgen_core::geometry::single_linestring;
use roadgen_core::stream::FeatureSource;

/// Bounding box entry carrying the road id.
pub type IndexEntry = GeomWithData<Rectangle<[f64; 2]>, u64>;

/// A single road segment in the working set.
#[derive(Debug, Clone)]
pub struct Road {
    pub id: u64,
    pub attributes: Vec<AttributeValue>,
    pub line: LineString<f64>,
}

/// The mutable working set of a generalization pass.
///
/// Invariant: the id map and the spatial index always describe the same
/// set of roads, with index rectangles matching current geometries. All
/// mutation goes through [`insert`](RoadNetwork::insert),
/// [`remove`](RoadNetwork::remove) and
/// [`replace_geometry`](RoadNetwork::replace_geometry), which maintain
/// both sides together.
#[derive(Debug, Default)]
pub struct RoadNetwork {
    roads: HashMap<u64, Road>,
    index: RTree<IndexEntry>,
}

fn bounding_rectangle(line: &LineString<f64>) -> Result<Rectangle<[f64; 2]>> {
    let rect = line.bounding_rect().ok_or_else(|| {
        Error::DegenerateGeometry("cannot index an empty linestring".to_string())
    })?;
    Ok(Rectangle::from_corners(
        [rect.min().x, rect.min().y],
        [rect.max().x, rect.max().y],
    ))
}

impl RoadNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every feature of a source into a fresh network, assigning
    /// sequential ids from 1 in source order.
    ///
    /// Progress is reported over `progress_span` percentage points.
    /// Cancellation stops loading and returns the partial network.
    pub fn load(
        source: &dyn FeatureSource,
        progress_span: f64,
        feedback: &dyn Feedback,
    ) -> Result<Self> {
        let mut network = Self::new();
        let count = source.feature_count().max(1) as f64;
        for (i, feature) in source.features().enumerate() {
            if feedback.is_canceled() {
                break;
            }
            let line = single_linestring(&feature.geometry)?;
            if line.0.len() < 2 {
                return Err(Error::DegenerateGeometry(format!(
                    "road {} has fewer than two vertices",
                    feature.id
                )));
            }
            network.insert(Road {
                id: (i + 1) as u64,
                attributes: feature.attributes,
                line,
            })?;
            feedback.set_progress((i + 1) as f64 / count * progress_span);
        }
        Ok(network)
    }

    pub fn len(&self) -> usize {
        self.roads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roads.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Road> {
        self.roads.get(&id)
    }

    /// All road ids in ascending order. Iteration order of the working
    /// set is the deterministic order of every pass.
    pub fn ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.roads.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn insert(&mut self, road: Road) -> Result<()> {
        let rect = bounding_rectangle(&road.line)?;
        self.index.insert(IndexEntry::new(rect, road.id));
        self.roads.insert(road.id, road);
        Ok(())
    }

    pub fn remove(&mut self, id: u64) -> Option<Road> {
        let road = self.roads.remove(&id)?;
        if let Ok(rect) = bounding_rectangle(&road.line) {
            self.index.remove(&IndexEntry::new(rect, id));
        }
        Some(road)
    }

    /// Swap in a new geometry for an existing road, keeping the index in
    /// step. A single wrapped operation so callers cannot leave the two
    /// sides disagreeing.
    pub fn replace_geometry(&mut self, id: u64, line: LineString<f64>) -> Result<()> {
        let road = self
            .roads
            .get_mut(&id)
            .ok_or_else(|| Error::InvalidInput(format!("no road with id {}", id)))?;
        let old_rect = bounding_rectangle(&road.line)?;
        let new_rect = bounding_rectangle(&line)?;
        road.line = line;
        self.index.remove(&IndexEntry::new(old_rect, id));
        self.index.insert(IndexEntry::new(new_rect, id));
        Ok(())
    }

    /// Ids of roads whose bounding boxes intersect the query box, in
    /// ascending id order.
    pub fn query_rect(&self, min: Coord<f64>, max: Coord<f64>) -> Vec<u64> {
        let envelope = AABB::from_corners([min.x, min.y], [max.x, max.y]);
        let mut ids: Vec<u64> = self
            .index
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.data)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Drain the network into features sorted by id, reusing original
    /// ids.
    pub fn into_features(self) -> Vec<roadgen_core::feature::Feature> {
        let mut roads: Vec<Road> = self.roads.into_values().collect();
        roads.sort_unstable_by_key(|r| r.id);
        roads
            .into_iter()
            .map(|r| {
                roadgen_core::feature::Feature::new(
                    r.id,
                    r.attributes,
                    Geometry::LineString(r.line),
                )
            })
            .collect()
    }
}
