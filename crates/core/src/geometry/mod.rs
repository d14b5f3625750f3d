//! Line geometry kernel: point projection, vertex edits, arc-length
//! sampling with tangent angles.
//!
//! All operations work on single-part `LineString<f64>` curves in a planar
//! CRS. Degenerate curves (fewer than two vertices, or zero total length)
//! yield empty results rather than errors; callers check before dividing
//! by length.

mod average;

pub use average::average_lines;

use std::collections::HashSet;

use geo::{Coord, Geometry, LineString, Point};

use crate::error::{Error, Result};

/// Nearest point on a curve to a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit {
    /// Distance from the query point to the snapped point.
    pub distance: f64,
    /// The snapped point, lying on a segment of the curve.
    pub point: Coord<f64>,
    /// Vertex index at which inserting `point` keeps the curve ordered.
    pub insert_index: usize,
}

fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

/// Project `p` onto the segment `a`-`b`, clamped to the segment.
fn project_onto_segment(a: Coord<f64>, b: Coord<f64>, p: Coord<f64>) -> Coord<f64> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return a;
    }
    let t = ((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq;
    let t = t.clamp(0.0, 1.0);
    Coord {
        x: a.x + t * dx,
        y: a.y + t * dy,
    }
}

/// Find the nearest point lying on any segment of `line` to `point`.
///
/// Ties resolve to the first segment in traversal order. Returns `None`
/// for curves with fewer than two vertices.
pub fn closest_segment(line: &LineString<f64>, point: Coord<f64>) -> Option<SegmentHit> {
    if line.0.len() < 2 {
        return None;
    }
    let mut best: Option<SegmentHit> = None;
    for i in 0..line.0.len() - 1 {
        let snapped = project_onto_segment(line.0[i], line.0[i + 1], point);
        let d = distance(snapped, point);
        // strict less-than keeps the first segment on ties
        if best.map_or(true, |hit| d < hit.distance) {
            best = Some(SegmentHit {
                distance: d,
                point: snapped,
                insert_index: i + 1,
            });
        }
    }
    best
}

/// Insert `coord` as a new vertex at `index`, clamped to the vertex count.
/// Never removes existing vertices.
pub fn insert_vertex(line: &mut LineString<f64>, index: usize, coord: Coord<f64>) {
    let index = index.min(line.0.len());
    line.0.insert(index, coord);
}

/// Replace the vertex at `index` in place. Returns false when `index` is
/// out of range.
pub fn move_vertex(line: &mut LineString<f64>, index: usize, coord: Coord<f64>) -> bool {
    match line.0.get_mut(index) {
        Some(v) => {
            *v = coord;
            true
        }
        None => false,
    }
}

/// Sum of consecutive-vertex Euclidean distances; 0 for empty or
/// single-point curves.
pub fn line_length(line: &LineString<f64>) -> f64 {
    line.0.windows(2).map(|w| distance(w[0], w[1])).sum()
}

/// Point at arc-length `dist` along the curve, with the local tangent
/// angle in degrees (0° along +X, counter-clockwise positive).
///
/// `dist` is clamped to `[0, length]`. Returns `None` for degenerate
/// curves.
pub fn point_along(line: &LineString<f64>, dist: f64) -> Option<(Point<f64>, f64)> {
    if line.0.len() < 2 {
        return None;
    }
    let total = line_length(line);
    if total == 0.0 {
        return None;
    }
    let target = dist.clamp(0.0, total);

    let mut cum = 0.0;
    let mut last_angle = 0.0;
    for w in line.0.windows(2) {
        let (a, b) = (w[0], w[1]);
        let seg = distance(a, b);
        if seg == 0.0 {
            continue;
        }
        last_angle = (b.y - a.y).atan2(b.x - a.x).to_degrees();
        if cum + seg >= target {
            let t = (target - cum) / seg;
            let p = Point::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y));
            return Some((p, last_angle));
        }
        cum += seg;
    }

    // floating-point shortfall: clamp to the last vertex
    let last = *line.0.last()?;
    Some((Point::new(last.x, last.y), last_angle))
}

/// How samples are spaced along a path.
#[derive(Debug, Clone, Copy)]
pub enum Spacing {
    /// A fixed number of samples.
    Count(usize),
    /// One sample per `distance` units of arc length.
    Distance(f64),
}

/// Parameters for [`points_along_path`].
#[derive(Debug, Clone, Copy)]
pub struct PathSampling {
    pub spacing: Spacing,
    /// Orientation offset in degrees, subtracted from each tangent angle.
    pub orientation: f64,
    /// Place samples on the path endpoints (count spacing only).
    pub include_endpoints: bool,
}

impl Default for PathSampling {
    fn default() -> Self {
        Self {
            spacing: Spacing::Count(2),
            orientation: 0.0,
            include_endpoints: true,
        }
    }
}

/// Drop repeated points, keeping first occurrences in order.
fn unique_ordered(points: &[Coord<f64>]) -> Vec<Coord<f64>> {
    let mut seen = HashSet::new();
    points
        .iter()
        .copied()
        .filter(|c| seen.insert((c.x.to_bits(), c.y.to_bits())))
        .collect()
}

/// Generate rotated sample points along a path.
///
/// Returns `(point, angle_degrees)` pairs at even arc-length spacing.
/// Degenerate paths (fewer than two distinct points, zero length, or a
/// non-positive spacing distance) yield an empty vec.
pub fn points_along_path(points: &[Coord<f64>], params: &PathSampling) -> Vec<(Point<f64>, f64)> {
    let points = unique_ordered(points);
    if points.len() < 2 {
        return Vec::new();
    }

    let line = LineString::new(points);
    let total = line_length(&line);
    if total == 0.0 {
        return Vec::new();
    }

    let count = match params.spacing {
        Spacing::Count(c) => c,
        Spacing::Distance(d) => {
            if d <= 0.0 {
                return Vec::new();
            }
            ((total / d) + 1.0).ceil() as usize
        }
    };
    if count == 0 {
        return Vec::new();
    }

    let mut dist = 0.0;
    let spacing = if count == 1 {
        dist = total / 2.0;
        total
    } else if params.include_endpoints {
        total / (count - 1) as f64
    } else {
        let s = total / count as f64;
        dist = s / 2.0;
        s
    };

    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        if count > 1 && i == count - 1 && params.include_endpoints {
            dist = total;
        }
        if let Some((point, angle)) = point_along(&line, dist) {
            out.push((point, angle - params.orientation));
        }
        dist += spacing;
    }
    out
}

/// Extract the single `LineString` from a geometry.
///
/// A `MultiLineString` with exactly one part is unwrapped; anything else
/// multi-part (or non-linear) is [`Error::UnsupportedGeometry`] — never
/// silently picks one part.
pub fn single_linestring(geometry: &Geometry<f64>) -> Result<LineString<f64>> {
    match geometry {
        Geometry::LineString(ls) => Ok(ls.clone()),
        Geometry::MultiLineString(mls) if mls.0.len() == 1 => Ok(mls.0[0].clone()),
        Geometry::MultiLineString(_) => Err(Error::UnsupportedGeometry(
            "only single-part geometries are supported".to_string(),
        )),
        other => Err(Error::UnsupportedGeometry(format!(
            "expected a linestring, got {}",
            geometry_kind(other)
        ))),
    }
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "point",
        Geometry::Line(_) => "line",
        Geometry::LineString(_) => "linestring",
        Geometry::Polygon(_) => "polygon",
        Geometry::MultiPoint(_) => "multipoint",
        Geometry::MultiLineString(_) => "multilinestring",
        Geometry::MultiPolygon(_) => "multipolygon",
        Geometry::GeometryCollection(_) => "geometrycollection",
        Geometry::Rect(_) => "rect",
        Geometry::Triangle(_) => "triangle",
    }
}
