//! Weighted averaging of two linestrings.

use geo::{Coord, LineString};

use super::{closest_segment, insert_vertex};

/// Average two linestrings into a single curve between them.
///
/// The first curve is densified with the projection of every vertex of the
/// second, then each of its vertices is pulled toward its nearest point on
/// the second. `weight` biases the result toward the first curve: the
/// averaged vertex is `(v * weight + p) / (weight + 1)`, so weight 1 gives
/// the unweighted midline and larger weights hug the first curve.
///
/// Either input having fewer than two vertices yields an empty linestring.
pub fn average_lines(a: &LineString<f64>, b: &LineString<f64>, weight: f64) -> LineString<f64> {
    if a.0.len() < 2 || b.0.len() < 2 {
        return LineString::new(vec![]);
    }

    // densify: give `a` a vertex opposite every vertex of `b`
    let mut densified = a.clone();
    for &vertex in &b.0 {
        if let Some(hit) = closest_segment(&densified, vertex) {
            insert_vertex(&mut densified, hit.insert_index, hit.point);
        }
    }

    let mut out = Vec::with_capacity(densified.0.len());
    for &vertex in &densified.0 {
        if let Some(hit) = closest_segment(b, vertex) {
            out.push(Coord {
                x: (vertex.x * weight + hit.point.x) / (weight + 1.0),
                y: (vertex.y * weight + hit.point.y) / (weight + 1.0),
            });
        }
    }
    LineString::new(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::line_length;

    #[test]
    fn test_average_lies_between_parallel_lines() {
        let a = LineString::from(vec![(0.0, 0.0), (10.0, 0.0)]);
        let b = LineString::from(vec![(0.0, 2.0), (10.0, 2.0)]);
        let avg = average_lines(&a, &b, 1.0);

        assert!(avg.0.len() >= 2);
        for c in &avg.0 {
            assert!((c.y - 1.0).abs() < 1e-10, "midline y was {}", c.y);
            assert!(c.x >= -1e-10 && c.x <= 10.0 + 1e-10);
        }
    }

    #[test]
    fn test_average_vertex_count_covers_both_inputs() {
        let a = LineString::from(vec![(0.0, 0.0), (5.0, 0.5), (10.0, 0.0)]);
        let b = LineString::from(vec![(0.0, 2.0), (2.0, 2.1), (6.0, 1.9), (10.0, 2.0)]);
        let avg = average_lines(&a, &b, 1.0);
        assert!(avg.0.len() >= a.0.len().max(b.0.len()));
    }

    #[test]
    fn test_weight_biases_toward_first_line() {
        let a = LineString::from(vec![(0.0, 0.0), (10.0, 0.0)]);
        let b = LineString::from(vec![(0.0, 3.0), (10.0, 3.0)]);

        // weight 2 counts the first line twice: y = (0 * 2 + 3) / 3 = 1
        let avg = average_lines(&a, &b, 2.0);
        for c in &avg.0 {
            assert!((c.y - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_average_nonparallel_has_positive_length() {
        let a = LineString::from(vec![(0.0, 0.0), (4.0, 1.0), (8.0, 0.0)]);
        let b = LineString::from(vec![(0.0, 2.0), (8.0, 2.0)]);
        let avg = average_lines(&a, &b, 1.0);
        assert!(line_length(&avg) > 0.0);
        // every averaged vertex sits strictly between the curves
        for c in &avg.0 {
            assert!(c.y > 0.0 - 1e-10 && c.y < 2.0 + 1e-10);
        }
    }

    #[test]
    fn test_average_degenerate_inputs() {
        let ok = LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]);
        let short = LineString::from(vec![(0.0, 1.0)]);
        assert!(average_lines(&ok, &short, 1.0).0.is_empty());
        assert!(average_lines(&short, &ok, 1.0).0.is_empty());
        assert!(average_lines(&short, &short, 1.0).0.is_empty());
    }
}
