//! Merging of connected line parts into maximal chains.
//!
//! Exploding multi-part roads leaves rings and long roads broken into
//! pieces; [`merge_lines`] stitches pieces back together wherever exactly
//! two part-ends meet at a point. Junctions where three or more ends meet
//! stay split.

use std::collections::HashMap;

use geo::{Coord, LineString};

type EndpointKey = (u64, u64);

fn key(c: Coord<f64>) -> EndpointKey {
    (c.x.to_bits(), c.y.to_bits())
}

/// One end of a part: the part index and whether it is the start vertex.
#[derive(Debug, Clone, Copy)]
struct PartEnd {
    part: usize,
    at_start: bool,
}

/// Merge line parts into maximal chains joined at shared endpoints.
///
/// Two parts join only where their endpoints are bit-identical and no
/// third part-end shares the point. Closed chains come back as rings
/// (first vertex equals last). Parts with fewer than two vertices are
/// dropped. Output order follows the lowest input index in each chain.
pub fn merge_lines(parts: &[LineString<f64>]) -> Vec<LineString<f64>> {
    let mut ends: HashMap<EndpointKey, Vec<PartEnd>> = HashMap::new();
    for (i, part) in parts.iter().enumerate() {
        if part.0.len() < 2 {
            continue;
        }
        ends.entry(key(part.0[0])).or_default().push(PartEnd {
            part: i,
            at_start: true,
        });
        ends.entry(key(*part.0.last().unwrap()))
            .or_default()
            .push(PartEnd {
                part: i,
                at_start: false,
            });
    }

    let mut used = vec![false; parts.len()];
    let mut merged = Vec::new();

    for start in 0..parts.len() {
        if used[start] || parts[start].0.len() < 2 {
            continue;
        }
        used[start] = true;
        let mut chain: Vec<Coord<f64>> = parts[start].0.clone();

        // grow forward from the chain's tail, then backward from its head
        for forward in [true, false] {
            loop {
                let joint = if forward {
                    *chain.last().unwrap()
                } else {
                    chain[0]
                };
                let Some(incident) = ends.get(&key(joint)) else {
                    break;
                };
                if incident.len() != 2 {
                    break;
                }
                let Some(next) = incident.iter().find(|e| !used[e.part]) else {
                    break;
                };
                used[next.part] = true;

                let mut piece = parts[next.part].0.clone();
                // orient the piece so it starts at the joint
                if key(piece[0]) != key(joint) {
                    piece.reverse();
                }
                if forward {
                    chain.extend(piece.into_iter().skip(1));
                } else {
                    piece.reverse();
                    piece.pop();
                    piece.extend(chain.iter().copied());
                    chain = piece;
                }
            }
        }
        merged.push(LineString::new(chain));
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(coords: Vec<(f64, f64)>) -> LineString<f64> {
        LineString::from(coords)
    }

    #[test]
    fn test_merges_two_parts_into_one_chain() {
        let parts = vec![
            line(vec![(0.0, 0.0), (1.0, 0.0)]),
            line(vec![(1.0, 0.0), (2.0, 0.0)]),
        ];
        let merged = merge_lines(&parts);
        assert_eq!(merged.len(), 1);
        assert_eq!(
            merged[0],
            line(vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)])
        );
    }

    #[test]
    fn test_reverses_parts_to_join() {
        let parts = vec![
            line(vec![(1.0, 0.0), (0.0, 0.0)]),
            line(vec![(2.0, 0.0), (1.0, 0.0)]),
        ];
        let merged = merge_lines(&parts);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].0.len(), 3);
        let first = merged[0].0[0];
        let last = *merged[0].0.last().unwrap();
        assert_ne!(first, last);
    }

    #[test]
    fn test_rebuilds_closed_ring() {
        let parts = vec![
            line(vec![(0.0, 0.0), (1.0, 0.0)]),
            line(vec![(1.0, 0.0), (1.0, 1.0)]),
            line(vec![(1.0, 1.0), (0.0, 1.0)]),
            line(vec![(0.0, 1.0), (0.0, 0.0)]),
        ];
        let merged = merge_lines(&parts);
        assert_eq!(merged.len(), 1);
        let ring = &merged[0];
        assert_eq!(ring.0.first(), ring.0.last());
        assert_eq!(ring.0.len(), 5);
    }

    #[test]
    fn test_stops_at_junction() {
        // three parts meeting at (1, 0): nothing merges through it
        let parts = vec![
            line(vec![(0.0, 0.0), (1.0, 0.0)]),
            line(vec![(1.0, 0.0), (2.0, 0.0)]),
            line(vec![(1.0, 0.0), (1.0, 1.0)]),
        ];
        let merged = merge_lines(&parts);
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_no_duplicate_joint_vertex() {
        let parts = vec![
            line(vec![(0.0, 0.0), (1.0, 0.0)]),
            line(vec![(1.0, 0.0), (2.0, 0.0)]),
        ];
        let merged = merge_lines(&parts);
        let coords = &merged[0].0;
        for w in coords.windows(2) {
            assert_ne!(w[0], w[1], "joint vertex duplicated");
        }
    }

    #[test]
    fn test_drops_degenerate_parts() {
        let parts = vec![line(vec![(0.0, 0.0)]), line(vec![(5.0, 5.0), (6.0, 5.0)])];
        let merged = merge_lines(&parts);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].0.len(), 2);
    }
}
