//! Integration tests running several generalization passes in sequence
//! over a synthetic road network.
//!
//! The network is a dual carriageway with a roundabout at one end, a short
//! cross link where a side street crosses, and a stub cul-de-sac. Each
//! pass consumes the previous pass's output through the in-memory
//! source/sink pair, the way the pipeline driver chains them.

use std::sync::atomic::{AtomicUsize, Ordering};

use geo::{Geometry, LineString};
use roadgen_algorithms::prelude::*;
use roadgen_core::feature::{AttributeValue, Feature, Fields};
use roadgen_core::feedback::{Feedback, NullFeedback};
use roadgen_core::stream::{MemorySink, MemorySource};

fn fields() -> Fields {
    Fields::new(vec!["kind".into(), "name".into()])
}

fn feature(id: u64, kind: &str, name: &str, coords: Vec<(f64, f64)>) -> Feature {
    Feature::new(
        id,
        vec![
            AttributeValue::String(kind.into()),
            AttributeValue::String(name.into()),
        ],
        Geometry::LineString(LineString::from(coords)),
    )
}

fn rerun<F>(pass: F, input: Vec<Feature>) -> Vec<Feature>
where
    F: FnOnce(&MemorySource, &mut MemorySink),
{
    let source = MemorySource::new(fields(), input);
    let mut sink = MemorySink::default();
    pass(&source, &mut sink);
    sink.features
}

#[test]
fn test_roundabout_then_culdesac_pipeline() {
    // square roundabout at the origin, an approach road, and a stub
    let input = vec![
        feature(1, "roundabout", "ring", vec![(0.0, 0.0), (1.0, 0.0)]),
        feature(2, "roundabout", "ring", vec![(1.0, 0.0), (1.0, 1.0)]),
        feature(3, "roundabout", "ring", vec![(1.0, 1.0), (0.0, 1.0)]),
        feature(4, "roundabout", "ring", vec![(0.0, 1.0), (0.0, 0.0)]),
        feature(5, "street", "approach", vec![(1.0, 0.5), (30.0, 0.5)]),
        feature(6, "street", "stub", vec![(30.0, 0.5), (30.0, 1.5)]),
    ];

    let predicate = Predicate::field_equals(
        &fields(),
        "kind",
        AttributeValue::String("roundabout".into()),
    )
    .unwrap();

    let after_roundabouts = rerun(
        |source, sink| {
            remove_roundabouts(
                source,
                sink,
                RemoveRoundaboutsParams { predicate },
                &NullFeedback,
            )
            .unwrap()
        },
        input,
    );
    // ring gone, approach extended into the centroid
    assert_eq!(after_roundabouts.len(), 2);

    let after_culdesacs = rerun(
        |source, sink| {
            remove_culdesacs(
                source,
                sink,
                RemoveCuldesacsParams { threshold: 5.0 },
                &NullFeedback,
            )
            .unwrap()
        },
        after_roundabouts,
    );
    assert_eq!(after_culdesacs.len(), 1, "stub must be dropped");

    let Geometry::LineString(line) = &after_culdesacs[0].geometry else {
        panic!("expected a linestring");
    };
    assert!((line.0[0].x - 0.5).abs() < 1e-9);
    assert!((line.0[0].y - 0.5).abs() < 1e-9);
}

#[test]
fn test_crossroads_then_collapse_pipeline() {
    // dual carriageway split at x = 50 by a crossing side street
    let input = vec![
        feature(1, "street", "main", vec![(0.0, 0.0), (50.0, 0.0)]),
        feature(2, "street", "main", vec![(50.0, 0.0), (100.0, 0.0)]),
        feature(3, "street", "main", vec![(0.0, 4.0), (50.0, 4.0)]),
        feature(4, "street", "main", vec![(50.0, 4.0), (100.0, 4.0)]),
        feature(5, "street", "main", vec![(50.0, 0.0), (50.0, 4.0)]),
    ];

    let after_crossroads = rerun(
        |source, sink| {
            remove_crossroads(
                source,
                sink,
                RemoveCrossroadsParams {
                    fields: vec!["name".to_string()],
                    threshold: 10.0,
                },
                &NullFeedback,
            )
            .unwrap()
        },
        input,
    );
    assert_eq!(after_crossroads.len(), 4, "cross link must be removed");

    let after_collapse = rerun(
        |source, sink| {
            collapse_dual_carriageways(
                source,
                sink,
                CollapseDualCarriagewaysParams {
                    fields: vec!["name".to_string()],
                    threshold: 5.0,
                },
                &NullFeedback,
            )
            .unwrap()
        },
        after_crossroads,
    );
    assert_eq!(after_collapse.len(), 2, "each half pairs into one line");
    for f in &after_collapse {
        let Geometry::LineString(line) = &f.geometry else {
            panic!("expected a linestring");
        };
        for c in &line.0 {
            // the second pair is averaged from re-stitched, slightly bent
            // halves, so the centerline is only approximately at y = 2
            assert!((c.y - 2.0).abs() < 0.1, "centerline y was {}", c.y);
        }
    }
}

/// Feedback that cancels after a fixed number of progress reports.
struct CancelAfter {
    reports: AtomicUsize,
    limit: usize,
}

impl CancelAfter {
    fn new(limit: usize) -> Self {
        Self {
            reports: AtomicUsize::new(0),
            limit,
        }
    }
}

impl Feedback for CancelAfter {
    fn is_canceled(&self) -> bool {
        self.reports.load(Ordering::Relaxed) >= self.limit
    }

    fn set_progress(&self, _percent: f64) {
        self.reports.fetch_add(1, Ordering::Relaxed);
    }

    fn push_info(&self, _message: &str) {}
}

#[test]
fn test_cancellation_still_emits_loaded_roads() {
    let input: Vec<Feature> = (0..20)
        .map(|i| {
            let x = i as f64 * 10.0;
            feature(i + 1, "street", "main", vec![(x, 0.0), (x + 5.0, 0.0)])
        })
        .collect();

    let source = MemorySource::new(fields(), input);
    let mut sink = MemorySink::default();
    // cancel midway through the removal phase
    let feedback = CancelAfter::new(25);
    remove_culdesacs(
        &source,
        &mut sink,
        RemoveCuldesacsParams { threshold: 1.0 },
        &feedback,
    )
    .unwrap();

    // every feature loaded before cancellation comes back out
    assert_eq!(sink.features.len(), 20);
    for w in sink.features.windows(2) {
        assert!(w[0].id < w[1].id, "output must be sorted by id");
    }
}
