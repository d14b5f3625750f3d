//! Averaging of a whole stream of linestrings into one representative
//! line.

use geo::{Geometry, LineString};

use roadgen_core::error::Result;
use roadgen_core::feature::Feature;
use roadgen_core::feedback::Feedback;
use roadgen_core::geometry::{average_lines, single_linestring};
use roadgen_core::stream::{FeatureSink, FeatureSource};
use roadgen_core::Algorithm;

/// Parameters for [`average_linestrings`]. Present for API symmetry with
/// the other passes; the operation takes none.
#[derive(Debug, Clone, Copy, Default)]
pub struct AverageLinesParams;

/// Fold every input line into a single average, weighting the running
/// result by the number of lines already folded in.
///
/// The output feature carries the first input's attributes. An empty
/// source produces no output.
pub fn average_linestrings(
    source: &dyn FeatureSource,
    sink: &mut dyn FeatureSink,
    _params: AverageLinesParams,
    feedback: &dyn Feedback,
) -> Result<()> {
    let count = source.feature_count().max(1) as f64;
    let mut acc: Option<LineString<f64>> = None;
    let mut attributes = Vec::new();
    let mut weight = 0.0;

    for (i, feature) in source.features().enumerate() {
        if feedback.is_canceled() {
            break;
        }
        let line = single_linestring(&feature.geometry)?;
        acc = Some(match acc {
            None => {
                attributes = feature.attributes;
                line
            }
            Some(current) => average_lines(&current, &line, weight),
        });
        weight += 1.0;
        feedback.set_progress((i + 1) as f64 / count * 95.0);
    }

    if let Some(line) = acc {
        sink.add_feature(Feature::new(1, attributes, Geometry::LineString(line)))?;
    }
    feedback.set_progress(100.0);
    Ok(())
}

/// Line averaging pass.
pub struct AverageLines;

impl Algorithm for AverageLines {
    type Params = AverageLinesParams;

    fn name(&self) -> &'static str {
        "average-lines"
    }

    fn description(&self) -> &'static str {
        "Averages all input linestrings into a single representative line"
    }

    fn execute(
        &self,
        source: &dyn FeatureSource,
        sink: &mut dyn FeatureSink,
        params: Self::Params,
        feedback: &dyn Feedback,
    ) -> Result<()> {
        average_linestrings(source, sink, params, feedback)
    }
}
