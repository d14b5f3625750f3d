//! Generalization passes over arbitrary line collections.

mod average;

pub use average::{average_linestrings, AverageLines, AverageLinesParams};
