//! Cooperative progress and cancellation contract.
//!
//! Algorithms poll [`Feedback::is_canceled`] at feature or ring
//! granularity; on a positive check they stop consuming input and emit the
//! best partial output accumulated so far. Progress percentages are
//! advisory and carry no correctness contract.

/// Progress, cancellation and info-message channel for a running pass.
pub trait Feedback {
    /// Whether the caller has requested cancellation.
    fn is_canceled(&self) -> bool;

    /// Report progress as a percentage in `[0, 100]`, non-decreasing over
    /// one pass.
    fn set_progress(&self, percent: f64);

    /// Push a human-readable info message (counts of removed/merged
    /// items). Advisory, never machine-parsed.
    fn push_info(&self, message: &str);
}

/// A feedback implementation that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFeedback;

impl Feedback for NullFeedback {
    fn is_canceled(&self) -> bool {
        false
    }

    fn set_progress(&self, _percent: f64) {}

    fn push_info(&self, _message: &str) {}
}
