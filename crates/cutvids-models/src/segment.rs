//! Time segments within a source timeline.

use serde::{Deserialize, Serialize};

/// A time range to extract, in whole seconds.
///
/// `start: None` means "from the beginning", `end: None` means "to the end".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Segment {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl Segment {
    /// Segment covering the whole input.
    pub const UNBOUNDED: Segment = Segment {
        start: None,
        end: None,
    };

    pub fn new(start: Option<u64>, end: Option<u64>) -> Self {
        Self { start, end }
    }

    /// Segment with both bounds set.
    pub fn between(start: u64, end: u64) -> Self {
        Self::new(Some(start), Some(end))
    }

    /// False only when both bounds are set and `end <= start`.
    pub fn is_ordered(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => end > start,
            _ => true,
        }
    }

    /// Bounds as the single-segment planner sees them, with second 0 unspecified.
    pub fn trim_points(&self) -> Segment {
        Segment::new(self.trim_start(), self.trim_end())
    }

    /// Start as a trim point.
    ///
    /// Second 0 counts as "unspecified" here: trimming at 0 and not trimming
    /// are indistinguishable to the single-segment planner.
    pub fn trim_start(&self) -> Option<u64> {
        self.start.filter(|&s| s != 0)
    }

    /// End as a trim point. Second 0 counts as "unspecified", see [`Segment::trim_start`].
    pub fn trim_end(&self) -> Option<u64> {
        self.end.filter(|&e| e != 0)
    }
}
