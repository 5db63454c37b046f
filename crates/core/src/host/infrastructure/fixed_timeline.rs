use crate::host::domain::timeline::Timeline;

/// Timeline with bounds fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedTimeline {
    first: f64,
    last: f64,
}

impl FixedTimeline {
    /// Bounds are reordered so that `first <= last`.
    pub fn new(first: f64, last: f64) -> Self {
        Self {
            first: first.min(last),
            last: first.max(last),
        }
    }
}

impl Timeline for FixedTimeline {
    fn bounds(&self) -> (f64, f64) {
        (self.first, self.last)
    }
}
