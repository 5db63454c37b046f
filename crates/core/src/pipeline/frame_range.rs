use crate::host::domain::timeline::Timeline;

/// Which frames a full render covers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameRangePolicy {
    /// Union of the input clips' ranges, left for the host to compute.
    InputsUnion,
    TimelineBounds,
    Manual { first: i32, last: i32 },
}

impl FrameRangePolicy {
    /// Range to render, `None` when the host default applies.
    pub fn time_domain(&self, timeline: &dyn Timeline) -> Option<(f64, f64)> {
        match *self {
            FrameRangePolicy::InputsUnion => None,
            FrameRangePolicy::TimelineBounds => Some(timeline.bounds()),
            FrameRangePolicy::Manual { first, last } => Some((first as f64, last as f64)),
        }
    }
}
