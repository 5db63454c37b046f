use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::encoding::domain::encoder::Encoder;
use crate::naming::domain::extension::TargetKind;
use crate::pipeline::generic_writer::GenericWriter;
use crate::pipeline::render_error::RenderError;
use crate::pipeline::render_request::{RenderRequest, RenderStatus};
use crate::shared::constants::PLACEHOLDER_CHAR;
use crate::shared::rect::{RectD, RectI};

/// Progress callback: `(frames_done, frames_total)`. Returning `false`
/// cancels the remaining frames.
pub type ProgressFn = Box<dyn Fn(usize, usize) -> bool + Send + Sync>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub frames: usize,
    pub encoded: usize,
    pub aborted: usize,
}

/// Renders every frame of a writer's time domain, the "Render" button.
///
/// Image-sequence targets render frames in parallel. Video targets render
/// one frame at a time in order, since all frames land in one file. The
/// encoder is finished afterwards even when a frame failed.
pub struct RenderSequenceUseCase<'a, E: Encoder> {
    writer: &'a GenericWriter<E>,
    default_range: Option<(f64, f64)>,
    on_progress: Option<ProgressFn>,
}

/// Integer window covering a region of definition.
fn render_window(rod: RectD) -> RectI {
    RectI::new(
        rod.x1.floor() as i32,
        rod.y1.floor() as i32,
        rod.x2.ceil() as i32,
        rod.y2.ceil() as i32,
    )
}

/// Largest magnitude at which every whole frame time is exact in `f64`.
const MAX_FRAME_TIME: f64 = 9_007_199_254_740_992.0;

/// Number of whole frames from `first` to `last` inclusive, zero for a
/// reversed range.
fn frame_count(first: f64, last: f64) -> Result<usize, RenderError> {
    let out_of_bounds = || RenderError::FrameRangeOutOfBounds { first, last };
    if !(first.is_finite() && last.is_finite())
        || first.abs() > MAX_FRAME_TIME
        || last.abs() > MAX_FRAME_TIME
    {
        return Err(out_of_bounds());
    }
    if last < first {
        return Ok(0);
    }
    ((last - first).floor() as u64)
        .checked_add(1)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(out_of_bounds)
}

impl<'a, E: Encoder> RenderSequenceUseCase<'a, E> {
    /// `default_range` stands in for the host default when the writer's
    /// frame range is the union of its inputs.
    pub fn new(
        writer: &'a GenericWriter<E>,
        default_range: Option<(f64, f64)>,
        on_progress: Option<ProgressFn>,
    ) -> Self {
        Self {
            writer,
            default_range,
            on_progress,
        }
    }

    /// Renders the whole range. Clears any earlier cancellation first.
    pub fn execute(&self) -> Result<RenderSummary, RenderError> {
        self.writer.reset_abort();
        let (first, last) = self
            .writer
            .time_domain()
            .or(self.default_range)
            .ok_or(RenderError::UndefinedFrameRange)?;
        let total = frame_count(first, last)?;
        if total == 0 {
            log::warn!("Frame range {first}..{last} is empty, nothing to render");
        }

        let kind = self.writer.target_kind();
        // Without a placeholder every frame resolves to the same file.
        let parallel = kind == Some(TargetKind::ImageSequence)
            && self.writer.config().filename.contains(PLACEHOLDER_CHAR);
        log::info!("Rendering {total} frames ({first}..{last}) as {kind:?}");

        let done = AtomicUsize::new(0);
        let render_one = |index: usize| -> Result<usize, RenderError> {
            if self.writer.aborted() {
                return Ok(0);
            }
            let time = first + index as f64;
            let request = RenderRequest {
                time,
                render_window: render_window(self.writer.region_of_definition(time)),
                destination_connected: self.writer.destination_connected(),
            };
            let status = self.writer.render(&request)?;
            let n = done.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(ref cb) = self.on_progress {
                if !cb(n, total) {
                    self.writer
                        .abort_handle()
                        .store(true, Ordering::SeqCst);
                }
            }
            Ok(usize::from(matches!(status, RenderStatus::Encoded { .. })))
        };

        let rendered = if parallel {
            (0..total)
                .into_par_iter()
                .map(&render_one)
                .try_reduce(|| 0, |a, b| Ok(a + b))
        } else {
            (0..total).try_fold(0, |encoded, index| {
                render_one(index).map(|n| encoded + n)
            })
        };

        let finished = self.writer.encoder().finish().map_err(RenderError::Finish);
        let encoded = rendered?;
        finished?;

        let summary = RenderSummary {
            frames: total,
            encoded,
            aborted: total - encoded,
        };
        log::info!(
            "Render finished: {} of {} frames encoded",
            summary.encoded,
            summary.frames
        );
        Ok(summary)
    }
}
