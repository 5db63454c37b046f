use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::clip::domain::clip_image::ClipImage;
use crate::clip::domain::image_clip::ImageClip;
use crate::color::domain::color_transform::ColorTransform;
use crate::copying::pixel_copier::copy_pixels;
use crate::encoding::domain::encoder::Encoder;
use crate::host::domain::message_sink::{MessageLevel, MessageSink};
use crate::host::domain::timeline::Timeline;
use crate::naming::domain::extension::{file_extension, strip_frame_digits, TargetKind};
use crate::naming::domain::filename_pattern::filename_from_pattern;
use crate::pipeline::render_error::RenderError;
use crate::pipeline::render_request::{RenderRequest, RenderStatus};
use crate::pipeline::writer_config::{FrameRangeChoice, WriterConfig};
use crate::shared::constants::{FRAME_RANGE_PARAM, INVALID_FILENAME_MESSAGE};
use crate::shared::rect::RectD;

/// Per-frame write pipeline shared by every output format.
///
/// Each [`render`](Self::render) call resolves the output filename for the
/// frame, fetches the source image, optionally copies it into the
/// destination clip, colour-converts it and hands it to the encoder `E`.
/// Calls for different frames may run concurrently; each one works from the
/// configuration snapshot current when it started.
pub struct GenericWriter<E: Encoder> {
    source: Box<dyn ImageClip>,
    output: Box<dyn ImageClip>,
    encoder: E,
    color: Box<dyn ColorTransform>,
    timeline: Box<dyn Timeline>,
    messages: Box<dyn MessageSink>,
    supported_extensions: Option<Vec<String>>,
    config: RwLock<Arc<WriterConfig>>,
    first_last_visible: AtomicBool,
    target_cache: Mutex<HashMap<String, TargetKind>>,
    abort: Arc<AtomicBool>,
}

impl<E: Encoder> GenericWriter<E> {
    pub fn new(
        source: Box<dyn ImageClip>,
        output: Box<dyn ImageClip>,
        encoder: E,
        color: Box<dyn ColorTransform>,
        timeline: Box<dyn Timeline>,
        messages: Box<dyn MessageSink>,
    ) -> Self {
        Self {
            source,
            output,
            encoder,
            color,
            timeline,
            messages,
            supported_extensions: None,
            config: RwLock::new(Arc::new(WriterConfig::default())),
            first_last_visible: AtomicBool::new(false),
            target_cache: Mutex::new(HashMap::new()),
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Extensions the host can write. Without a list every extension is
    /// accepted.
    pub fn with_supported_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.supported_extensions = Some(
            extensions
                .into_iter()
                .map(|e| e.as_ref().to_ascii_lowercase())
                .collect(),
        );
        self
    }

    pub fn with_config(self, config: WriterConfig) -> Self {
        self.first_last_visible
            .store(config.frame_range == FrameRangeChoice::Manual, Ordering::SeqCst);
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(config);
        self
    }

    /// Share an externally owned cancellation flag.
    pub fn with_abort_handle(mut self, abort: Arc<AtomicBool>) -> Self {
        self.abort = abort;
        self
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<WriterConfig> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update_config(&self, update: impl FnOnce(&mut WriterConfig)) {
        let mut guard = self.config.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = WriterConfig::clone(&guard);
        update(&mut next);
        *guard = Arc::new(next);
    }

    pub fn set_filename(&self, filename: impl Into<String>) {
        let filename = filename.into();
        self.update_config(|c| c.filename = filename);
        self.messages.clear_persistent_message();
    }

    pub fn set_frame_range_choice(&self, choice: FrameRangeChoice) {
        self.select_frame_range(choice);
    }

    pub fn set_manual_range(&self, first: i32, last: i32) {
        self.update_config(|c| {
            c.first_frame = first;
            c.last_frame = last;
        });
    }

    /// Reacts to a host parameter change.
    ///
    /// A frame-range change shows first/last only under Manual, seeding them
    /// from the timeline. Any other parameter belongs to the colour
    /// transform.
    pub fn changed_param(&self, name: &str) {
        if name != FRAME_RANGE_PARAM {
            self.color.changed_param(name);
            return;
        }
        self.select_frame_range(self.config().frame_range);
    }

    /// Stores `choice` and, for Manual, the timeline-seeded bounds in one
    /// snapshot.
    fn select_frame_range(&self, choice: FrameRangeChoice) {
        let manual = choice == FrameRangeChoice::Manual;
        let seed = manual.then(|| self.timeline.bounds());
        self.update_config(|c| {
            c.frame_range = choice;
            if let Some((first, last)) = seed {
                c.first_frame = first as i32;
                c.last_frame = last as i32;
            }
        });
        self.first_last_visible.store(manual, Ordering::SeqCst);
    }

    /// Whether the first/last frame parameters are shown to the user.
    pub fn first_last_visible(&self) -> bool {
        self.first_last_visible.load(Ordering::SeqCst)
    }

    /// Range a full render covers; `None` lets the host apply its default.
    pub fn time_domain(&self) -> Option<(f64, f64)> {
        self.config()
            .frame_range_policy()
            .time_domain(self.timeline.as_ref())
    }

    pub fn region_of_definition(&self, time: f64) -> RectD {
        self.output.region_of_definition(time)
    }

    pub fn destination_connected(&self) -> bool {
        self.output.is_connected()
    }

    pub fn supported_extensions(&self) -> Option<&[String]> {
        self.supported_extensions.as_deref()
    }

    /// Output kind of the current filename pattern, `None` if it is invalid.
    pub fn target_kind(&self) -> Option<TargetKind> {
        let filename = filename_from_pattern(&self.config().filename, 0)?;
        file_extension(&filename).map(|ext| self.classify(&ext))
    }

    pub fn purge_caches(&self) {
        self.target_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.color.purge_caches();
    }

    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        self.abort.clone()
    }

    pub fn aborted(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }

    /// Clears a previous cancellation so the next render runs.
    pub fn reset_abort(&self) {
        self.abort.store(false, Ordering::SeqCst);
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    fn classify(&self, ext: &str) -> TargetKind {
        *self
            .target_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(ext.to_owned())
            .or_insert_with(|| TargetKind::from_extension(ext))
    }

    fn invalid_filename(&self, pattern: &str) -> RenderError {
        self.messages
            .set_persistent_message(MessageLevel::Error, INVALID_FILENAME_MESSAGE);
        RenderError::InvalidFilename {
            pattern: pattern.to_owned(),
        }
    }

    fn check_supported(&self, ext: &str) {
        let Some(supported) = &self.supported_extensions else {
            return;
        };
        if supported.iter().any(|s| s == ext) {
            return;
        }
        let warning = RenderError::UnsupportedExtension {
            extension: ext.to_owned(),
        };
        log::warn!("{warning}");
        self.messages
            .set_persistent_message(MessageLevel::Error, &warning.to_string());
    }

    /// Writes the frame at `request.time`.
    ///
    /// Fetched images are handed back to their clips on every path out of
    /// this call.
    pub fn render(&self, request: &RenderRequest) -> Result<RenderStatus, RenderError> {
        let config = self.config();
        let time = request.time;

        if !time.is_finite() || time < 0.0 {
            return Err(RenderError::InvalidTime(time));
        }

        let filename = filename_from_pattern(&config.filename, time.trunc() as u64)
            .ok_or_else(|| self.invalid_filename(&config.filename))?;
        let ext = file_extension(&filename).ok_or_else(|| self.invalid_filename(&filename))?;

        self.check_supported(&ext);

        let filename = match self.classify(&ext) {
            TargetKind::ImageSequence => filename,
            TargetKind::Video => strip_frame_digits(&filename),
        };

        let source = ClipImage::fetch(self.source.as_ref(), time).map_err(|source| {
            RenderError::Fetch {
                clip: "source",
                time,
                source,
            }
        })?;

        if request.destination_connected {
            let mut destination = ClipImage::fetch(self.output.as_ref(), time)
                .map_err(|source| RenderError::Fetch {
                    clip: "output",
                    time,
                    source,
                })?
                .ok_or(RenderError::MissingImage {
                    clip: "output",
                    time,
                })?;
            let abort = || self.abort.load(Ordering::SeqCst);
            copy_pixels(
                source.as_deref(),
                &mut destination,
                request.render_window,
                &abort,
            )?;
        }

        let mut source = source.ok_or(RenderError::MissingImage {
            clip: "source",
            time,
        })?;

        self.color
            .apply(&mut source)
            .map_err(RenderError::ColorTransform)?;

        if self.aborted() {
            log::info!("Render aborted before encoding frame {time}");
            return Ok(RenderStatus::Aborted);
        }

        let filename = PathBuf::from(filename);
        self.encoder
            .encode(&filename, time, &source)
            .map_err(|source| RenderError::Encode {
                filename: filename.clone(),
                source,
            })?;

        log::debug!("Encoded frame {time} to {}", filename.display());
        Ok(RenderStatus::Encoded { filename })
    }
}
