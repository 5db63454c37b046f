use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::clip::domain::image_clip::ImageClip;
use crate::shared::error::SendError;
use crate::shared::pixel_buffer::{BitDepth, PixelBuffer, PixelComponents};
use crate::shared::rect::{RectD, RectI};

fn frame_key(time: f64) -> i64 {
    time.trunc() as i64
}

#[derive(Clone, Copy)]
struct OutputTemplate {
    bounds: RectI,
    depth: BitDepth,
    components: PixelComponents,
}

/// In-memory clip backed by a map of frames.
///
/// As a source it serves clones of the frames it was given. As an output it
/// hands out a fresh black buffer per fetch, and can keep what is released
/// so the written result can be inspected. Tracks how many fetched images
/// have not yet been released.
pub struct MemoryClip {
    frames: Mutex<HashMap<i64, PixelBuffer>>,
    template: Option<OutputTemplate>,
    connected: bool,
    keep_released: bool,
    failing: HashSet<i64>,
    outstanding: AtomicUsize,
    fetches: AtomicUsize,
}

impl MemoryClip {
    fn empty(template: Option<OutputTemplate>) -> Self {
        Self {
            frames: Mutex::new(HashMap::new()),
            template,
            connected: true,
            keep_released: false,
            failing: HashSet::new(),
            outstanding: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Source clip with no frames yet.
    pub fn source() -> Self {
        Self::empty(None)
    }

    /// Output clip that allocates `bounds`-sized buffers on fetch.
    pub fn output(bounds: RectI, depth: BitDepth, components: PixelComponents) -> Self {
        Self::empty(Some(OutputTemplate {
            bounds,
            depth,
            components,
        }))
    }

    pub fn with_frame(self, time: f64, image: PixelBuffer) -> Self {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(frame_key(time), image);
        self
    }

    pub fn disconnected(mut self) -> Self {
        self.connected = false;
        self
    }

    /// Store released images so they can be read back with [`image_at`](Self::image_at).
    pub fn keep_released(mut self) -> Self {
        self.keep_released = true;
        self
    }

    /// Make fetches at `time` fail.
    pub fn failing_at(mut self, time: f64) -> Self {
        self.failing.insert(frame_key(time));
        self
    }

    pub fn image_at(&self, time: f64) -> Option<PixelBuffer> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&frame_key(time))
            .cloned()
    }

    /// Fetched images not yet released.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Sorted times of the frames currently held.
    pub fn frame_times(&self) -> Vec<i64> {
        let mut times: Vec<i64> = self
            .frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        times.sort_unstable();
        times
    }
}

impl ImageClip for MemoryClip {
    fn fetch_image(&self, time: f64) -> Result<Option<PixelBuffer>, SendError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let key = frame_key(time);
        if self.failing.contains(&key) {
            return Err(format!("no image available at frame {key}").into());
        }

        let image = match self.template {
            Some(t) => Some(PixelBuffer::zeroed(t.depth, t.components, t.bounds)),
            None => self
                .frames
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&key)
                .cloned(),
        };
        if image.is_some() {
            self.outstanding.fetch_add(1, Ordering::SeqCst);
        }
        Ok(image)
    }

    fn release_image(&self, time: f64, image: PixelBuffer) {
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
        if self.keep_released {
            self.frames
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(frame_key(time), image);
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn region_of_definition(&self, time: f64) -> RectD {
        if let Some(t) = self.template {
            return t.bounds.into();
        }
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&frame_key(time))
            .map(|image| image.bounds().into())
            .unwrap_or_default()
    }
}
