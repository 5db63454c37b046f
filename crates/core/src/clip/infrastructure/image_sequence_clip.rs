use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::clip::domain::image_clip::ImageClip;
use crate::naming::domain::filename_pattern::filename_from_pattern;
use crate::shared::constants::PLACEHOLDER_CHAR;
use crate::shared::error::SendError;
use crate::shared::pixel_buffer::{flip_rows, BitDepth, PixelBuffer, PixelComponents, PixelData};
use crate::shared::rect::{RectD, RectI};

/// Reads numbered still images from disk as an RGBA source clip.
///
/// Uses the same `###` numbering as the writer's output pattern. Missing
/// frames yield no image rather than an error.
pub struct ImageSequenceClip {
    pattern: String,
    depth: BitDepth,
}

impl ImageSequenceClip {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            depth: BitDepth::F32,
        }
    }

    pub fn with_bit_depth(mut self, depth: BitDepth) -> Self {
        self.depth = depth;
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn path_at(&self, time: f64) -> Result<PathBuf, SendError> {
        if !time.is_finite() || time < 0.0 {
            return Err(format!("invalid frame time {time}").into());
        }
        filename_from_pattern(&self.pattern, time.trunc() as u64)
            .map(PathBuf::from)
            .ok_or_else(|| format!("invalid input pattern '{}'", self.pattern).into())
    }

    /// First and last frame number found on disk, `None` if nothing matches.
    pub fn frame_range(&self) -> Option<(u64, u64)> {
        let pattern = Path::new(&self.pattern);
        let name = pattern.file_name()?.to_str()?;
        let first = name.find(PLACEHOLDER_CHAR)?;
        let last = name.rfind(PLACEHOLDER_CHAR)?;
        let prefix = &name[..first];
        let suffix: String = name[last + 1..]
            .chars()
            .filter(|&c| c != PLACEHOLDER_CHAR)
            .collect();

        let dir = match pattern.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let entries = std::fs::read_dir(&dir).ok()?;

        let frames = entries.filter_map(|entry| {
            let file_name = entry.ok()?.file_name();
            let file_name = file_name.to_str()?;
            let digits = file_name.strip_prefix(prefix)?.strip_suffix(suffix.as_str())?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            digits.parse::<u64>().ok()
        });

        frames.fold(None, |range, frame| match range {
            None => Some((frame, frame)),
            Some((lo, hi)) => Some((lo.min(frame), hi.max(frame))),
        })
    }
}

/// Bottom-up RGBA buffer at `depth` from a decoded top-down image.
fn to_pixel_buffer(img: DynamicImage, depth: BitDepth) -> Result<PixelBuffer, SendError> {
    let (w, h) = (img.width(), img.height());
    let bounds = RectI::from_size(w, h);
    if bounds.is_empty() {
        return Err("decoded image is empty".into());
    }
    let row_len = w as usize * PixelComponents::Rgba.count();
    let data = match depth {
        BitDepth::U8 => PixelData::U8(flip_rows(img.to_rgba8().as_raw(), row_len)),
        BitDepth::U16 => PixelData::U16(flip_rows(img.to_rgba16().as_raw(), row_len)),
        BitDepth::F32 => PixelData::F32(flip_rows(img.to_rgba32f().as_raw(), row_len)),
    };
    Ok(PixelBuffer::new(data, PixelComponents::Rgba, bounds)?)
}

impl ImageClip for ImageSequenceClip {
    fn fetch_image(&self, time: f64) -> Result<Option<PixelBuffer>, SendError> {
        let path = self.path_at(time)?;
        if !path.exists() {
            log::debug!("No input frame at {}", path.display());
            return Ok(None);
        }
        let img = image::open(&path)?;
        Ok(Some(to_pixel_buffer(img, self.depth)?))
    }

    fn region_of_definition(&self, time: f64) -> RectD {
        self.path_at(time)
            .ok()
            .and_then(|path| image::image_dimensions(path).ok())
            .map(|(w, h)| RectI::from_size(w, h).into())
            .unwrap_or_default()
    }
}
