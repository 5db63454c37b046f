use std::ops::{Deref, DerefMut};

use crate::clip::domain::image_clip::ImageClip;
use crate::shared::error::SendError;
use crate::shared::pixel_buffer::{BitDepth, PixelBuffer, PixelComponents};
use crate::shared::rect::RectI;

/// A fetched image that is released back to its clip when dropped.
pub struct ClipImage<'a> {
    clip: &'a dyn ImageClip,
    time: f64,
    image: PixelBuffer,
}

impl<'a> ClipImage<'a> {
    pub fn fetch(clip: &'a dyn ImageClip, time: f64) -> Result<Option<Self>, SendError> {
        Ok(clip
            .fetch_image(time)?
            .map(|image| Self { clip, time, image }))
    }

    pub fn time(&self) -> f64 {
        self.time
    }
}

impl Deref for ClipImage<'_> {
    type Target = PixelBuffer;

    fn deref(&self) -> &PixelBuffer {
        &self.image
    }
}

impl DerefMut for ClipImage<'_> {
    fn deref_mut(&mut self) -> &mut PixelBuffer {
        &mut self.image
    }
}

impl Drop for ClipImage<'_> {
    fn drop(&mut self) {
        let empty = PixelBuffer::zeroed(BitDepth::U8, PixelComponents::Alpha, RectI::default());
        let image = std::mem::replace(&mut self.image, empty);
        self.clip.release_image(self.time, image);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::infrastructure::memory_clip::MemoryClip;

    fn frame() -> PixelBuffer {
        PixelBuffer::zeroed(BitDepth::U8, PixelComponents::Rgba, RectI::from_size(2, 2))
    }

    #[test]
    fn test_release_on_drop() {
        let clip = MemoryClip::source().with_frame(1.0, frame());
        {
            let image = ClipImage::fetch(&clip, 1.0).unwrap().unwrap();
            assert_eq!(image.width(), 2);
            assert_eq!(clip.outstanding(), 1);
        }
        assert_eq!(clip.outstanding(), 0);
    }

    #[test]
    fn test_missing_frame_is_none() {
        let clip = MemoryClip::source();
        assert!(ClipImage::fetch(&clip, 4.0).unwrap().is_none());
        assert_eq!(clip.outstanding(), 0);
    }

    #[test]
    fn test_mutations_are_released_to_clip() {
        let clip = MemoryClip::output(RectI::from_size(2, 2), BitDepth::U8, PixelComponents::Rgba)
            .keep_released();
        {
            let mut image = ClipImage::fetch(&clip, 3.0).unwrap().unwrap();
            image.samples_mut::<u8>().unwrap()[0] = 42;
            assert_eq!(image.time(), 3.0);
        }
        let stored = clip.image_at(3.0).unwrap();
        assert_eq!(stored.samples::<u8>().unwrap()[0], 42);
    }
}
