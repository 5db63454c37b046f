use crate::shared::error::SendError;
use crate::shared::pixel_buffer::PixelBuffer;
use crate::shared::rect::RectD;

/// A host clip the writer pulls frames from or pushes frames into.
///
/// Every image returned by [`fetch_image`](ImageClip::fetch_image) must be
/// handed back through [`release_image`](ImageClip::release_image); use
/// [`ClipImage`](crate::clip::domain::clip_image::ClipImage) to make that
/// automatic.
pub trait ImageClip: Send + Sync {
    /// `Ok(None)` when the clip has no image at `time`.
    fn fetch_image(&self, time: f64) -> Result<Option<PixelBuffer>, SendError>;

    fn release_image(&self, _time: f64, _image: PixelBuffer) {}

    fn is_connected(&self) -> bool {
        true
    }

    fn region_of_definition(&self, time: f64) -> RectD;
}

impl<C: ImageClip + ?Sized> ImageClip for std::sync::Arc<C> {
    fn fetch_image(&self, time: f64) -> Result<Option<PixelBuffer>, SendError> {
        (**self).fetch_image(time)
    }

    fn release_image(&self, time: f64, image: PixelBuffer) {
        (**self).release_image(time, image)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn region_of_definition(&self, time: f64) -> RectD {
        (**self).region_of_definition(time)
    }
}
