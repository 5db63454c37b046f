use std::path::Path;

use crate::shared::error::SendError;
use crate::shared::pixel_buffer::PixelBuffer;

/// Format-specific write step the writer delegates to once a frame has been
/// copied and colour-converted.
///
/// `encode` is called once per rendered frame, possibly from several threads
/// at once when the target is an image sequence. Video targets receive every
/// frame under the same `filename`; `finish` closes whatever such calls left
/// open.
pub trait Encoder: Send + Sync {
    fn encode(&self, filename: &Path, time: f64, image: &PixelBuffer) -> Result<(), SendError>;

    fn finish(&self) -> Result<(), SendError> {
        Ok(())
    }
}

impl<E: Encoder + ?Sized> Encoder for Box<E> {
    fn encode(&self, filename: &Path, time: f64, image: &PixelBuffer) -> Result<(), SendError> {
        (**self).encode(filename, time, image)
    }

    fn finish(&self) -> Result<(), SendError> {
        (**self).finish()
    }
}
