use crate::shared::error::SendError;
use crate::shared::pixel_buffer::PixelBuffer;

/// Domain interface for the colour-management step applied to every frame
/// before encoding.
///
/// Implementations convert in place (`&mut PixelBuffer`) and must tolerate
/// concurrent `apply` calls from different render threads.
pub trait ColorTransform: Send + Sync {
    fn apply(&self, buffer: &mut PixelBuffer) -> Result<(), SendError>;

    /// Notification that a host parameter changed. Default: ignored.
    fn changed_param(&self, _name: &str) {}

    /// Drop any cached state. Default: no-op.
    fn purge_caches(&self) {}
}

/// Leaves pixels untouched.
pub struct NoopColorTransform;

impl ColorTransform for NoopColorTransform {
    fn apply(&self, _buffer: &mut PixelBuffer) -> Result<(), SendError> {
        Ok(())
    }
}
