use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::encoding::domain::encoder::Encoder;
use crate::encoding::infrastructure::image_file_encoder::to_dynamic_image;
use crate::shared::error::SendError;
use crate::shared::pixel_buffer::PixelBuffer;

const DEFAULT_FPS: i32 = 24;

/// One open output container and its encoder state.
struct VideoStream {
    octx: ffmpeg_next::format::context::Output,
    encoder: ffmpeg_next::codec::encoder::video::Encoder,
    scaler: ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    frame_count: i64,
}

// Safety: a VideoStream is only touched while the owning encoder's mutex is
// held, so the raw ffmpeg pointers are never used from two threads at once.
unsafe impl Send for VideoStream {}

impl VideoStream {
    fn open(path: &Path, width: u32, height: u32, fps: i32) -> Result<Self, SendError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut octx = ffmpeg_next::format::output(path)?;

        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4)
            .ok_or("MPEG4 encoder not found")?;

        let mut ost = octx.add_stream(Some(codec))?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;

        encoder_ctx.set_width(width);
        encoder_ctx.set_height(height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, fps));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps, 1)));

        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx.open_with(ffmpeg_next::Dictionary::new())?;
        ost.set_parameters(&encoder);

        octx.write_header()?;

        let scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::format::Pixel::YUV420P,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        log::info!("Opened video stream {} ({width}x{height} @ {fps} fps)", path.display());

        Ok(Self {
            octx,
            encoder,
            scaler,
            width,
            height,
            frame_count: 0,
        })
    }

    fn write(&mut self, rgb: &[u8], fps: i32) -> Result<(), SendError> {
        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            self.width,
            self.height,
        );

        let stride = rgb_frame.stride(0);
        let row_bytes = self.width as usize * 3;
        let data = rgb_frame.data_mut(0);
        for (row, src) in rgb.chunks_exact(row_bytes).enumerate() {
            let dst_start = row * stride;
            data[dst_start..dst_start + row_bytes].copy_from_slice(src);
        }

        let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler.run(&rgb_frame, &mut yuv_frame)?;
        yuv_frame.set_pts(Some(self.frame_count));

        self.encoder.send_frame(&yuv_frame)?;
        self.drain(fps)?;

        self.frame_count += 1;
        Ok(())
    }

    fn drain(&mut self, fps: i32) -> Result<(), SendError> {
        let ost_time_base = self
            .octx
            .stream(0)
            .ok_or("output stream missing")?
            .time_base();

        let mut encoded = ffmpeg_next::Packet::empty();
        while self.encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(ffmpeg_next::Rational(1, fps), ost_time_base);
            encoded.write_interleaved(&mut self.octx)?;
        }
        Ok(())
    }

    fn close(mut self, fps: i32) -> Result<(), SendError> {
        self.encoder.send_eof()?;
        self.drain(fps)?;
        self.octx.write_trailer()?;
        Ok(())
    }
}

/// Encodes every frame addressed to the same filename into one video
/// container via ffmpeg-next.
///
/// A stream is opened on the first frame for a filename and takes its size
/// from that frame. Frames must arrive in presentation order; the sequence
/// renderer guarantees this for video targets. [`Encoder::finish`] flushes
/// and closes all open streams.
pub struct FfmpegVideoEncoder {
    fps: i32,
    streams: Mutex<HashMap<PathBuf, VideoStream>>,
}

impl FfmpegVideoEncoder {
    pub fn new() -> Self {
        Self::with_frame_rate(DEFAULT_FPS as f64)
    }

    pub fn with_frame_rate(fps: f64) -> Self {
        let fps_i = fps.round() as i32;
        Self {
            fps: if fps_i <= 0 { DEFAULT_FPS } else { fps_i },
            streams: Mutex::new(HashMap::new()),
        }
    }

    pub fn open_streams(&self) -> usize {
        self.streams
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for FfmpegVideoEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for FfmpegVideoEncoder {
    fn encode(&self, filename: &Path, _time: f64, image: &PixelBuffer) -> Result<(), SendError> {
        let rgb = to_dynamic_image(image)?.to_rgb8();
        let (width, height) = rgb.dimensions();

        let mut streams = self.streams.lock().unwrap_or_else(PoisonError::into_inner);
        if !streams.contains_key(filename) {
            ffmpeg_next::init()?;
            let stream = VideoStream::open(filename, width, height, self.fps)?;
            streams.insert(filename.to_path_buf(), stream);
        }
        let stream = streams
            .get_mut(filename)
            .ok_or("video stream vanished while encoding")?;

        if (stream.width, stream.height) != (width, height) {
            return Err(format!(
                "frame is {width}x{height} but {} was opened at {}x{}",
                filename.display(),
                stream.width,
                stream.height
            )
            .into());
        }

        stream.write(rgb.as_raw(), self.fps)
    }

    fn finish(&self) -> Result<(), SendError> {
        let streams: Vec<_> = self
            .streams
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();

        let mut first_error = None;
        for (path, stream) in streams {
            let frames = stream.frame_count;
            match stream.close(self.fps) {
                Ok(()) => log::info!("Closed {} after {frames} frames", path.display()),
                Err(e) => {
                    log::warn!("Failed to close {}: {e}", path.display());
                    first_error.get_or_insert(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Drop for FfmpegVideoEncoder {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            log::warn!("Video streams not closed cleanly: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::pixel_buffer::{BitDepth, PixelComponents, PixelData};
    use crate::shared::rect::RectI;

    fn solid_frame(w: u32, h: u32, value: u8) -> PixelBuffer {
        PixelBuffer::new(
            PixelData::U8(vec![value; (w * h * 4) as usize]),
            PixelComponents::Rgba,
            RectI::from_size(w, h),
        )
        .unwrap()
    }

    fn decoded_size(path: &Path) -> (u32, u32) {
        ffmpeg_next::init().unwrap();
        let ictx = ffmpeg_next::format::input(path).unwrap();
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .unwrap();
        let codec_ctx =
            ffmpeg_next::codec::context::Context::from_parameters(stream.parameters()).unwrap();
        let decoder = codec_ctx.decoder().video().unwrap();
        (decoder.width(), decoder.height())
    }

    #[test]
    fn test_frames_share_one_container() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");
        let encoder = FfmpegVideoEncoder::with_frame_rate(25.0);

        for t in 0..3 {
            encoder.encode(&path, t as f64, &solid_frame(160, 120, 128)).unwrap();
        }
        assert_eq!(encoder.open_streams(), 1);
        encoder.finish().unwrap();

        assert_eq!(encoder.open_streams(), 0);
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        assert_eq!(decoded_size(&path), (160, 120));
    }

    #[test]
    fn test_size_change_mid_stream_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");
        let encoder = FfmpegVideoEncoder::new();

        encoder.encode(&path, 0.0, &solid_frame(160, 120, 10)).unwrap();
        let result = encoder.encode(&path, 1.0, &solid_frame(80, 60, 10));

        assert!(result.is_err());
    }

    #[test]
    fn test_float_frames_are_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.mp4");
        let encoder = FfmpegVideoEncoder::new();
        let frame = PixelBuffer::zeroed(BitDepth::F32, PixelComponents::Rgba, RectI::from_size(64, 48));

        encoder.encode(&path, 0.0, &frame).unwrap();
        encoder.finish().unwrap();

        assert_eq!(decoded_size(&path), (64, 48));
    }

    #[test]
    fn test_finish_without_frames_is_ok() {
        let encoder = FfmpegVideoEncoder::new();
        encoder.finish().unwrap();
        encoder.finish().unwrap();
    }

    #[test]
    fn test_non_positive_frame_rate_falls_back() {
        assert_eq!(FfmpegVideoEncoder::with_frame_rate(0.0).fps, DEFAULT_FPS);
        assert_eq!(FfmpegVideoEncoder::with_frame_rate(29.97).fps, 30);
    }
}
