#[cfg(feature = "ffmpeg")]
pub mod ffmpeg_video_encoder;
pub mod image_file_encoder;
