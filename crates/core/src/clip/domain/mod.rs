pub mod clip_image;
pub mod image_clip;
