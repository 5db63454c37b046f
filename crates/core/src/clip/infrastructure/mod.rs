pub mod image_sequence_clip;
pub mod memory_clip;
