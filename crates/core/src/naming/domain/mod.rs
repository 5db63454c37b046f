pub mod extension;
pub mod filename_pattern;
