//! Generic writer pipeline for frame-numbered image sequences and video files.
//!
//! A host drives [`pipeline::generic_writer::GenericWriter`] once per frame.
//! Each call resolves an output filename from a numbering pattern, optionally
//! copies the working buffer into the destination clip, applies a colour
//! transform and hands the result to a format-specific
//! [`encoding::domain::encoder::Encoder`].

pub mod clip;
pub mod color;
pub mod copying;
pub mod encoding;
pub mod host;
pub mod naming;
pub mod pipeline;
pub mod shared;
