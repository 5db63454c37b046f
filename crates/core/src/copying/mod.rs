pub mod pixel_copier;
mod scanline;
