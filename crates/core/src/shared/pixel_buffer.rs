use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::rect::RectI;

/// Storage type of a single channel sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitDepth {
    U8,
    U16,
    F32,
}

/// Channel layout of a pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelComponents {
    Alpha,
    Rgb,
    Rgba,
}

impl PixelComponents {
    pub const fn count(self) -> usize {
        match self {
            PixelComponents::Alpha => 1,
            PixelComponents::Rgb => 3,
            PixelComponents::Rgba => 4,
        }
    }

    pub const fn has_color(self) -> bool {
        matches!(self, PixelComponents::Rgb | PixelComponents::Rgba)
    }
}

/// Sample storage, tagged by bit depth.
#[derive(Clone, Debug, PartialEq)]
pub enum PixelData {
    U8(Vec<u8>),
    U16(Vec<u16>),
    F32(Vec<f32>),
}

impl PixelData {
    pub fn zeroed(depth: BitDepth, len: usize) -> Self {
        match depth {
            BitDepth::U8 => PixelData::U8(vec![0; len]),
            BitDepth::U16 => PixelData::U16(vec![0; len]),
            BitDepth::F32 => PixelData::F32(vec![0.0; len]),
        }
    }

    pub fn bit_depth(&self) -> BitDepth {
        match self {
            PixelData::U8(_) => BitDepth::U8,
            PixelData::U16(_) => BitDepth::U16,
            PixelData::F32(_) => BitDepth::F32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PixelData::U8(v) => v.len(),
            PixelData::U16(v) => v.len(),
            PixelData::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A channel sample type that can be viewed out of [`PixelData`].
///
/// The zero of each type (`Default`) is black / fully transparent.
pub trait Sample: Copy + Default + PartialEq + Send + Sync + 'static {
    const DEPTH: BitDepth;

    fn slice(data: &PixelData) -> Option<&[Self]>;

    fn slice_mut(data: &mut PixelData) -> Option<&mut [Self]>;
}

macro_rules! impl_sample {
    ($ty:ty, $variant:ident) => {
        impl Sample for $ty {
            const DEPTH: BitDepth = BitDepth::$variant;

            fn slice(data: &PixelData) -> Option<&[Self]> {
                match data {
                    PixelData::$variant(v) => Some(v.as_slice()),
                    _ => None,
                }
            }

            fn slice_mut(data: &mut PixelData) -> Option<&mut [Self]> {
                match data {
                    PixelData::$variant(v) => Some(v.as_mut_slice()),
                    _ => None,
                }
            }
        }
    };
}

impl_sample!(u8, U8);
impl_sample!(u16, U16);
impl_sample!(f32, F32);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PixelBufferError {
    #[error("buffer holds {actual} samples, expected {expected} for {width}x{height} {components:?}")]
    SizeMismatch {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
        components: PixelComponents,
    },
}

/// A rectangular image buffer in canvas coordinates.
///
/// Rows are packed bottom-up: row 0 holds `bounds.y1`. A pixel at `(x, y)`
/// exists only inside `bounds`.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    data: PixelData,
    components: PixelComponents,
    bounds: RectI,
}

impl PixelBuffer {
    pub fn new(
        data: PixelData,
        components: PixelComponents,
        bounds: RectI,
    ) -> Result<Self, PixelBufferError> {
        let expected = bounds.width() as usize * bounds.height() as usize * components.count();
        if data.len() != expected {
            return Err(PixelBufferError::SizeMismatch {
                actual: data.len(),
                expected,
                width: bounds.width(),
                height: bounds.height(),
                components,
            });
        }
        Ok(Self {
            data,
            components,
            bounds,
        })
    }

    /// Black, fully transparent buffer covering `bounds`.
    pub fn zeroed(depth: BitDepth, components: PixelComponents, bounds: RectI) -> Self {
        let len = bounds.width() as usize * bounds.height() as usize * components.count();
        Self {
            data: PixelData::zeroed(depth, len),
            components,
            bounds,
        }
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.data.bit_depth()
    }

    pub fn components(&self) -> PixelComponents {
        self.components
    }

    pub fn bounds(&self) -> RectI {
        self.bounds
    }

    pub fn width(&self) -> u32 {
        self.bounds.width()
    }

    pub fn height(&self) -> u32 {
        self.bounds.height()
    }

    pub fn data(&self) -> &PixelData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut PixelData {
        &mut self.data
    }

    /// Same bit depth and channel layout.
    pub fn is_compatible(&self, other: &PixelBuffer) -> bool {
        self.bit_depth() == other.bit_depth() && self.components == other.components
    }

    /// Number of samples in one row.
    pub fn row_len(&self) -> usize {
        self.bounds.width() as usize * self.components.count()
    }

    /// Sample index of the pixel at canvas coordinates, `None` outside bounds.
    pub fn pixel_offset(&self, x: i32, y: i32) -> Option<usize> {
        if !self.bounds.contains(x, y) {
            return None;
        }
        let row = (y - self.bounds.y1) as usize;
        let col = (x - self.bounds.x1) as usize;
        Some(row * self.row_len() + col * self.components.count())
    }

    pub fn samples<T: Sample>(&self) -> Option<&[T]> {
        T::slice(&self.data)
    }

    pub fn samples_mut<T: Sample>(&mut self) -> Option<&mut [T]> {
        T::slice_mut(&mut self.data)
    }

    /// Channels of the pixel at `(x, y)`, `None` outside bounds or when `T`
    /// does not match the buffer's bit depth.
    pub fn pixel<T: Sample>(&self, x: i32, y: i32) -> Option<&[T]> {
        let offset = self.pixel_offset(x, y)?;
        let n = self.components.count();
        self.samples::<T>().map(|s| &s[offset..offset + n])
    }
}

/// Reverses the order of `row_len`-sample rows, converting between the
/// bottom-up buffer layout and the top-down layout of image files.
pub fn flip_rows<T: Copy>(samples: &[T], row_len: usize) -> Vec<T> {
    samples
        .chunks_exact(row_len)
        .rev()
        .flatten()
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_construction_and_accessors() {
        let bounds = RectI::new(0, 0, 2, 3);
        let buffer = PixelBuffer::new(PixelData::U8(vec![7; 24]), PixelComponents::Rgba, bounds)
            .unwrap();
        assert_eq!(buffer.width(), 2);
        assert_eq!(buffer.height(), 3);
        assert_eq!(buffer.bit_depth(), BitDepth::U8);
        assert_eq!(buffer.components(), PixelComponents::Rgba);
        assert_eq!(buffer.row_len(), 8);
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let err = PixelBuffer::new(
            PixelData::F32(vec![0.0; 10]),
            PixelComponents::Rgba,
            RectI::from_size(2, 2),
        )
        .unwrap_err();
        assert_eq!(
            err,
            PixelBufferError::SizeMismatch {
                actual: 10,
                expected: 16,
                width: 2,
                height: 2,
                components: PixelComponents::Rgba,
            }
        );
    }

    #[rstest]
    #[case::u8(BitDepth::U8)]
    #[case::u16(BitDepth::U16)]
    #[case::f32(BitDepth::F32)]
    fn test_zeroed_has_requested_depth(#[case] depth: BitDepth) {
        let buffer = PixelBuffer::zeroed(depth, PixelComponents::Alpha, RectI::from_size(4, 4));
        assert_eq!(buffer.bit_depth(), depth);
        assert_eq!(buffer.data().len(), 16);
    }

    #[test]
    fn test_pixel_offset_respects_bounds_origin() {
        let buffer = PixelBuffer::zeroed(
            BitDepth::U8,
            PixelComponents::Rgba,
            RectI::new(10, 20, 14, 22),
        );
        assert_eq!(buffer.pixel_offset(10, 20), Some(0));
        assert_eq!(buffer.pixel_offset(11, 20), Some(4));
        assert_eq!(buffer.pixel_offset(10, 21), Some(16));
        assert_eq!(buffer.pixel_offset(9, 20), None);
        assert_eq!(buffer.pixel_offset(10, 22), None);
    }

    #[test]
    fn test_pixel_returns_channels() {
        let data: Vec<u16> = (0..8).collect();
        let buffer =
            PixelBuffer::new(PixelData::U16(data), PixelComponents::Rgba, RectI::from_size(2, 1))
                .unwrap();
        assert_eq!(buffer.pixel::<u16>(1, 0), Some(&[4, 5, 6, 7][..]));
    }

    #[test]
    fn test_pixel_with_wrong_sample_type_is_none() {
        let buffer = PixelBuffer::zeroed(BitDepth::F32, PixelComponents::Rgba, RectI::from_size(2, 2));
        assert!(buffer.pixel::<u8>(0, 0).is_none());
        assert!(buffer.pixel::<f32>(0, 0).is_some());
    }

    #[test]
    fn test_compatibility_requires_depth_and_components() {
        let bounds = RectI::from_size(2, 2);
        let a = PixelBuffer::zeroed(BitDepth::F32, PixelComponents::Rgba, bounds);
        let b = PixelBuffer::zeroed(BitDepth::F32, PixelComponents::Rgba, RectI::from_size(8, 8));
        let c = PixelBuffer::zeroed(BitDepth::U8, PixelComponents::Rgba, bounds);
        let d = PixelBuffer::zeroed(BitDepth::F32, PixelComponents::Alpha, bounds);
        assert!(a.is_compatible(&b));
        assert!(!a.is_compatible(&c));
        assert!(!a.is_compatible(&d));
    }

    #[test]
    fn test_flip_rows_reverses_row_order() {
        let samples = [1u8, 2, 3, 4, 5, 6];
        assert_eq!(flip_rows(&samples, 2), vec![5, 6, 3, 4, 1, 2]);
        assert_eq!(flip_rows(&flip_rows(&samples, 3), 3), samples.to_vec());
    }
}
