use thiserror::Error;

use crate::shared::pixel_buffer::{BitDepth, PixelBuffer, PixelComponents};
use crate::shared::rect::RectI;

use super::scanline::copy_scanlines;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CopyError {
    #[error("no copy routine for {depth:?} {components:?} pixels")]
    UnsupportedFormat {
        depth: BitDepth,
        components: PixelComponents,
    },
    #[error(
        "source is {src_depth:?} {src_components:?} but destination is {dst_depth:?} {dst_components:?}"
    )]
    ComponentMismatch {
        src_depth: BitDepth,
        src_components: PixelComponents,
        dst_depth: BitDepth,
        dst_components: PixelComponents,
    },
}

type CopyFn = fn(Option<&PixelBuffer>, &mut PixelBuffer, RectI, &(dyn Fn() -> bool + Sync));

struct CopyStrategy {
    depth: BitDepth,
    components: PixelComponents,
    run: CopyFn,
}

/// Every pixel layout the copier knows how to handle.
const COPY_STRATEGIES: &[CopyStrategy] = &[
    CopyStrategy {
        depth: BitDepth::U8,
        components: PixelComponents::Rgba,
        run: copy_scanlines::<u8, 4>,
    },
    CopyStrategy {
        depth: BitDepth::U16,
        components: PixelComponents::Rgba,
        run: copy_scanlines::<u16, 4>,
    },
    CopyStrategy {
        depth: BitDepth::F32,
        components: PixelComponents::Rgba,
        run: copy_scanlines::<f32, 4>,
    },
    CopyStrategy {
        depth: BitDepth::U8,
        components: PixelComponents::Alpha,
        run: copy_scanlines::<u8, 1>,
    },
    CopyStrategy {
        depth: BitDepth::U16,
        components: PixelComponents::Alpha,
        run: copy_scanlines::<u16, 1>,
    },
    CopyStrategy {
        depth: BitDepth::F32,
        components: PixelComponents::Alpha,
        run: copy_scanlines::<f32, 1>,
    },
];

fn copy_strategy(depth: BitDepth, components: PixelComponents) -> Option<CopyFn> {
    COPY_STRATEGIES
        .iter()
        .find(|s| s.depth == depth && s.components == components)
        .map(|s| s.run)
}

/// True when the copier has a routine for this pixel layout.
pub fn supports_format(depth: BitDepth, components: PixelComponents) -> bool {
    copy_strategy(depth, components).is_some()
}

/// Copies the render `window` of `src` into `dst`.
///
/// With no source, the window is filled with zeros (black, transparent).
/// Samples are copied verbatim with no range conversion. Both checks run
/// before any pixel is written: the destination layout must have a copy
/// routine, and a present source must match it exactly.
///
/// `abort` is polled once per scanline; once it returns `true` the
/// remaining scanlines are skipped and the call still returns `Ok`.
pub fn copy_pixels(
    src: Option<&PixelBuffer>,
    dst: &mut PixelBuffer,
    window: RectI,
    abort: &(dyn Fn() -> bool + Sync),
) -> Result<(), CopyError> {
    let depth = dst.bit_depth();
    let components = dst.components();

    let run = copy_strategy(depth, components)
        .ok_or(CopyError::UnsupportedFormat { depth, components })?;

    if let Some(src) = src {
        check_components(src, dst)?;
    }

    run(src, dst, window, abort);
    Ok(())
}

fn check_components(src: &PixelBuffer, dst: &PixelBuffer) -> Result<(), CopyError> {
    if !src.is_compatible(dst) {
        return Err(CopyError::ComponentMismatch {
            src_depth: src.bit_depth(),
            src_components: src.components(),
            dst_depth: dst.bit_depth(),
            dst_components: dst.components(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::pixel_buffer::PixelData;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn never() -> bool {
        false
    }

    fn gradient_u8(bounds: RectI, components: PixelComponents) -> PixelBuffer {
        let len = bounds.width() as usize * bounds.height() as usize * components.count();
        let data = (0..len).map(|i| (i % 251) as u8 + 1).collect();
        PixelBuffer::new(PixelData::U8(data), components, bounds).unwrap()
    }

    fn filled_u8(bounds: RectI, components: PixelComponents, value: u8) -> PixelBuffer {
        let len = bounds.width() as usize * bounds.height() as usize * components.count();
        PixelBuffer::new(PixelData::U8(vec![value; len]), components, bounds).unwrap()
    }

    fn rows_equal_to(buffer: &PixelBuffer, value: u8) -> usize {
        let row_len = buffer.row_len();
        buffer
            .samples::<u8>()
            .unwrap()
            .chunks(row_len)
            .filter(|row| row.iter().all(|&s| s == value))
            .count()
    }

    #[rstest]
    #[case::rgba(PixelComponents::Rgba)]
    #[case::alpha(PixelComponents::Alpha)]
    fn test_copy_matches_source(#[case] components: PixelComponents) {
        let bounds = RectI::from_size(17, 9);
        let src = gradient_u8(bounds, components);
        let mut dst = filled_u8(bounds, components, 0);

        copy_pixels(Some(&src), &mut dst, bounds, &never).unwrap();

        assert_eq!(dst, src);
    }

    #[test]
    fn test_float_samples_copied_verbatim() {
        let bounds = RectI::from_size(2, 1);
        let values = vec![-0.25, 1.5, 0.0, 1e-7, 42.0, 0.5, 3.0, -8.0];
        let src = PixelBuffer::new(PixelData::F32(values.clone()), PixelComponents::Rgba, bounds)
            .unwrap();
        let mut dst = PixelBuffer::zeroed(BitDepth::F32, PixelComponents::Rgba, bounds);

        copy_pixels(Some(&src), &mut dst, bounds, &never).unwrap();

        assert_eq!(dst.samples::<f32>().unwrap(), &values[..]);
    }

    #[test]
    fn test_u16_samples_copied_verbatim() {
        let bounds = RectI::from_size(3, 2);
        let values: Vec<u16> = (0..6).map(|i| 65535 - i * 1000).collect();
        let src =
            PixelBuffer::new(PixelData::U16(values.clone()), PixelComponents::Alpha, bounds)
                .unwrap();
        let mut dst = PixelBuffer::zeroed(BitDepth::U16, PixelComponents::Alpha, bounds);

        copy_pixels(Some(&src), &mut dst, bounds, &never).unwrap();

        assert_eq!(dst.samples::<u16>().unwrap(), &values[..]);
    }

    #[rstest]
    #[case::u8(BitDepth::U8)]
    #[case::u16(BitDepth::U16)]
    #[case::f32(BitDepth::F32)]
    fn test_no_source_fills_zero(#[case] depth: BitDepth) {
        let bounds = RectI::from_size(8, 4);
        let data = match depth {
            BitDepth::U8 => PixelData::U8(vec![9; 128]),
            BitDepth::U16 => PixelData::U16(vec![9; 128]),
            BitDepth::F32 => PixelData::F32(vec![9.0; 128]),
        };
        let mut dst = PixelBuffer::new(data, PixelComponents::Rgba, bounds).unwrap();

        copy_pixels(None, &mut dst, bounds, &never).unwrap();

        assert_eq!(dst, PixelBuffer::zeroed(depth, PixelComponents::Rgba, bounds));
    }

    #[test]
    fn test_pixels_outside_window_untouched() {
        let bounds = RectI::from_size(10, 10);
        let src = filled_u8(bounds, PixelComponents::Alpha, 1);
        let mut dst = filled_u8(bounds, PixelComponents::Alpha, 200);

        copy_pixels(Some(&src), &mut dst, RectI::new(2, 3, 5, 7), &never).unwrap();

        for y in 0..10 {
            for x in 0..10 {
                let inside = (2..5).contains(&x) && (3..7).contains(&y);
                let expected = if inside { 1 } else { 200 };
                assert_eq!(dst.pixel::<u8>(x, y).unwrap()[0], expected, "at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_window_clipped_to_destination() {
        let bounds = RectI::from_size(4, 4);
        let src = filled_u8(bounds, PixelComponents::Rgba, 5);
        let mut dst = filled_u8(bounds, PixelComponents::Rgba, 0);

        copy_pixels(Some(&src), &mut dst, RectI::new(-10, -10, 100, 100), &never).unwrap();

        assert_eq!(dst, src);
    }

    #[test]
    fn test_destination_pixels_beyond_source_bounds_are_zeroed() {
        let src = filled_u8(RectI::new(0, 0, 2, 4), PixelComponents::Alpha, 7);
        let mut dst = filled_u8(RectI::new(0, 0, 4, 4), PixelComponents::Alpha, 99);
        let window = dst.bounds();

        copy_pixels(Some(&src), &mut dst, window, &never).unwrap();

        for y in 0..4 {
            assert_eq!(dst.pixel::<u8>(0, y).unwrap()[0], 7);
            assert_eq!(dst.pixel::<u8>(1, y).unwrap()[0], 7);
            assert_eq!(dst.pixel::<u8>(2, y).unwrap()[0], 0);
            assert_eq!(dst.pixel::<u8>(3, y).unwrap()[0], 0);
        }
    }

    #[test]
    fn test_offset_bounds_use_canvas_coordinates() {
        let src_bounds = RectI::new(100, 50, 103, 52);
        let src = gradient_u8(src_bounds, PixelComponents::Rgba);
        let mut dst = filled_u8(RectI::new(101, 50, 104, 52), PixelComponents::Rgba, 0);
        let window = dst.bounds();

        copy_pixels(Some(&src), &mut dst, window, &never).unwrap();

        assert_eq!(dst.pixel::<u8>(101, 51), src.pixel::<u8>(101, 51));
        assert_eq!(dst.pixel::<u8>(102, 50), src.pixel::<u8>(102, 50));
        assert_eq!(dst.pixel::<u8>(103, 50).unwrap(), &[0, 0, 0, 0]);
    }

    #[rstest]
    #[case::rgb_u8(BitDepth::U8)]
    #[case::rgb_u16(BitDepth::U16)]
    #[case::rgb_f32(BitDepth::F32)]
    fn test_rgb_destination_unsupported(#[case] depth: BitDepth) {
        let bounds = RectI::from_size(2, 2);
        let mut dst = PixelBuffer::zeroed(depth, PixelComponents::Rgb, bounds);

        let err = copy_pixels(None, &mut dst, bounds, &never).unwrap_err();

        assert_eq!(
            err,
            CopyError::UnsupportedFormat {
                depth,
                components: PixelComponents::Rgb
            }
        );
        assert!(!supports_format(depth, PixelComponents::Rgb));
    }

    #[test]
    fn test_depth_mismatch_rejected_before_writing() {
        let bounds = RectI::from_size(2, 2);
        let src = PixelBuffer::zeroed(BitDepth::F32, PixelComponents::Rgba, bounds);
        let mut dst = filled_u8(bounds, PixelComponents::Rgba, 77);

        let err = copy_pixels(Some(&src), &mut dst, bounds, &never).unwrap_err();

        assert!(matches!(err, CopyError::ComponentMismatch { .. }));
        assert_eq!(rows_equal_to(&dst, 77), 2);
    }

    #[test]
    fn test_component_mismatch_rejected() {
        let bounds = RectI::from_size(2, 2);
        let src = filled_u8(bounds, PixelComponents::Alpha, 1);
        let mut dst = filled_u8(bounds, PixelComponents::Rgba, 0);

        let err = copy_pixels(Some(&src), &mut dst, bounds, &never).unwrap_err();

        assert_eq!(
            err,
            CopyError::ComponentMismatch {
                src_depth: BitDepth::U8,
                src_components: PixelComponents::Alpha,
                dst_depth: BitDepth::U8,
                dst_components: PixelComponents::Rgba,
            }
        );
    }

    #[test]
    fn test_abort_before_start_writes_nothing() {
        let bounds = RectI::from_size(6, 6);
        let src = filled_u8(bounds, PixelComponents::Rgba, 1);
        let mut dst = filled_u8(bounds, PixelComponents::Rgba, 99);

        copy_pixels(Some(&src), &mut dst, bounds, &|| true).unwrap();

        assert_eq!(rows_equal_to(&dst, 99), 6);
    }

    #[test]
    fn test_abort_stops_remaining_scanlines() {
        let bounds = RectI::from_size(16, 32);
        let src = filled_u8(bounds, PixelComponents::Rgba, 1);
        let mut dst = filled_u8(bounds, PixelComponents::Rgba, 99);
        let polls = AtomicUsize::new(0);
        let abort = || polls.fetch_add(1, Ordering::SeqCst) >= 3;

        copy_pixels(Some(&src), &mut dst, bounds, &abort).unwrap();

        assert_eq!(rows_equal_to(&dst, 1), 3);
        assert_eq!(rows_equal_to(&dst, 99), 29);
        assert_eq!(polls.load(Ordering::SeqCst), 32);
    }

    #[test]
    fn test_large_buffer_parallel_copy() {
        let bounds = RectI::from_size(640, 360);
        let src = gradient_u8(bounds, PixelComponents::Rgba);
        let mut dst = filled_u8(bounds, PixelComponents::Rgba, 0);

        copy_pixels(Some(&src), &mut dst, bounds, &never).unwrap();

        assert_eq!(dst, src);
    }
}
