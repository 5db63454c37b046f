use rayon::prelude::*;

use crate::shared::pixel_buffer::{PixelBuffer, Sample};
use crate::shared::rect::RectI;

/// Borrowed source samples with the addressing needed to look up a pixel.
struct SourceView<'a, T> {
    samples: &'a [T],
    bounds: RectI,
    row_len: usize,
}

impl<'a, T: Sample> SourceView<'a, T> {
    fn of(buffer: &'a PixelBuffer) -> Option<Self> {
        Some(Self {
            samples: buffer.samples::<T>()?,
            bounds: buffer.bounds(),
            row_len: buffer.row_len(),
        })
    }

    fn pixel<const N: usize>(&self, x: i32, y: i32) -> Option<&'a [T]> {
        if !self.bounds.contains(x, y) {
            return None;
        }
        let offset =
            (y - self.bounds.y1) as usize * self.row_len + (x - self.bounds.x1) as usize * N;
        Some(&self.samples[offset..offset + N])
    }
}

/// Copies `window` (clipped to the destination bounds) from `src` into `dst`,
/// one rayon task per scanline.
///
/// Destination pixels with no source pixel at the same coordinates are set
/// to zero. `abort` is polled once at the start of every scanline; rows that
/// observe `true` are left untouched.
pub(super) fn copy_scanlines<T: Sample, const N: usize>(
    src: Option<&PixelBuffer>,
    dst: &mut PixelBuffer,
    window: RectI,
    abort: &(dyn Fn() -> bool + Sync),
) {
    let bounds = dst.bounds();
    let window = window.intersect(&bounds);
    if window.is_empty() {
        return;
    }

    let row_len = dst.row_len();
    let first_row = (window.y1 - bounds.y1) as usize;
    let rows = window.height() as usize;
    let source = src.and_then(SourceView::<T>::of);

    let Some(samples) = dst.samples_mut::<T>() else {
        return;
    };

    samples[first_row * row_len..(first_row + rows) * row_len]
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(i, row)| {
            if abort() {
                return;
            }
            let y = window.y1 + i as i32;
            for x in window.x1..window.x2 {
                let start = (x - bounds.x1) as usize * N;
                let dst_px = &mut row[start..start + N];
                match source.as_ref().and_then(|s| s.pixel::<N>(x, y)) {
                    Some(src_px) => dst_px.copy_from_slice(src_px),
                    None => dst_px.fill(T::default()),
                }
            }
        });
}
