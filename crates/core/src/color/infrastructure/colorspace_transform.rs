use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::color::domain::color_transform::ColorTransform;
use crate::shared::error::SendError;
use crate::shared::pixel_buffer::{BitDepth, PixelBuffer, PixelData};

pub const INPUT_SPACE_PARAM: &str = "ocioInputSpace";
pub const OUTPUT_SPACE_PARAM: &str = "ocioOutputSpace";

/// Transfer curve of an RGB encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    Linear,
    Srgb,
    Rec709,
}

impl ColorSpace {
    pub const ALL: &'static [ColorSpace] = &[ColorSpace::Linear, ColorSpace::Srgb, ColorSpace::Rec709];

    pub fn to_linear(self, v: f32) -> f32 {
        match self {
            ColorSpace::Linear => v,
            ColorSpace::Srgb => {
                if v <= 0.04045 {
                    v / 12.92
                } else {
                    ((v + 0.055) / 1.055).powf(2.4)
                }
            }
            ColorSpace::Rec709 => {
                if v < 0.081 {
                    v / 4.5
                } else {
                    ((v + 0.099) / 1.099).powf(1.0 / 0.45)
                }
            }
        }
    }

    /// Applies this space's transfer curve to a linear value.
    pub fn encode(self, v: f32) -> f32 {
        match self {
            ColorSpace::Linear => v,
            ColorSpace::Srgb => {
                if v <= 0.003_130_8 {
                    v * 12.92
                } else {
                    1.055 * v.powf(1.0 / 2.4) - 0.055
                }
            }
            ColorSpace::Rec709 => {
                if v < 0.018 {
                    v * 4.5
                } else {
                    1.099 * v.powf(0.45) - 0.099
                }
            }
        }
    }
}

impl std::fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorSpace::Linear => write!(f, "linear"),
            ColorSpace::Srgb => write!(f, "sRGB"),
            ColorSpace::Rec709 => write!(f, "Rec.709"),
        }
    }
}

enum Lut {
    U8(Vec<u8>),
    U16(Vec<u16>),
}

type LutKey = (ColorSpace, ColorSpace, BitDepth);

/// Converts RGB channels between transfer curves; alpha is left alone.
///
/// Float buffers are converted per sample. Integer buffers go through a
/// lookup table built on first use and kept until the spaces change or
/// caches are purged.
pub struct ColorSpaceTransform {
    spaces: RwLock<(ColorSpace, ColorSpace)>,
    luts: Mutex<HashMap<LutKey, Arc<Lut>>>,
}

impl ColorSpaceTransform {
    pub fn new(input: ColorSpace, output: ColorSpace) -> Self {
        Self {
            spaces: RwLock::new((input, output)),
            luts: Mutex::new(HashMap::new()),
        }
    }

    pub fn spaces(&self) -> (ColorSpace, ColorSpace) {
        *self.spaces.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_spaces(&self, input: ColorSpace, output: ColorSpace) {
        *self.spaces.write().unwrap_or_else(PoisonError::into_inner) = (input, output);
        self.changed_param(INPUT_SPACE_PARAM);
    }

    #[cfg(test)]
    fn cached_lut_count(&self) -> usize {
        self.luts.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn lut(&self, input: ColorSpace, output: ColorSpace, depth: BitDepth) -> Arc<Lut> {
        let mut luts = self.luts.lock().unwrap_or_else(PoisonError::into_inner);
        luts.entry((input, output, depth))
            .or_insert_with(|| {
                log::debug!("Building {depth:?} lookup table for {input} -> {output}");
                Arc::new(build_lut(input, output, depth))
            })
            .clone()
    }
}

impl Default for ColorSpaceTransform {
    fn default() -> Self {
        Self::new(ColorSpace::Linear, ColorSpace::Srgb)
    }
}

fn build_lut(input: ColorSpace, output: ColorSpace, depth: BitDepth) -> Lut {
    let convert = |v: f32| output.encode(input.to_linear(v)).clamp(0.0, 1.0);
    match depth {
        BitDepth::U16 => Lut::U16(
            (0..=u16::MAX)
                .map(|i| (convert(i as f32 / 65535.0) * 65535.0).round() as u16)
                .collect(),
        ),
        _ => Lut::U8(
            (0..=u8::MAX)
                .map(|i| (convert(i as f32 / 255.0) * 255.0).round() as u8)
                .collect(),
        ),
    }
}

impl ColorTransform for ColorSpaceTransform {
    fn apply(&self, buffer: &mut PixelBuffer) -> Result<(), SendError> {
        let (input, output) = self.spaces();
        let components = buffer.components();
        if input == output || !components.has_color() {
            return Ok(());
        }
        let n = components.count();
        let depth = buffer.bit_depth();

        match buffer.data_mut() {
            PixelData::F32(samples) => {
                samples.par_chunks_mut(n).for_each(|px| {
                    for c in &mut px[..3] {
                        *c = output.encode(input.to_linear(*c));
                    }
                });
            }
            PixelData::U8(samples) => {
                let lut = self.lut(input, output, depth);
                let Lut::U8(table) = lut.as_ref() else {
                    return Err("lookup table depth does not match buffer".into());
                };
                samples.par_chunks_mut(n).for_each(|px| {
                    for c in &mut px[..3] {
                        *c = table[*c as usize];
                    }
                });
            }
            PixelData::U16(samples) => {
                let lut = self.lut(input, output, depth);
                let Lut::U16(table) = lut.as_ref() else {
                    return Err("lookup table depth does not match buffer".into());
                };
                samples.par_chunks_mut(n).for_each(|px| {
                    for c in &mut px[..3] {
                        *c = table[*c as usize];
                    }
                });
            }
        }
        Ok(())
    }

    fn changed_param(&self, name: &str) {
        if name == INPUT_SPACE_PARAM || name == OUTPUT_SPACE_PARAM {
            self.purge_caches();
        }
    }

    fn purge_caches(&self) {
        self.luts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
