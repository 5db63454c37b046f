use std::path::Path;

use image::DynamicImage;

use crate::encoding::domain::encoder::Encoder;
use crate::shared::error::SendError;
use crate::shared::pixel_buffer::{flip_rows, PixelBuffer, PixelComponents, PixelData};

/// Writes each frame to its own still-image file using the `image` crate.
///
/// The output format follows the file extension. Buffers are converted to
/// the closest layout the format can hold: JPEG and PNM get 8-bit RGB,
/// PNG and TIFF store float input as 16-bit, EXR and HDR keep float.
pub struct ImageFileEncoder;

impl ImageFileEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for ImageFileEncoder {
    fn encode(&self, filename: &Path, time: f64, image: &PixelBuffer) -> Result<(), SendError> {
        // Fails before touching the filesystem when the extension is unknown.
        image::ImageFormat::from_path(filename)?;

        if let Some(parent) = filename.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let ext = filename
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let img = convert_for_format(to_dynamic_image(image)?, &ext);
        img.save(filename)?;

        log::debug!("Wrote frame {time} to {}", filename.display());
        Ok(())
    }
}

/// Top-down `DynamicImage` from a bottom-up pixel buffer.
pub(crate) fn to_dynamic_image(buffer: &PixelBuffer) -> Result<DynamicImage, SendError> {
    if buffer.bounds().is_empty() {
        return Err("cannot encode an empty image".into());
    }
    let (w, h) = (buffer.width(), buffer.height());
    let row_len = buffer.row_len();
    let components = buffer.components();
    let invalid = || -> SendError { "pixel data does not match image dimensions".into() };

    let img = match (buffer.data(), components) {
        (PixelData::U8(s), PixelComponents::Rgba) => DynamicImage::ImageRgba8(
            image::RgbaImage::from_raw(w, h, flip_rows(s, row_len)).ok_or_else(invalid)?,
        ),
        (PixelData::U8(s), PixelComponents::Rgb) => DynamicImage::ImageRgb8(
            image::RgbImage::from_raw(w, h, flip_rows(s, row_len)).ok_or_else(invalid)?,
        ),
        (PixelData::U8(s), PixelComponents::Alpha) => DynamicImage::ImageLuma8(
            image::GrayImage::from_raw(w, h, flip_rows(s, row_len)).ok_or_else(invalid)?,
        ),
        (PixelData::U16(s), PixelComponents::Rgba) => DynamicImage::ImageRgba16(
            image::ImageBuffer::from_raw(w, h, flip_rows(s, row_len)).ok_or_else(invalid)?,
        ),
        (PixelData::U16(s), PixelComponents::Rgb) => DynamicImage::ImageRgb16(
            image::ImageBuffer::from_raw(w, h, flip_rows(s, row_len)).ok_or_else(invalid)?,
        ),
        (PixelData::U16(s), PixelComponents::Alpha) => DynamicImage::ImageLuma16(
            image::ImageBuffer::from_raw(w, h, flip_rows(s, row_len)).ok_or_else(invalid)?,
        ),
        (PixelData::F32(s), PixelComponents::Rgba) => DynamicImage::ImageRgba32F(
            image::Rgba32FImage::from_raw(w, h, flip_rows(s, row_len)).ok_or_else(invalid)?,
        ),
        (PixelData::F32(s), PixelComponents::Rgb) => DynamicImage::ImageRgb32F(
            image::Rgb32FImage::from_raw(w, h, flip_rows(s, row_len)).ok_or_else(invalid)?,
        ),
        // No single-channel float layout in `image`; quantise to 16 bits.
        (PixelData::F32(s), PixelComponents::Alpha) => {
            let quantised: Vec<u16> = flip_rows(s, row_len)
                .into_iter()
                .map(|v| (v.clamp(0.0, 1.0) * 65535.0).round() as u16)
                .collect();
            DynamicImage::ImageLuma16(
                image::ImageBuffer::from_raw(w, h, quantised).ok_or_else(invalid)?,
            )
        }
    };
    Ok(img)
}

fn is_float(img: &DynamicImage) -> bool {
    matches!(
        img,
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_)
    )
}

fn convert_for_format(img: DynamicImage, ext: &str) -> DynamicImage {
    match ext {
        "exr" => DynamicImage::ImageRgba32F(img.to_rgba32f()),
        "hdr" => DynamicImage::ImageRgb32F(img.to_rgb32f()),
        "png" | "tif" | "tiff" if is_float(&img) => DynamicImage::ImageRgba16(img.to_rgba16()),
        "png" | "tif" | "tiff" => img,
        "jpg" | "jpeg" | "pbm" | "pgm" | "ppm" | "pnm" => DynamicImage::ImageRgb8(img.to_rgb8()),
        _ => DynamicImage::ImageRgba8(img.to_rgba8()),
    }
}
