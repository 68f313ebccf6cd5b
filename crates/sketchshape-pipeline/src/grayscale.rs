//! Image decoding and intensity normalization.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces a
//! single-channel [`IntensityImage`] with values in `[0, 1]`, the
//! input of contour tracing.
//!
//! Color images are reduced with the ITU-R BT.709 luma weights
//! (`0.2125 R + 0.7154 G + 0.0721 B`); neutral pixels keep their level
//! exactly. Transparent pixels are composited over white first, so an
//! empty canvas reads as background.
//!
//! Integer samples are scaled in `f64` (`v / 255` or `v / 65535`), so a
//! byte of 204 is exactly `0.8`.

use image::{DynamicImage, Luma};

use crate::types::IntensityImage;

/// Red, green and blue luma weights.
const LUMA_WEIGHTS: [f64; 3] = [0.2125, 0.7154, 0.0721];

/// Bytes that cannot be used as a classification raster.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    /// No bytes supplied.
    #[error("input image data is empty")]
    EmptyInput,

    /// The bytes are not a decodable image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),
}

/// Decode raw image bytes into a normalized intensity field.
///
/// # Errors
///
/// Returns [`ClassifyError::EmptyInput`] if `bytes` is empty.
/// Returns [`ClassifyError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode_and_normalize(bytes: &[u8]) -> Result<IntensityImage, ClassifyError> {
    if bytes.is_empty() {
        return Err(ClassifyError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(normalize(&img))
}

/// Reduce any decoded image to a `[0, 1]` intensity field.
#[must_use = "returns the intensity field"]
pub fn normalize(img: &DynamicImage) -> IntensityImage {
    match img {
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            let rgba = img.to_rgba32f();
            IntensityImage::from_fn(rgba.width(), rgba.height(), |x, y| {
                intensity(rgba.get_pixel(x, y).0.map(f64::from))
            })
        }
        DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_) => {
            let rgba = img.to_rgba16();
            let full = f64::from(u16::MAX);
            IntensityImage::from_fn(rgba.width(), rgba.height(), |x, y| {
                intensity(rgba.get_pixel(x, y).0.map(|c| f64::from(c) / full))
            })
        }
        _ => {
            let rgba = img.to_rgba8();
            let full = f64::from(u8::MAX);
            IntensityImage::from_fn(rgba.width(), rgba.height(), |x, y| {
                intensity(rgba.get_pixel(x, y).0.map(|c| f64::from(c) / full))
            })
        }
    }
}

/// Intensity of one straight-alpha RGBA sample already scaled to `[0, 1]`.
#[allow(clippy::float_cmp)]
fn intensity([r, g, b, a]: [f64; 4]) -> Luma<f64> {
    let value = if r == g && g == b {
        r
    } else {
        LUMA_WEIGHTS[0].mul_add(r, LUMA_WEIGHTS[1].mul_add(g, LUMA_WEIGHTS[2] * b))
    };
    Luma([over_white(value, a).clamp(0.0, 1.0)])
}

/// Composite a straight-alpha intensity over a white background.
fn over_white(value: f64, alpha: f64) -> f64 {
    alpha.mul_add(value, 1.0 - alpha)
}
