//! Model-free numeric image features.
//!
//! These four scalars feed diagnostics and, when a trained classifier is
//! configured, accompany its prediction. They are computed on every call —
//! they do not depend on any model artifact.

use image::RgbaImage;
use tracing::debug;

use crate::config::VerificationConfig;
use crate::image::stats::luminance;
use crate::image::ImageBuffer;
use crate::types::ImageFeatures;

/// Pixel stride for the compression-artifact scan (one JPEG block).
const ARTIFACT_BLOCK_PX: usize = 8;

/// Channel difference that counts as a block-boundary discontinuity.
const ARTIFACT_DIFF_THRESHOLD: i16 = 20;

/// Discontinuity count at which the artifact indicator saturates at 1.0.
const ARTIFACT_SATURATION: f32 = 1000.0;

pub fn extract_features(image: &ImageBuffer, config: &VerificationConfig) -> ImageFeatures {
    let pixels = image.pixels();

    let features = ImageFeatures {
        edge_consistency: edge_consistency(pixels, config.edge_strength_threshold),
        text_quality: text_quality(pixels, config.contrast_low, config.contrast_high),
        layout_score: layout_score(
            image.width(),
            image.height(),
            &config.canonical_aspect_ratios,
        ),
        compression_artifacts: compression_artifacts(pixels),
    };

    debug!(?features, "Image features extracted");
    features
}

/// Mean Sobel gradient magnitude over pixels whose magnitude exceeds the
/// strength threshold, normalized to [0, 1]. Operates on the red channel.
fn edge_consistency(img: &RgbaImage, strength_threshold: f64) -> f32 {
    let (w, h) = (img.width() as i64, img.height() as i64);
    if w < 3 || h < 3 {
        return 0.0;
    }

    let red = |x: i64, y: i64| img.get_pixel(x as u32, y as u32).0[0] as f64;

    let mut total_strength = 0.0f64;
    let mut edge_count = 0u64;

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let gx = -red(x - 1, y - 1) + red(x + 1, y - 1) - 2.0 * red(x - 1, y)
                + 2.0 * red(x + 1, y)
                - red(x - 1, y + 1)
                + red(x + 1, y + 1);
            let gy = -red(x - 1, y - 1) - 2.0 * red(x, y - 1) - red(x + 1, y - 1)
                + red(x - 1, y + 1)
                + 2.0 * red(x, y + 1)
                + red(x + 1, y + 1);

            let magnitude = (gx * gx + gy * gy).sqrt();
            if magnitude > strength_threshold {
                total_strength += magnitude;
                edge_count += 1;
            }
        }
    }

    if edge_count == 0 {
        return 0.0;
    }
    ((total_strength / edge_count as f64) / 255.0).min(1.0) as f32
}

/// Fraction of pixels whose luminance sits in the high-contrast bands —
/// printed text is mostly near-black glyphs on a near-white ground.
fn text_quality(img: &RgbaImage, low: u8, high: u8) -> f32 {
    let total = (img.width() as u64) * (img.height() as u64);
    if total == 0 {
        return 0.0;
    }

    let high_contrast = img
        .pixels()
        .filter(|p| {
            let lum = luminance(*p);
            lum < low as f64 || lum > high as f64
        })
        .count();

    high_contrast as f32 / total as f32
}

/// Closeness of the aspect ratio to the nearest canonical document ratio.
fn layout_score(width: u32, height: u32, canonical_ratios: &[f32]) -> f32 {
    if height == 0 || canonical_ratios.is_empty() {
        return 0.0;
    }

    let aspect = width as f32 / height as f32;
    let deviation = canonical_ratios
        .iter()
        .map(|r| (r - aspect).abs())
        .fold(f32::INFINITY, f32::min);

    (1.0 - deviation).max(0.0)
}

/// Coarse compression-artifact indicator: counts red-channel discontinuities
/// at one-block stride through the raw sample buffer, saturating at 1.0.
fn compression_artifacts(img: &RgbaImage) -> f32 {
    let raw = img.as_raw();
    let stride = 4 * ARTIFACT_BLOCK_PX;

    let mut discontinuities = 0u32;
    let mut i = 0usize;
    while i + stride < raw.len() {
        let diff = (raw[i] as i16 - raw[i + stride] as i16).abs();
        if diff > ARTIFACT_DIFF_THRESHOLD {
            discontinuities += 1;
        }
        i += stride;
    }

    (discontinuities as f32 / ARTIFACT_SATURATION).min(1.0)
}
