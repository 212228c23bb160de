//! Structural quality scoring: resolution, file-size plausibility, and
//! pixel-content variance.

use tracing::debug;

use crate::config::VerificationConfig;
use crate::image::stats::luminance_variance;
use crate::image::ImageBuffer;
use crate::types::{CheckResult, IntegrityDetail};

/// Score the decoded buffer on three independent sub-checks, each worth a
/// fixed weight of the composite. Failing a sub-check drops the composite by
/// exactly that weight, never more.
pub fn score_integrity(
    image: &ImageBuffer,
    config: &VerificationConfig,
) -> CheckResult<IntegrityDetail> {
    let width = image.width();
    let height = image.height();
    let byte_size = image.byte_size();

    let good_resolution = width >= config.min_resolution && height >= config.min_resolution;
    let plausible_size =
        byte_size > config.min_plausible_bytes && byte_size < config.max_plausible_bytes;

    let variance = luminance_variance(image.pixels());
    let has_content = variance > config.variance_threshold;

    let score = if good_resolution { config.resolution_weight } else { 0.0 }
        + if plausible_size { config.size_weight } else { 0.0 }
        + if has_content { config.variance_weight } else { 0.0 };

    debug!(
        width,
        height,
        byte_size,
        variance,
        score,
        "Integrity scored"
    );

    CheckResult::new(
        score > config.integrity_pass_cutoff,
        score,
        IntegrityDetail {
            width,
            height,
            byte_size,
            variance,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    /// Buffer with controllable dimensions, claimed byte size, and content.
    fn buffer(width: u32, height: u32, byte_size: usize, noisy: bool) -> ImageBuffer {
        let img = if noisy {
            RgbaImage::from_fn(width, height, |x, y| {
                if (x + y) % 2 == 0 {
                    Rgba([0, 0, 0, 255])
                } else {
                    Rgba([255, 255, 255, 255])
                }
            })
        } else {
            RgbaImage::from_pixel(width, height, Rgba([128, 128, 128, 255]))
        };
        ImageBuffer::for_tests(img, byte_size, "image/png")
    }

    #[test]
    fn all_sub_checks_pass() {
        let cfg = VerificationConfig::default();
        let result = score_integrity(&buffer(900, 900, 500 * 1024, true), &cfg);
        assert!(result.passed);
        assert!((result.score - 1.0).abs() < 1e-6);
        assert!(result.detail.variance > 100.0);
    }

    #[test]
    fn low_resolution_drops_exactly_resolution_weight() {
        let cfg = VerificationConfig::default();
        let result = score_integrity(&buffer(200, 150, 500 * 1024, true), &cfg);
        assert!(!result.passed);
        assert!((result.score - 0.6).abs() < 1e-6);
    }

    #[test]
    fn tiny_file_drops_exactly_size_weight() {
        let cfg = VerificationConfig::default();
        let result = score_integrity(&buffer(900, 900, 10 * 1024, true), &cfg);
        assert!(!result.passed);
        assert!((result.score - 0.7).abs() < 1e-6);
    }

    #[test]
    fn solid_color_drops_exactly_variance_weight() {
        let cfg = VerificationConfig::default();
        let result = score_integrity(&buffer(900, 900, 500 * 1024, false), &cfg);
        assert!(!result.passed);
        assert!((result.score - 0.7).abs() < 1e-6);
        assert_eq!(result.detail.variance, 0.0);
    }

    #[test]
    fn size_bounds_are_strict() {
        let cfg = VerificationConfig::default();
        // Exactly 50 KiB is not strictly greater than the floor.
        let result = score_integrity(&buffer(900, 900, 50 * 1024, true), &cfg);
        assert!((result.score - 0.7).abs() < 1e-6);
    }
}
