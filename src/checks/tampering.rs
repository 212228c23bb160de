//! Tampering heuristics: file-level metadata checks plus a block-sampled
//! error-level analysis over the pixel buffer.
//!
//! Genuine photographs and renders of certificates exhibit fairly uniform
//! local-variance statistics. Localized edits — pasted text, overlaid
//! signatures — introduce neighborhoods with statistically distinct noise,
//! which the variance-of-variances surfaces without a trained model.

use image::RgbaImage;
use tracing::debug;

use crate::config::VerificationConfig;
use crate::image::stats::{local_variance_3x3, variance_of};
use crate::image::ImageBuffer;
use crate::types::{CheckResult, TamperDetail};

/// Apply three independent penalties against a baseline score of 1.0
/// (floored at 0). Each applied penalty appends an explanatory issue.
pub fn detect_tampering(
    image: &ImageBuffer,
    file_name: &str,
    config: &VerificationConfig,
) -> CheckResult<TamperDetail> {
    let mut issues = Vec::new();
    let mut score = 1.0f32;

    let mime = image.mime_type();
    if !config.accepted_mime_types.iter().any(|m| m == mime) {
        issues.push("Unusual file type detected".to_string());
        score -= config.mime_penalty;
    }

    let name_lower = file_name.to_lowercase();
    if config
        .filename_denylist
        .iter()
        .any(|pattern| name_lower.contains(pattern))
    {
        issues.push("Suspicious file name pattern".to_string());
        score -= config.filename_penalty;
    }

    let ela_variance = block_sampled_ela(image.pixels(), config.ela_stride);
    if ela_variance > config.ela_variance_threshold {
        issues.push(
            "Inconsistent compression levels detected (possible editing)".to_string(),
        );
        score -= config.ela_penalty;
    }

    debug!(ela_variance, score, issues = issues.len(), "Tampering scored");

    CheckResult::new(
        score > config.tamper_pass_cutoff,
        score.max(0.0),
        TamperDetail {
            issues,
            ela_variance,
        },
    )
}

/// Variance of local 3x3 luminance variances sampled on a uniform grid.
///
/// Sample points start one stride in from each edge, so the 3x3 window never
/// clips and the margin is excluded. Images too small to yield any sample
/// point return 0 — no signal, no penalty.
fn block_sampled_ela(img: &RgbaImage, stride: u32) -> f64 {
    let (w, h) = (img.width(), img.height());
    if stride == 0 || w <= 2 * stride || h <= 2 * stride {
        return 0.0;
    }

    let mut local_variances = Vec::new();
    let mut y = stride;
    while y < h - stride {
        let mut x = stride;
        while x < w - stride {
            local_variances.push(local_variance_3x3(img, x, y));
            x += stride;
        }
        y += stride;
    }

    variance_of(&local_variances)
}
