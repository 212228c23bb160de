//! Verification thresholds and weights.
//!
//! Every cutoff in this engine is an empirically tuned constant carried over
//! from the original scoring rules. They are kept as named, overridable
//! fields rather than re-derived: construct a `VerificationConfig` with
//! `Default::default()` and adjust individual fields where a deployment
//! needs different tuning.

use std::time::Duration;

/// Relative weights for fusing the four check scores into one confidence.
#[derive(Debug, Clone, Copy)]
pub struct ScoreWeights {
    pub integrity: f32,
    pub ocr: f32,
    pub matching: f32,
    pub tampering: f32,
}

impl ScoreWeights {
    /// Weights used when a text-recognition capability is configured.
    pub fn with_ocr() -> Self {
        Self {
            integrity: 0.2,
            ocr: 0.3,
            matching: 0.3,
            tampering: 0.2,
        }
    }

    /// Weights used when no text-recognition capability is configured.
    /// The OCR share is redistributed to matching and the pixel checks.
    pub fn without_ocr() -> Self {
        Self {
            integrity: 0.3,
            ocr: 0.0,
            matching: 0.4,
            tampering: 0.3,
        }
    }
}

/// All tunable thresholds for a verification run.
#[derive(Debug, Clone)]
pub struct VerificationConfig {
    /// Hard input cap — larger uploads are rejected before decoding.
    pub max_input_bytes: usize,

    // ── Integrity ──
    /// Both dimensions must reach this many pixels for the resolution sub-score.
    pub min_resolution: u32,
    /// File-size plausibility window (exclusive bounds). Files below the
    /// floor are over-compressed/suspicious; above the ceiling atypical.
    pub min_plausible_bytes: usize,
    pub max_plausible_bytes: usize,
    /// Population variance of per-pixel luminance below this means a
    /// near-blank or solid-color image.
    pub variance_threshold: f64,
    pub resolution_weight: f32,
    pub size_weight: f32,
    pub variance_weight: f32,
    /// Composite integrity score must exceed this to pass.
    pub integrity_pass_cutoff: f32,

    // ── Field matching ──
    /// Fraction of holder-name tokens that must appear in the OCR text.
    pub name_token_ratio: f32,
    /// Fraction for course/institution tokens (long tokens only, see
    /// `long_token_min_len`).
    pub long_token_ratio: f32,
    /// Tokens must be strictly longer than this to count for course and
    /// institution matching. Filters articles and prepositions.
    pub long_token_min_len: usize,
    /// Match score at or above this passes the data-matching check.
    pub match_pass_cutoff: f32,

    // ── Tampering ──
    /// Declared MIME types that do not incur the unusual-type penalty.
    pub accepted_mime_types: Vec<String>,
    /// Case-insensitive substrings in the file name that suggest an edited
    /// or re-scanned file.
    pub filename_denylist: Vec<String>,
    pub mime_penalty: f32,
    pub filename_penalty: f32,
    pub ela_penalty: f32,
    /// Grid stride (pixels) for error-level-analysis sampling.
    pub ela_stride: u32,
    /// Variance-of-local-variances above this flags inconsistent compression.
    pub ela_variance_threshold: f64,
    /// Remaining tampering score must exceed this to pass.
    pub tamper_pass_cutoff: f32,

    // ── Features ──
    /// Gradient magnitude a pixel must exceed to count as an edge.
    pub edge_strength_threshold: f64,
    /// Luminance bounds for the high-contrast (text-likeliness) fraction.
    pub contrast_low: u8,
    pub contrast_high: u8,
    /// Canonical document aspect ratios (A-series portrait/landscape, letter).
    pub canonical_aspect_ratios: Vec<f32>,

    // ── Aggregation ──
    /// OCR confidence must exceed this for the text-extraction check to pass.
    pub ocr_confidence_cutoff: f32,
    /// Overall confidence must exceed these for an authentic verdict.
    pub threshold_with_ocr: f32,
    pub threshold_without_ocr: f32,
    /// Blend between the rule-based confidence and the classifier signal
    /// when a trained classifier is present.
    pub rule_blend_weight: f32,
    pub classifier_blend_weight: f32,

    // ── Capability budgets ──
    /// After this long, an OCR call degrades to "unavailable" for the
    /// current verification instead of failing it.
    pub ocr_timeout: Duration,
    pub classifier_timeout: Duration,
    /// Square input size the trained classifier expects.
    pub classifier_input_size: u32,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: 10 * 1024 * 1024,

            min_resolution: 800,
            min_plausible_bytes: 50 * 1024,
            max_plausible_bytes: 10 * 1024 * 1024,
            variance_threshold: 100.0,
            resolution_weight: 0.4,
            size_weight: 0.3,
            variance_weight: 0.3,
            integrity_pass_cutoff: 0.7,

            name_token_ratio: 0.7,
            long_token_ratio: 0.6,
            long_token_min_len: 3,
            match_pass_cutoff: 0.6,

            accepted_mime_types: vec![
                "image/jpeg".to_string(),
                "image/jpg".to_string(),
                "image/png".to_string(),
            ],
            filename_denylist: vec![
                "edited".to_string(),
                "modified".to_string(),
                "fake".to_string(),
                "copy".to_string(),
                "scan_".to_string(),
            ],
            mime_penalty: 0.3,
            filename_penalty: 0.2,
            ela_penalty: 0.4,
            ela_stride: 50,
            ela_variance_threshold: 5000.0,
            tamper_pass_cutoff: 0.6,

            edge_strength_threshold: 50.0,
            contrast_low: 50,
            contrast_high: 200,
            canonical_aspect_ratios: vec![1.414, 1.5, 1.6, 0.707],

            ocr_confidence_cutoff: 0.7,
            threshold_with_ocr: 0.75,
            threshold_without_ocr: 0.6,
            rule_blend_weight: 0.4,
            classifier_blend_weight: 0.6,

            ocr_timeout: Duration::from_secs(30),
            classifier_timeout: Duration::from_secs(30),
            classifier_input_size: 224,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrity_weights_sum_to_one() {
        let cfg = VerificationConfig::default();
        let sum = cfg.resolution_weight + cfg.size_weight + cfg.variance_weight;
        assert!((sum - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn score_weights_sum_to_one() {
        for w in [ScoreWeights::with_ocr(), ScoreWeights::without_ocr()] {
            let sum = w.integrity + w.ocr + w.matching + w.tampering;
            assert!((sum - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn blend_weights_sum_to_one() {
        let cfg = VerificationConfig::default();
        assert!((cfg.rule_blend_weight + cfg.classifier_blend_weight - 1.0).abs() < 1e-6);
    }
}
