//! Input and result types for a verification call.
//!
//! Everything in `VerificationResult` is plain scalar/record/sequence data
//! and serializes to JSON unchanged, so callers can persist or transmit the
//! result directly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Ground-truth field values the certificate image is expected to carry.
/// Supplied by the caller (typically read back from the issuance record);
/// never derived by this engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpectedFields {
    pub certificate_id: String,
    pub holder_name: String,
    pub course_name: String,
    pub institution: String,
    pub issue_date: NaiveDate,
}

/// One verification request: the uploaded image plus its expected contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub image_bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
    pub expected: ExpectedFields,
}

/// Outcome of a single checker. Built once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckResult<T> {
    pub passed: bool,
    /// Always clamped to [0, 1].
    pub score: f32,
    pub detail: T,
}

impl<T> CheckResult<T> {
    pub fn new(passed: bool, score: f32, detail: T) -> Self {
        Self {
            passed,
            score: score.clamp(0.0, 1.0),
            detail,
        }
    }
}

/// Diagnostics behind the integrity score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntegrityDetail {
    pub width: u32,
    pub height: u32,
    pub byte_size: usize,
    pub variance: f64,
}

/// Text recovered from the image, if a recognizer ran.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextDetail {
    pub text: String,
    /// Whether a text-recognition capability was configured for this call.
    /// False means the empty text is a degraded placeholder, not a finding.
    pub ocr_available: bool,
}

/// Human-readable descriptions of each expected field the OCR text missed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchDetail {
    pub differences: Vec<String>,
}

/// Issues found by the tampering heuristics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TamperDetail {
    pub issues: Vec<String>,
    /// Variance of block-sampled local variances. High values mean
    /// statistically distinct neighborhoods (localized edits).
    pub ela_variance: f64,
}

/// Model-free numeric features of the image, computed on every call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageFeatures {
    /// Normalized mean gradient magnitude over edge pixels.
    pub edge_consistency: f32,
    /// Fraction of high-contrast pixels (text-likeliness proxy).
    pub text_quality: f32,
    /// Closeness of the aspect ratio to a canonical document ratio.
    pub layout_score: f32,
    /// Coarse indicator of fixed-stride compression discontinuities.
    pub compression_artifacts: f32,
}

/// Class probabilities from a trained forgery classifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ClassProbabilities {
    pub authentic: f32,
    pub forged: f32,
    pub tampered: f32,
    pub screenshot: f32,
}

impl ClassProbabilities {
    /// Top class probability, reported as the classifier's confidence.
    pub fn confidence(&self) -> f32 {
        self.authentic
            .max(self.forged)
            .max(self.tampered)
            .max(self.screenshot)
    }
}

/// Final verdict of one verification call. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationResult {
    pub is_authentic: bool,
    /// Fused confidence in [0, 1].
    pub confidence: f32,
    pub integrity: CheckResult<IntegrityDetail>,
    pub text_extraction: CheckResult<TextDetail>,
    pub data_matching: CheckResult<MatchDetail>,
    pub tampering: CheckResult<TamperDetail>,
    pub features: ImageFeatures,
    /// Present only when a trained classifier capability produced a result.
    pub classifier: Option<ClassProbabilities>,
    /// Ordered explanations for every failed or degraded signal.
    pub warnings: Vec<String>,
    pub timestamp: DateTime<Utc>,
}
