//! Fuses the four check signals into one confidence value and the final
//! authenticity decision.
//!
//! Two weighting regimes exist, selected by whether a text-recognition
//! capability is configured — not by whether this particular image produced
//! text. Without OCR the authenticity threshold drops as well, since one
//! corroborating signal is structurally missing.

use tracing::debug;

use crate::config::{ScoreWeights, VerificationConfig};
use crate::types::{
    CheckResult, ClassProbabilities, IntegrityDetail, MatchDetail, TamperDetail, TextDetail,
};

/// Borrowed view over everything the aggregator needs from one call.
pub struct AggregationInput<'a> {
    pub integrity: &'a CheckResult<IntegrityDetail>,
    pub text_extraction: &'a CheckResult<TextDetail>,
    pub data_matching: &'a CheckResult<MatchDetail>,
    pub tampering: &'a CheckResult<TamperDetail>,
    pub classifier: Option<&'a ClassProbabilities>,
    /// Whether a text-recognition capability is configured at all.
    pub ocr_available: bool,
}

/// Fused verdict plus the warnings explaining every failed predicate.
#[derive(Debug)]
pub struct Aggregation {
    pub confidence: f32,
    pub is_authentic: bool,
    pub warnings: Vec<String>,
}

pub fn aggregate(input: AggregationInput<'_>, config: &VerificationConfig) -> Aggregation {
    let ocr_confidence = input.text_extraction.score;

    let weights = if input.ocr_available {
        ScoreWeights::with_ocr()
    } else {
        ScoreWeights::without_ocr()
    };

    let rule_confidence = weights.integrity * input.integrity.score
        + weights.ocr * ocr_confidence
        + weights.matching * input.data_matching.score
        + weights.tampering * input.tampering.score;

    // A trained classifier, when present, dominates the blend: its signal is
    // (1 - forged probability), combined with the rule-based confidence.
    let confidence = match input.classifier {
        Some(probs) => {
            let classifier_signal = 1.0 - probs.forged;
            config.rule_blend_weight * rule_confidence
                + config.classifier_blend_weight * classifier_signal
        }
        None => rule_confidence,
    }
    .clamp(0.0, 1.0);

    let threshold = if input.ocr_available {
        config.threshold_with_ocr
    } else {
        config.threshold_without_ocr
    };

    let ocr_ok = !input.ocr_available || ocr_confidence > config.ocr_confidence_cutoff;
    let is_authentic = input.integrity.passed
        && ocr_ok
        && input.data_matching.passed
        && input.tampering.passed
        && confidence > threshold;

    let mut warnings = Vec::new();
    if !input.integrity.passed {
        warnings.push(
            "Image integrity check failed - possible corruption or manipulation".to_string(),
        );
    }
    if !input.ocr_available {
        warnings.push(
            "Text recognition not available - verification used degraded weighting"
                .to_string(),
        );
    } else if ocr_confidence < config.ocr_confidence_cutoff {
        warnings.push("Low OCR confidence - text may be unclear or modified".to_string());
    }
    if !input.data_matching.passed {
        warnings.push("Extracted data does not match expected certificate records".to_string());
    }
    if !input.tampering.passed {
        warnings.push("Possible tampering detected in image".to_string());
    }

    debug!(
        rule_confidence,
        confidence,
        threshold,
        is_authentic,
        "Signals aggregated"
    );

    Aggregation {
        confidence,
        is_authentic,
        warnings,
    }
}
