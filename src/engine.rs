//! Verification orchestrator.
//!
//! Drives one call end to end: decode → four independent signal checks →
//! score aggregation. The checks have no data dependency on each other and
//! run concurrently; the aggregator joins all of them before a result is
//! assembled, so a cancelled call can never surface partial results.
//!
//! `verify` always returns a `VerificationResult`. Fatal input problems
//! (oversized upload, non-image MIME, corrupt stream) become a failed result
//! with confidence 0 and a single explanatory warning — never a panic or an
//! error the caller has to unwrap.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::spawn_blocking;
use tokio::time::timeout;
use tracing::{debug, info_span, warn, Instrument};

use crate::aggregate::{aggregate, AggregationInput};
use crate::capability::{ClassifierCapability, OcrCapability};
use crate::checks::{detect_tampering, extract_features, match_fields, score_integrity};
use crate::config::VerificationConfig;
use crate::image::{decode_certificate_image, ImageBuffer};
use crate::types::{
    CheckResult, ClassProbabilities, ExpectedFields, ImageFeatures, IntegrityDetail,
    MatchDetail, TamperDetail, TextDetail, VerificationResult, VerifyRequest,
};

pub struct VerificationEngine {
    config: Arc<VerificationConfig>,
    ocr: OcrCapability,
    classifier: ClassifierCapability,
}

impl VerificationEngine {
    pub fn new(
        config: VerificationConfig,
        ocr: OcrCapability,
        classifier: ClassifierCapability,
    ) -> Self {
        Self {
            config: Arc::new(config),
            ocr,
            classifier,
        }
    }

    /// Engine with default thresholds and no external capabilities.
    /// Verification runs entirely on the rule-based signals.
    pub fn rules_only(config: VerificationConfig) -> Self {
        Self::new(config, OcrCapability::Unavailable, ClassifierCapability::Unavailable)
    }

    /// Verify one certificate image against its expected field values.
    pub async fn verify(&self, request: VerifyRequest) -> VerificationResult {
        let span = info_span!(
            "verify_certificate",
            file_name = %request.file_name,
            mime_type = %request.mime_type,
            byte_size = request.image_bytes.len(),
        );

        async move {
            let VerifyRequest {
                image_bytes,
                mime_type,
                file_name,
                expected,
            } = request;

            // Decode is CPU-bound on large uploads; keep it off the runtime.
            let max_bytes = self.config.max_input_bytes;
            let decoded = spawn_blocking(move || {
                decode_certificate_image(&image_bytes, &mime_type, max_bytes)
            })
            .await;

            let image = match decoded {
                Ok(Ok(buffer)) => Arc::new(buffer),
                Ok(Err(e)) => {
                    warn!(error = %e, "Verification aborted before scoring");
                    return self.failed_result(e.to_string());
                }
                Err(e) => {
                    warn!(error = %e, "Decode task aborted");
                    return self.failed_result("Image decoding failed: task aborted".to_string());
                }
            };

            let integrity_task = {
                let img = Arc::clone(&image);
                let cfg = Arc::clone(&self.config);
                spawn_blocking(move || score_integrity(&img, &cfg))
            };
            let tampering_task = {
                let img = Arc::clone(&image);
                let cfg = Arc::clone(&self.config);
                spawn_blocking(move || detect_tampering(&img, &file_name, &cfg))
            };
            let features_task = {
                let img = Arc::clone(&image);
                let cfg = Arc::clone(&self.config);
                spawn_blocking(move || extract_features(&img, &cfg))
            };

            let (integrity_res, tampering_res, features_res, text_branch, classifier_branch) = tokio::join!(
                integrity_task,
                tampering_task,
                features_task,
                self.recognize_and_match(&image, &expected),
                self.classify(&image),
            );

            let integrity = integrity_res.unwrap_or_else(|e| {
                warn!(error = %e, "Integrity check task aborted");
                CheckResult::new(
                    false,
                    0.0,
                    IntegrityDetail {
                        width: image.width(),
                        height: image.height(),
                        byte_size: image.byte_size(),
                        variance: 0.0,
                    },
                )
            });
            let tampering = tampering_res.unwrap_or_else(|e| {
                warn!(error = %e, "Tampering check task aborted");
                CheckResult::new(
                    false,
                    0.0,
                    TamperDetail {
                        issues: vec![],
                        ela_variance: 0.0,
                    },
                )
            });
            let features = features_res.unwrap_or_else(|e| {
                warn!(error = %e, "Feature extraction task aborted");
                ImageFeatures::default()
            });
            let (text_extraction, data_matching, mut branch_warnings) = text_branch;
            let (classifier, classifier_warning) = classifier_branch;

            let fused = aggregate(
                AggregationInput {
                    integrity: &integrity,
                    text_extraction: &text_extraction,
                    data_matching: &data_matching,
                    tampering: &tampering,
                    classifier: classifier.as_ref(),
                    ocr_available: self.ocr.is_available(),
                },
                &self.config,
            );

            let mut warnings = fused.warnings;
            warnings.append(&mut branch_warnings);
            if let Some(w) = classifier_warning {
                warnings.push(w);
            }

            debug!(
                is_authentic = fused.is_authentic,
                confidence = fused.confidence,
                warnings = warnings.len(),
                "Verification complete"
            );

            VerificationResult {
                is_authentic: fused.is_authentic,
                confidence: fused.confidence,
                integrity,
                text_extraction,
                data_matching,
                tampering,
                features,
                classifier,
                warnings,
                timestamp: Utc::now(),
            }
            // `image` (the only large allocation) is dropped here, at the
            // end of the call that created it.
        }
        .instrument(span)
        .await
    }

    /// Run the OCR capability (if configured) under its timeout budget, then
    /// match whatever text came back against the expected fields. A timeout
    /// or recognizer error degrades to empty text with a warning; it never
    /// fails the verification.
    async fn recognize_and_match(
        &self,
        image: &Arc<ImageBuffer>,
        expected: &ExpectedFields,
    ) -> (CheckResult<TextDetail>, CheckResult<MatchDetail>, Vec<String>) {
        let ocr_available = self.ocr.is_available();
        let mut warnings = Vec::new();

        let (text, confidence) = match &self.ocr {
            OcrCapability::Unavailable => (String::new(), 0.0),
            OcrCapability::Available(recognizer) => {
                let rec = Arc::clone(recognizer);
                let img = Arc::clone(image);
                let budget = self.config.ocr_timeout;

                match timeout(budget, spawn_blocking(move || rec.recognize(&img))).await {
                    Ok(Ok(Ok(recognized))) => {
                        (recognized.text, recognized.confidence.clamp(0.0, 1.0))
                    }
                    Ok(Ok(Err(e))) => {
                        warn!(error = %e, "Text recognition failed");
                        warnings.push(format!(
                            "Text recognition failed - continuing without extracted text: {e}"
                        ));
                        (String::new(), 0.0)
                    }
                    Ok(Err(e)) => {
                        warn!(error = %e, "Text recognition task aborted");
                        warnings.push(
                            "Text recognition aborted - continuing without extracted text"
                                .to_string(),
                        );
                        (String::new(), 0.0)
                    }
                    Err(_) => {
                        warn!(budget_secs = budget.as_secs(), "Text recognition timed out");
                        warnings.push(format!(
                            "Text recognition timed out after {}s - continuing without extracted text",
                            budget.as_secs()
                        ));
                        (String::new(), 0.0)
                    }
                }
            }
        };

        let text_extraction = CheckResult::new(
            confidence > self.config.ocr_confidence_cutoff,
            confidence,
            TextDetail {
                text: text.clone(),
                ocr_available,
            },
        );
        let data_matching = match_fields(&text, expected, &self.config);

        (text_extraction, data_matching, warnings)
    }

    /// Run the classifier capability under its timeout budget. Absence is a
    /// supported state (the component is skipped, not failed); an error or
    /// timeout on a configured classifier is recorded as a warning.
    async fn classify(
        &self,
        image: &Arc<ImageBuffer>,
    ) -> (Option<ClassProbabilities>, Option<String>) {
        match &self.classifier {
            ClassifierCapability::Unavailable => {
                debug!("No classifier capability configured - skipping");
                (None, None)
            }
            ClassifierCapability::Available(classifier) => {
                let cls = Arc::clone(classifier);
                let img = Arc::clone(image);
                let budget = self.config.classifier_timeout;

                match timeout(budget, spawn_blocking(move || cls.predict(&img))).await {
                    Ok(Ok(Ok(probs))) => (Some(probs), None),
                    Ok(Ok(Err(e))) => {
                        warn!(error = %e, "Classifier inference failed");
                        (
                            None,
                            Some(format!(
                                "Classifier unavailable for this image - rule-based signals only: {e}"
                            )),
                        )
                    }
                    Ok(Err(e)) => {
                        warn!(error = %e, "Classifier task aborted");
                        (
                            None,
                            Some("Classifier aborted - rule-based signals only".to_string()),
                        )
                    }
                    Err(_) => {
                        warn!(budget_secs = budget.as_secs(), "Classifier timed out");
                        (
                            None,
                            Some(format!(
                                "Classifier inference timed out after {}s - rule-based signals only",
                                budget.as_secs()
                            )),
                        )
                    }
                }
            }
        }
    }

    /// Result for a verification aborted before any scoring ran.
    fn failed_result(&self, warning: String) -> VerificationResult {
        VerificationResult {
            is_authentic: false,
            confidence: 0.0,
            integrity: CheckResult::new(
                false,
                0.0,
                IntegrityDetail {
                    width: 0,
                    height: 0,
                    byte_size: 0,
                    variance: 0.0,
                },
            ),
            text_extraction: CheckResult::new(
                false,
                0.0,
                TextDetail {
                    text: String::new(),
                    ocr_available: self.ocr.is_available(),
                },
            ),
            data_matching: CheckResult::new(false, 0.0, MatchDetail { differences: vec![] }),
            tampering: CheckResult::new(
                false,
                0.0,
                TamperDetail {
                    issues: vec![],
                    ela_variance: 0.0,
                },
            ),
            features: ImageFeatures::default(),
            classifier: None,
            warnings: vec![warning],
            timestamp: Utc::now(),
        }
    }
}
