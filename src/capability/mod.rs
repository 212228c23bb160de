//! Optional external capabilities: text recognition and the trained forgery
//! classifier.
//!
//! Each capability has exactly two states, selected once at engine
//! construction: `Available(handle)` or `Unavailable`. Scoring code never
//! probes for existence at runtime — it matches on the capability and
//! follows the degraded path when it is absent.

#[cfg(feature = "onnx-classifier")]
pub mod onnx;

use std::sync::Arc;

use thiserror::Error;

use crate::image::ImageBuffer;
use crate::types::ClassProbabilities;

// ---------------------------------------------------------------------------
// Text recognition
// ---------------------------------------------------------------------------

/// Text recovered from an image by an OCR engine.
#[derive(Debug, Clone)]
pub struct RecognizedText {
    pub text: String,
    /// Engine-reported confidence in [0, 1].
    pub confidence: f32,
}

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Text recognition failed: {0}")]
    Recognition(String),
}

/// External OCR engine. Implementations may block; the engine runs them on
/// the blocking pool under a timeout budget.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &ImageBuffer) -> Result<RecognizedText, OcrError>;
}

/// Text-recognition capability, fixed at engine construction.
#[derive(Clone)]
pub enum OcrCapability {
    Available(Arc<dyn TextRecognizer>),
    Unavailable,
}

impl OcrCapability {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

// ---------------------------------------------------------------------------
// Forgery classifier
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Model artifact not found: {0}")]
    ModelNotFound(std::path::PathBuf),

    #[error("Classifier initialization failed: {0}")]
    ModelInit(String),

    #[error("Classifier inference failed: {0}")]
    Inference(String),
}

/// Trained classifier producing class probabilities for
/// authentic/forged/tampered/screenshot.
pub trait ForgeryClassifier: Send + Sync {
    fn predict(&self, image: &ImageBuffer) -> Result<ClassProbabilities, ClassifierError>;
}

/// Classifier capability, fixed at engine construction. When absent, the
/// classifier branch is skipped entirely and excluded from aggregation.
#[derive(Clone)]
pub enum ClassifierCapability {
    Available(Arc<dyn ForgeryClassifier>),
    Unavailable,
}

impl ClassifierCapability {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

// ---------------------------------------------------------------------------
// Canned implementations (tests and wiring)
// ---------------------------------------------------------------------------

/// Recognizer returning a fixed canned response. Keeps engine tests
/// deterministic and lets hosts stub OCR in integration environments.
pub struct FixedRecognizer {
    text: String,
    confidence: f32,
}

impl FixedRecognizer {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

impl TextRecognizer for FixedRecognizer {
    fn recognize(&self, _image: &ImageBuffer) -> Result<RecognizedText, OcrError> {
        Ok(RecognizedText {
            text: self.text.clone(),
            confidence: self.confidence,
        })
    }
}

/// Recognizer that always fails. Exercises the best-effort OCR error path.
pub struct FailingRecognizer;

impl TextRecognizer for FailingRecognizer {
    fn recognize(&self, _image: &ImageBuffer) -> Result<RecognizedText, OcrError> {
        Err(OcrError::Recognition("canned failure".to_string()))
    }
}

/// Classifier returning fixed probabilities.
pub struct FixedClassifier {
    probabilities: ClassProbabilities,
}

impl FixedClassifier {
    pub fn new(probabilities: ClassProbabilities) -> Self {
        Self { probabilities }
    }
}

impl ForgeryClassifier for FixedClassifier {
    fn predict(&self, _image: &ImageBuffer) -> Result<ClassProbabilities, ClassifierError> {
        Ok(self.probabilities)
    }
}
