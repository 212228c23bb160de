//! Visual authenticity-verification engine for certificate images.
//!
//! Given an uploaded certificate image and the field values it is expected to
//! carry, the engine decides whether the image is likely authentic, forged,
//! or tampered. Four independent signal checks run concurrently over one
//! decoded pixel buffer:
//!
//! - structural integrity (resolution, file size, pixel variance)
//! - text recognition + fuzzy field matching against expected values
//! - tampering heuristics (MIME/file-name checks + block-sampled
//!   error-level analysis)
//! - numeric image features + optional trained forgery classifier
//!
//! A score aggregator fuses the signals into one confidence value in [0, 1]
//! and a final authenticity decision. The OCR engine and the classifier are
//! optional capabilities: when absent, the engine degrades to an adjusted
//! weighting regime instead of failing, and records a warning.
//!
//! The engine performs no network, filesystem, or persistence I/O. Fetching
//! the image bytes and storing the result are the caller's responsibility.

pub mod aggregate;
pub mod capability;
pub mod checks;
pub mod config;
pub mod engine;
pub mod image;
pub mod types;

pub use capability::{ClassifierCapability, ForgeryClassifier, OcrCapability, TextRecognizer};
pub use config::VerificationConfig;
pub use engine::VerificationEngine;
pub use types::{ExpectedFields, VerificationResult, VerifyRequest};
