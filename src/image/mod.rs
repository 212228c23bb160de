pub mod decoder;
pub mod stats;

pub use decoder::{decode_certificate_image, ImageBuffer};

use thiserror::Error;

/// Fatal input errors. Any of these aborts the verification before scoring;
/// the engine folds them into a failed result with a single warning rather
/// than propagating them to the caller.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Image exceeds the {limit_bytes} byte input limit ({actual_bytes} bytes)")]
    InputTooLarge {
        actual_bytes: usize,
        limit_bytes: usize,
    },

    #[error("Unsupported MIME type for verification: {0}")]
    UnsupportedType(String),

    #[error("Image decoding failed: {0}")]
    DecodeFailed(String),
}
