//! Decodes uploaded bytes into the fixed-format pixel buffer every checker
//! reads from.

use image::RgbaImage;
use tracing::debug;

use super::DecodeError;

/// Decoded certificate image. Created once per verification call, shared
/// read-only with the checkers, and dropped when the call completes — no
/// buffer outlives a single verification.
#[derive(Debug)]
pub struct ImageBuffer {
    pixels: RgbaImage,
    byte_size: usize,
    mime_type: String,
}

impl ImageBuffer {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Size of the original encoded file, not of the pixel buffer.
    pub fn byte_size(&self) -> usize {
        self.byte_size
    }

    /// MIME type as declared by the uploader. Not verified against content.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Build a buffer directly from pixels, bypassing the decode path.
    /// Lets checker tests control dimensions and claimed byte size exactly.
    #[cfg(test)]
    pub(crate) fn for_tests(pixels: RgbaImage, byte_size: usize, mime_type: &str) -> Self {
        Self {
            pixels,
            byte_size,
            mime_type: mime_type.to_string(),
        }
    }
}

/// Decode raw upload bytes into an RGBA buffer.
///
/// Rejects oversized input before touching the decoder and non-image MIME
/// types before wasting a decode attempt. A corrupt stream is a fatal
/// `DecodeFailed`.
pub fn decode_certificate_image(
    bytes: &[u8],
    mime_type: &str,
    max_input_bytes: usize,
) -> Result<ImageBuffer, DecodeError> {
    if bytes.len() > max_input_bytes {
        return Err(DecodeError::InputTooLarge {
            actual_bytes: bytes.len(),
            limit_bytes: max_input_bytes,
        });
    }

    if !mime_type.starts_with("image/") {
        return Err(DecodeError::UnsupportedType(mime_type.to_string()));
    }

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| DecodeError::DecodeFailed(e.to_string()))?;
    let pixels = decoded.to_rgba8();

    debug!(
        width = pixels.width(),
        height = pixels.height(),
        byte_size = bytes.len(),
        mime_type,
        "Certificate image decoded"
    );

    Ok(ImageBuffer {
        pixels,
        byte_size: bytes.len(),
        mime_type: mime_type.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([120, 130, 140, 255]));
        let mut cursor = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut cursor, ImageOutputFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    #[test]
    fn decodes_valid_png() {
        let bytes = png_bytes(32, 16);
        let buf = decode_certificate_image(&bytes, "image/png", 10 * 1024 * 1024).unwrap();
        assert_eq!(buf.width(), 32);
        assert_eq!(buf.height(), 16);
        assert_eq!(buf.byte_size(), bytes.len());
        assert_eq!(buf.mime_type(), "image/png");
    }

    #[test]
    fn rejects_oversized_input() {
        let bytes = vec![0u8; 128];
        let err = decode_certificate_image(&bytes, "image/png", 64).unwrap_err();
        assert!(matches!(err, DecodeError::InputTooLarge { .. }));
    }

    #[test]
    fn rejects_non_image_mime() {
        let bytes = png_bytes(8, 8);
        let err = decode_certificate_image(&bytes, "application/pdf", 10 * 1024 * 1024)
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedType(_)));
    }

    #[test]
    fn corrupt_stream_is_decode_failed() {
        let garbage = [0xDE, 0xAD, 0xBE, 0xEF].repeat(64);
        let err =
            decode_certificate_image(&garbage, "image/png", 10 * 1024 * 1024).unwrap_err();
        assert!(matches!(err, DecodeError::DecodeFailed(_)));
    }
}
