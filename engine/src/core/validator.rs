//! Validation of backend response bodies.
//!
//! A body only counts as a result once it decodes as an image. Providers
//! answer HTTP 200 with HTML error pages, JSON bodies and tiny placeholder
//! images often enough that trusting the status code alone is not an option.

use image::GenericImageView;

use crate::types::BackendFailure;

/// Metadata extracted from a validated image body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedImage {
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Decode `bytes` and return the detected format and dimensions.
///
/// Validation is read-only: callers keep the original bytes untouched, so
/// validating the same body twice yields the same answer.
pub fn validate_image(bytes: &[u8]) -> Result<DecodedImage, BackendFailure> {
    let format =
        image::guess_format(bytes).map_err(|_| BackendFailure::NotAnImage(body_excerpt(bytes)))?;
    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|err| BackendFailure::NotAnImage(format!("decode failed: {err}")))?;
    let (width, height) = decoded.dimensions();
    Ok(DecodedImage {
        mime_type: format.to_mime_type(),
        width,
        height,
    })
}

/// Reject bodies below `min_bytes`, the placeholder filter for providers that
/// answer errors with a 200 and a stub image
pub fn ensure_minimum_size(bytes: &[u8], min_bytes: usize) -> Result<(), BackendFailure> {
    if bytes.len() < min_bytes {
        return Err(BackendFailure::Placeholder { size: bytes.len() });
    }
    Ok(())
}

/// Printable excerpt of a response body for diagnostics
pub fn body_excerpt(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    if trimmed.chars().count() <= 300 {
        return trimmed.to_string();
    }
    let mut excerpt: String = trimmed.chars().take(300).collect();
    excerpt.push('…');
    excerpt
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, RgbImage};

    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, image::Rgb([180, 40, 40]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_valid_png_decodes_with_metadata() {
        let bytes = png_bytes(8, 6);
        let decoded = validate_image(&bytes).unwrap();
        assert_eq!(decoded.mime_type, "image/png");
        assert_eq!(decoded.width, 8);
        assert_eq!(decoded.height, 6);
    }

    #[test]
    fn test_validation_is_repeatable() {
        let bytes = png_bytes(4, 4);
        let first = validate_image(&bytes).unwrap();
        let second = validate_image(&bytes).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_text_body_is_not_an_image() {
        let err = validate_image(b"Internal Server Error").unwrap_err();
        match err {
            BackendFailure::NotAnImage(excerpt) => {
                assert!(excerpt.contains("Internal Server Error"))
            }
            other => panic!("expected NotAnImage, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_image_fails_decode() {
        let mut bytes = png_bytes(8, 8);
        bytes.truncate(20);
        assert!(validate_image(&bytes).is_err());
    }

    #[test]
    fn test_minimum_size_filter() {
        assert_eq!(
            ensure_minimum_size(&[0u8; 399], 400),
            Err(BackendFailure::Placeholder { size: 399 })
        );
        assert_eq!(ensure_minimum_size(&[0u8; 400], 400), Ok(()));
    }

    #[test]
    fn test_body_excerpt_truncates_long_bodies() {
        let body = "x".repeat(2000);
        let excerpt = body_excerpt(body.as_bytes());
        assert_eq!(excerpt.chars().count(), 301);
        assert!(excerpt.ends_with('…'));
    }
}
