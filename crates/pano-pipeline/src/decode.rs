//! Image decoding and media-type sniffing.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP, GIF) and produces a
//! [`DynamicImage`] plus the MIME type the bytes actually carry. The
//! media type matters for the panorama pass-through path, where the
//! source bytes are handed to the viewer unchanged.

use image::DynamicImage;

use crate::types::NormalizeError;

/// A decoded source image.
#[derive(Debug, Clone)]
pub struct DecodedSource {
    pub image: DynamicImage,
    /// MIME type sniffed from the magic bytes.
    pub media_type: &'static str,
}

/// Decode raw image bytes.
///
/// # Errors
///
/// Returns [`NormalizeError::EmptyInput`] if `bytes` is empty.
/// Returns [`NormalizeError::ImageDecode`] if the format is unrecognized
/// or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<DecodedSource, NormalizeError> {
    if bytes.is_empty() {
        return Err(NormalizeError::EmptyInput);
    }

    let format = image::guess_format(bytes).map_err(NormalizeError::decode)?;
    let image = image::load_from_memory_with_format(bytes, format).map_err(NormalizeError::decode)?;
    Ok(DecodedSource {
        image,
        media_type: format.to_mime_type(),
    })
}

/// Sniff the MIME type of `bytes` without decoding them.
///
/// Returns `None` when the magic bytes match no known image format.
#[must_use]
pub fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes)
        .ok()
        .map(|format| format.to_mime_type())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn empty_input_returns_error() {
        assert!(matches!(decode(&[]), Err(NormalizeError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_returns_image_decode_error() {
        let result = decode(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(NormalizeError::ImageDecode(_))));
    }

    #[test]
    fn truncated_png_returns_image_decode_error() {
        let mut bytes = png_bytes(8, 8);
        bytes.truncate(bytes.len() / 2);
        assert!(matches!(decode(&bytes), Err(NormalizeError::ImageDecode(_))));
    }

    #[test]
    fn valid_png_decodes_with_dimensions() {
        let decoded = decode(&png_bytes(17, 31)).unwrap();
        assert_eq!(decoded.image.width(), 17);
        assert_eq!(decoded.image.height(), 31);
        assert_eq!(decoded.media_type, "image/png");
    }

    #[test]
    fn sniffs_png_and_rejects_text() {
        assert_eq!(sniff_media_type(&png_bytes(1, 1)), Some("image/png"));
        assert_eq!(sniff_media_type(b"hello, world"), None);
    }
}
