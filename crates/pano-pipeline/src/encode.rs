//! Canvas encoding.
//!
//! The stretched canvas and the pre-upload compression both go out as
//! JPEG; thumbnails go out as PNG.

use image::{ImageEncoder, RgbImage};

use crate::types::{EncodedImage, NormalizeError};

/// MIME type of JPEG output.
pub const JPEG_MEDIA_TYPE: &str = "image/jpeg";
/// MIME type of PNG output.
pub const PNG_MEDIA_TYPE: &str = "image/png";

/// Encode an RGB canvas as JPEG at `quality` (1-100).
///
/// # Errors
///
/// Returns [`NormalizeError::Encode`] if the encoder rejects the buffer.
pub fn encode_jpeg(canvas: &RgbImage, quality: u8) -> Result<EncodedImage, NormalizeError> {
    let mut bytes = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, quality);
    encoder
        .write_image(
            canvas.as_raw(),
            canvas.width(),
            canvas.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(NormalizeError::encode)?;
    Ok(EncodedImage {
        bytes,
        media_type: JPEG_MEDIA_TYPE.to_owned(),
        width: canvas.width(),
        height: canvas.height(),
    })
}

/// Encode an RGB canvas as PNG.
///
/// # Errors
///
/// Returns [`NormalizeError::Encode`] if the encoder rejects the buffer.
pub fn encode_png(canvas: &RgbImage) -> Result<EncodedImage, NormalizeError> {
    let mut bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut bytes);
    encoder
        .write_image(
            canvas.as_raw(),
            canvas.width(),
            canvas.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(NormalizeError::encode)?;
    Ok(EncodedImage {
        bytes,
        media_type: PNG_MEDIA_TYPE.to_owned(),
        width: canvas.width(),
        height: canvas.height(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn jpeg_round_trips_dimensions() {
        let canvas = RgbImage::from_pixel(64, 32, image::Rgb([90, 120, 200]));
        let encoded = encode_jpeg(&canvas, 95).unwrap();
        assert_eq!(encoded.media_type, "image/jpeg");
        assert_eq!(encoded.dimensions(), crate::Dimensions::new(64, 32));
        // JPEG SOI marker.
        assert_eq!(&encoded.bytes[..2], &[0xFF, 0xD8]);
        let back = image::load_from_memory(&encoded.bytes).unwrap();
        assert_eq!((back.width(), back.height()), (64, 32));
    }

    #[test]
    fn lower_quality_is_not_larger() {
        let canvas = RgbImage::from_fn(128, 64, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            image::Rgb([(x * 2) as u8, (y * 4) as u8, ((x + y) % 256) as u8])
        });
        let high = encode_jpeg(&canvas, 95).unwrap();
        let low = encode_jpeg(&canvas, 20).unwrap();
        assert!(low.bytes.len() <= high.bytes.len());
    }

    #[test]
    fn png_is_lossless() {
        let canvas = RgbImage::from_fn(5, 3, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            image::Rgb([x as u8 * 40, y as u8 * 60, 7])
        });
        let encoded = encode_png(&canvas).unwrap();
        assert_eq!(encoded.media_type, "image/png");
        let back = image::load_from_memory(&encoded.bytes).unwrap().to_rgb8();
        assert_eq!(back, canvas);
    }
}
