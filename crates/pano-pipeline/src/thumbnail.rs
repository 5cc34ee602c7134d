//! Scene thumbnails for the mini-map: the image fitted into a black
//! letterboxed tile.

use image::{DynamicImage, Rgb, RgbImage};

use crate::decode;
use crate::encode;
use crate::stretch::{self, ResampleFilter};
use crate::types::{Dimensions, EncodedImage, NormalizeError, Normalized};

/// Thumbnail width in pixels.
pub const THUMBNAIL_WIDTH: u32 = 100;
/// Thumbnail height in pixels.
pub const THUMBNAIL_HEIGHT: u32 = 50;
/// Box the image is fitted into, centered on the tile.
pub const THUMBNAIL_CONTENT: Dimensions = Dimensions::new(80, 40);

const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);

/// Size and offset of the fitted image inside the tile.
///
/// Scales by `min(80 / w, 40 / h)`, so small sources are enlarged to
/// touch the content box.
#[must_use]
pub fn thumbnail_placement(width: u32, height: u32) -> (Dimensions, (u32, u32)) {
    let (w, h) = (f64::from(width.max(1)), f64::from(height.max(1)));
    let scale = (f64::from(THUMBNAIL_CONTENT.width) / w).min(f64::from(THUMBNAIL_CONTENT.height) / h);
    let fitted = Dimensions::new(
        to_pixels(w * scale).clamp(1, THUMBNAIL_CONTENT.width),
        to_pixels(h * scale).clamp(1, THUMBNAIL_CONTENT.height),
    );
    let offset = (
        (THUMBNAIL_WIDTH - fitted.width) / 2,
        (THUMBNAIL_HEIGHT - fitted.height) / 2,
    );
    (fitted, offset)
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_pixels(value: f64) -> u32 {
    value.round() as u32
}

/// Render the thumbnail tile as raw RGB.
#[must_use]
pub fn render_thumbnail(image: &DynamicImage) -> RgbImage {
    let (fitted, (x, y)) = thumbnail_placement(image.width(), image.height());
    let scaled = image::imageops::resize(
        &stretch::flatten_onto_black(image),
        fitted.width,
        fitted.height,
        ResampleFilter::Triangle.to_image_filter(),
    );
    let mut tile = RgbImage::from_pixel(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT, BACKGROUND);
    image::imageops::replace(&mut tile, &scaled, i64::from(x), i64::from(y));
    tile
}

/// Render and PNG-encode the thumbnail for `image`.
///
/// # Errors
///
/// Returns [`NormalizeError::Encode`] if PNG encoding fails.
pub fn thumbnail_png(image: &DynamicImage) -> Result<EncodedImage, NormalizeError> {
    encode::encode_png(&render_thumbnail(image))
}

/// Thumbnail of the image a scene actually shows.
///
/// Drawn from the normalized output, so a stretched scene fills the
/// content box the same way its canvas fills the viewer.
///
/// # Errors
///
/// Returns [`NormalizeError::ImageDecode`] if the normalized bytes do
/// not decode and [`NormalizeError::Encode`] if PNG encoding fails.
pub fn scene_thumbnail(normalized: &Normalized) -> Result<EncodedImage, NormalizeError> {
    let shown = decode::decode(&normalized.image.bytes)?;
    thumbnail_png(&shown.image)
}
