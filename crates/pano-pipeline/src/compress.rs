//! Pre-upload compression: bound an oversized source to a maximum size
//! before the panorama pipeline runs.
//!
//! This is a fit-within-bounds scale that preserves aspect ratio. It is
//! unrelated to [`crate::stretch`], which deliberately distorts.

use serde::{Deserialize, Serialize};

use crate::decode;
use crate::encode;
use crate::stretch;
use crate::types::{Dimensions, EncodedImage, NormalizeConfig, NormalizeError};

/// Scale `(width, height)` down to fit within `max_width × max_height`,
/// preserving aspect ratio. Never upsizes.
///
/// The width bound is applied first, then the height bound to the
/// already width-bounded size. Fractional results are truncated and
/// each side is kept at least one pixel.
#[must_use]
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> Dimensions {
    let (mut w, mut h) = (f64::from(width), f64::from(height));
    if w > f64::from(max_width) {
        h = h * f64::from(max_width) / w;
        w = f64::from(max_width);
    }
    if h > f64::from(max_height) {
        w = w * f64::from(max_height) / h;
        h = f64::from(max_height);
    }
    Dimensions::new(truncate(w), truncate(h))
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn truncate(value: f64) -> u32 {
    (value.trunc() as u32).max(1)
}

/// Result of [`compress_for_upload`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressedUpload {
    pub image: EncodedImage,
    pub original: Dimensions,
    /// Whether the source was larger than the bounds and got scaled.
    pub resized: bool,
}

/// Decode `bytes`, bound them to the configured maximum size, and
/// re-encode as JPEG at `config.compress_quality`.
///
/// Sources already inside the bounds are re-encoded at their own size.
///
/// # Errors
///
/// Propagates decode and encode failures.
pub fn compress_for_upload(
    bytes: &[u8],
    config: &NormalizeConfig,
) -> Result<CompressedUpload, NormalizeError> {
    let source = decode::decode(bytes)?;
    let original = Dimensions::new(source.image.width(), source.image.height());
    let target = fit_within(
        original.width,
        original.height,
        config.compress_max_width,
        config.compress_max_height,
    );
    let resized = target != original;
    let flat = stretch::flatten_onto_black(&source.image);
    let rgb = if resized {
        image::imageops::resize(
            &flat,
            target.width,
            target.height,
            config.resample_filter.to_image_filter(),
        )
    } else {
        flat
    };
    tracing::debug!(
        from_width = original.width,
        from_height = original.height,
        to_width = target.width,
        to_height = target.height,
        "compressed upload"
    );
    Ok(CompressedUpload {
        image: encode::encode_jpeg(&rgb, config.compress_quality)?,
        original,
        resized,
    })
}
