//! Stretch-to-canonical-canvas resampling.
//!
//! Draws the whole source image onto a `pano_width × pano_height`
//! canvas in a single scaled blit: no letterboxing, no cropping. The
//! aspect ratio is deliberately not preserved; the viewer's field of
//! view is adjusted instead (see [`crate::geometry::compute_view_config`]).
//!
//! This is not the pre-upload size bound, which preserves aspect ratio
//! and lives in [`crate::compress`].

use std::fmt;

use image::{DynamicImage, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::types::Dimensions;

/// Resampling filter used when drawing onto the canvas.
///
/// Ordered from fastest/lowest-quality to slowest/highest-quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResampleFilter {
    /// Nearest-neighbor: fastest, blocky artifacts.
    Nearest,
    /// Bilinear interpolation, close to a browser canvas `drawImage`.
    #[default]
    Triangle,
    /// Bicubic (Catmull-Rom): moderate speed, good quality.
    CatmullRom,
    /// Gaussian: moderate speed, smooth output.
    Gaussian,
    /// Lanczos with 3 lobes: slowest, sharpest.
    Lanczos3,
}

impl ResampleFilter {
    /// Convert to the `image` crate's `FilterType`.
    pub(crate) const fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            Self::Nearest => image::imageops::FilterType::Nearest,
            Self::Triangle => image::imageops::FilterType::Triangle,
            Self::CatmullRom => image::imageops::FilterType::CatmullRom,
            Self::Gaussian => image::imageops::FilterType::Gaussian,
            Self::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

impl fmt::Display for ResampleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest => f.write_str("Nearest"),
            Self::Triangle => f.write_str("Triangle"),
            Self::CatmullRom => f.write_str("CatmullRom"),
            Self::Gaussian => f.write_str("Gaussian"),
            Self::Lanczos3 => f.write_str("Lanczos3"),
        }
    }
}

/// Stretch `image` to exactly `canvas`, ignoring its aspect ratio.
///
/// The result is RGB: the canvas is JPEG-encoded afterwards and JPEG
/// has no alpha channel. Transparent source pixels end up black, see
/// [`flatten_onto_black`].
#[must_use]
pub fn stretch_to_canvas(
    image: &DynamicImage,
    canvas: Dimensions,
    filter: ResampleFilter,
) -> RgbImage {
    let rgb = flatten_onto_black(image);
    if rgb.dimensions() == (canvas.width, canvas.height) {
        return rgb;
    }
    image::imageops::resize(
        &rgb,
        canvas.width,
        canvas.height,
        filter.to_image_filter(),
    )
}

/// Composite `image` over an opaque black background.
///
/// Images without alpha are converted as-is.
#[must_use]
pub fn flatten_onto_black(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        Rgb([over_black(r, a), over_black(g, a), over_black(b, a)])
    })
}

#[expect(clippy::cast_possible_truncation)]
fn over_black(channel: u8, alpha: u8) -> u8 {
    // Rounded `channel * alpha / 255`; never exceeds 255.
    ((u16::from(channel) * u16::from(alpha) + 127) / 255) as u8
}
