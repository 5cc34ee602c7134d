//! Geometry calculator: panorama classification, canonical canvas
//! dimensions, and viewer field-of-view derivation.
//!
//! Every function here is pure. Both execution strategies in
//! [`crate::strategy`] reach these through [`crate::normalize`], so the
//! geometry they report is computed by exactly one piece of code.
//!
//! The canonical canvas is 4096 × 2048 (2:1 equirectangular). Images
//! wider than 2:1 keep the full width and lose height; images taller
//! than 1:2 keep the full height and lose width; everything in between
//! is stretched onto the full canvas. A floor of 2048 × 1024 is applied
//! last.

use crate::types::{
    ImageAnalysis, NavigationBounds, NormalizeError, PanoramaGeometry, RoundingMode,
    SceneViewConfig,
};

/// Width of the canonical equirectangular canvas.
pub const CANVAS_WIDTH: u32 = 4096;
/// Height of the canonical equirectangular canvas.
pub const CANVAS_HEIGHT: u32 = 2048;
/// Smallest output width after the floor.
pub const MIN_PANO_WIDTH: u32 = 2048;
/// Smallest output height after the floor.
pub const MIN_PANO_HEIGHT: u32 = 1024;

/// Lowest aspect ratio still treated as a full panorama (inclusive).
pub const PANORAMA_MIN_RATIO: f64 = 1.9;
/// Highest aspect ratio still treated as a full panorama (inclusive).
pub const PANORAMA_MAX_RATIO: f64 = 2.1;

/// At or above this ratio the source is a wide image.
const WIDE_RATIO: f64 = 2.0;
/// At or below this ratio the source is a tall image.
const TALL_RATIO: f64 = 0.5;

const FULL_HAOV: f64 = 360.0;
const FULL_VAOV: f64 = 180.0;
const DEFAULT_HFOV: f64 = 100.0;
const MIN_HFOV: f64 = 50.0;
const MAX_HFOV: f64 = 120.0;

/// Classify an image by its pixel dimensions.
///
/// # Errors
///
/// Returns [`NormalizeError::DegenerateDimensions`] if either dimension
/// is zero. A zero height has no aspect ratio; a zero width would yield
/// a zero ratio and an empty canvas.
pub fn classify(width: u32, height: u32) -> Result<ImageAnalysis, NormalizeError> {
    let aspect_ratio = aspect_ratio(width, height)?;
    Ok(ImageAnalysis {
        width,
        height,
        aspect_ratio,
        is_panorama: (PANORAMA_MIN_RATIO..=PANORAMA_MAX_RATIO).contains(&aspect_ratio),
    })
}

/// Compute the output canvas `(pano_width, pano_height)` for a source
/// image, floor included.
///
/// # Errors
///
/// Returns [`NormalizeError::DegenerateDimensions`] if either dimension
/// is zero.
pub fn compute_panorama_dimensions(
    width: u32,
    height: u32,
    rounding: RoundingMode,
) -> Result<(u32, u32), NormalizeError> {
    let ratio = aspect_ratio(width, height)?;
    Ok(apply_floor(branch_dimensions(ratio, rounding)))
}

/// The branch formula alone, before the minimum floor.
///
/// Public so callers (and tests) can see the value the floor acts on.
#[must_use]
pub fn branch_dimensions(aspect_ratio: f64, rounding: RoundingMode) -> (u32, u32) {
    if aspect_ratio >= WIDE_RATIO {
        let height = rounding.apply(f64::from(CANVAS_WIDTH) / aspect_ratio);
        (CANVAS_WIDTH, to_pixels(height))
    } else if aspect_ratio <= TALL_RATIO {
        let width = rounding.apply(f64::from(CANVAS_HEIGHT) * aspect_ratio);
        (to_pixels(width), CANVAS_HEIGHT)
    } else {
        (CANVAS_WIDTH, CANVAS_HEIGHT)
    }
}

/// Build the [`PanoramaGeometry`] for an already classified image.
#[must_use]
pub fn panorama_geometry(analysis: &ImageAnalysis, rounding: RoundingMode) -> PanoramaGeometry {
    let (pano_width, pano_height) = apply_floor(branch_dimensions(analysis.aspect_ratio, rounding));
    PanoramaGeometry {
        original_width: analysis.width,
        original_height: analysis.height,
        pano_width,
        pano_height,
        aspect_ratio: analysis.aspect_ratio,
    }
}

/// Derive the viewer configuration for one scene.
///
/// True panoramas get full free look. Anything else is limited to the
/// share of the canonical canvas it actually covers, so the viewer can
/// never pan or zoom out past the image content.
#[must_use]
pub fn compute_view_config(is_panorama: bool, geometry: &PanoramaGeometry) -> SceneViewConfig {
    if is_panorama {
        return SceneViewConfig {
            haov: FULL_HAOV,
            vaov: FULL_VAOV,
            hfov: DEFAULT_HFOV,
            v_offset: 0.0,
            bounds: None,
        };
    }

    let haov = FULL_HAOV * (f64::from(geometry.pano_width) / f64::from(CANVAS_WIDTH));
    let vaov = FULL_VAOV * (f64::from(geometry.pano_height) / f64::from(CANVAS_HEIGHT));
    SceneViewConfig {
        haov,
        vaov,
        hfov: DEFAULT_HFOV.min(haov),
        v_offset: 0.0,
        bounds: Some(NavigationBounds {
            min_yaw: -haov / 2.0,
            max_yaw: haov / 2.0,
            min_pitch: -vaov / 2.0,
            max_pitch: vaov / 2.0,
            min_hfov: MIN_HFOV,
            max_hfov: MAX_HFOV.min(haov),
        }),
    }
}

fn aspect_ratio(width: u32, height: u32) -> Result<f64, NormalizeError> {
    if width == 0 || height == 0 {
        return Err(NormalizeError::DegenerateDimensions { width, height });
    }
    Ok(f64::from(width) / f64::from(height))
}

const fn apply_floor((width, height): (u32, u32)) -> (u32, u32) {
    let width = if width < MIN_PANO_WIDTH {
        MIN_PANO_WIDTH
    } else {
        width
    };
    let height = if height < MIN_PANO_HEIGHT {
        MIN_PANO_HEIGHT
    } else {
        height
    };
    (width, height)
}

/// Convert an already-rounded, non-negative pixel count to `u32`.
///
/// Branch values are bounded by the canvas size, so the cast cannot
/// truncate.
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_pixels(value: f64) -> u32 {
    value as u32
}
