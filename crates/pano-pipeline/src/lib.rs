//! pano-pipeline: Pure image-to-panorama normalization pipeline (sans-IO).
//!
//! Turns an arbitrary uploaded image into something a 360° viewer can
//! display without empty regions:
//! decode -> classify -> canvas geometry -> stretch -> encode, plus the
//! viewer field of view for the result.
//!
//! True equirectangular panoramas (aspect ratio in `[1.9, 2.1]`) are
//! passed through untouched. Everything else is stretched onto a
//! canonical canvas and the viewer is restricted to the share of the
//! sphere the image covers.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and returns structured data. Browser interaction lives in
//! `pano-io` and `pano-worker`.

pub mod compress;
pub mod decode;
pub mod diagnostics;
pub mod encode;
pub mod geometry;
pub mod normalizer;
pub mod strategy;
pub mod stretch;
pub mod thumbnail;
pub mod types;
pub mod upload;

pub use compress::{CompressedUpload, compress_for_upload, fit_within};
pub use diagnostics::{Clock, NormalizeDiagnostics, normalize_with_diagnostics};
pub use geometry::{classify, compute_panorama_dimensions, compute_view_config, panorama_geometry};
pub use normalizer::Pipeline;
pub use strategy::{
    InlineNormalizer, Normalizer, OffloadedNormalizer, StrategyKind, Ticket, select_normalizer,
};
pub use stretch::ResampleFilter;
pub use types::{
    Dimensions, DynamicImage, EncodedImage, ErrorKind, ImageAnalysis, NavigationBounds,
    NormalizeConfig, NormalizeError, Normalized, NormalizedMeta, PanoramaGeometry, RoundingMode,
    SceneViewConfig,
};
pub use upload::check_upload;

/// Normalize one source image.
///
/// # Pipeline steps
///
/// 1. Decode the source bytes
/// 2. Classify by aspect ratio and compute the canvas geometry
/// 3. Panoramas: return the source bytes as-is
/// 4. Otherwise stretch onto `pano_width × pano_height`
/// 5. JPEG-encode the canvas at `config.jpeg_quality`
///
/// # Errors
///
/// Returns [`NormalizeError::InvalidConfig`] for an out-of-range config,
/// [`NormalizeError::EmptyInput`] / [`NormalizeError::ImageDecode`] for
/// unreadable input, [`NormalizeError::DegenerateDimensions`] for a
/// zero-sized image and [`NormalizeError::Encode`] if encoding fails.
pub fn normalize(bytes: &[u8], config: &NormalizeConfig) -> Result<Normalized, NormalizeError> {
    config.validate()?;
    let analyzed = Pipeline::new(bytes.to_vec(), config.clone())
        .decode()?
        .analyze()?;
    if analyzed.is_panorama() {
        return Ok(analyzed.pass_through());
    }
    Ok(analyzed.stretch().encode()?.into_result())
}

/// View configuration for a normalization result.
#[must_use]
pub fn view_config(normalized: &Normalized) -> SceneViewConfig {
    compute_view_config(normalized.is_panorama(), &normalized.geometry)
}
