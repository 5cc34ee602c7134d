//! Shared types for the panorama normalization pipeline.

use serde::{Deserialize, Serialize};

use crate::stretch::ResampleFilter;

/// Re-export `DynamicImage` so downstream crates can hold decoded
/// images without depending on `image` directly.
pub use image::DynamicImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create a new dimensions value.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total pixel count.
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Classification of a decoded source image.
///
/// Computed once per upload by [`crate::geometry::classify`] and
/// consumed by the geometry calculator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnalysis {
    /// Natural width of the decoded image.
    pub width: u32,
    /// Natural height of the decoded image.
    pub height: u32,
    /// `width / height`.
    pub aspect_ratio: f64,
    /// `true` iff `aspect_ratio` lies in `[1.9, 2.1]`.
    pub is_panorama: bool,
}

impl ImageAnalysis {
    /// Source dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }
}

/// Canonical canvas geometry computed for a source image.
///
/// `pano_width >= 2048` and `pano_height >= 1024` always hold; the
/// constructor in [`crate::geometry`] applies the floor after the
/// branch formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanoramaGeometry {
    pub original_width: u32,
    pub original_height: u32,
    /// Output canvas width in pixels.
    pub pano_width: u32,
    /// Output canvas height in pixels.
    pub pano_height: u32,
    pub aspect_ratio: f64,
}

impl PanoramaGeometry {
    /// Output canvas dimensions.
    #[must_use]
    pub const fn canvas(&self) -> Dimensions {
        Dimensions::new(self.pano_width, self.pano_height)
    }
}

/// Navigation limits that keep the viewer inside the valid image content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationBounds {
    pub min_yaw: f64,
    pub max_yaw: f64,
    pub min_pitch: f64,
    pub max_pitch: f64,
    pub min_hfov: f64,
    pub max_hfov: f64,
}

/// Viewer configuration derived from one [`PanoramaGeometry`].
///
/// Serialized with the viewer's own key names (`haov`, `vaov`, `hfov`,
/// `vOffset`, `minYaw`, ...). Bounds are flattened into the same
/// object and omitted entirely for true panoramas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneViewConfig {
    /// Horizontal angle of view the image covers, in degrees.
    pub haov: f64,
    /// Vertical angle of view the image covers, in degrees.
    pub vaov: f64,
    /// Initial horizontal field of view, in degrees.
    pub hfov: f64,
    /// Vertical offset of the image center, in degrees.
    pub v_offset: f64,
    #[serde(flatten)]
    pub bounds: Option<NavigationBounds>,
}

impl SceneViewConfig {
    /// Whether this configuration allows full free look.
    #[must_use]
    pub const fn is_free_look(&self) -> bool {
        self.bounds.is_none()
    }
}

/// Rounding applied by the branch formulas of the geometry calculator.
///
/// Only matters when a quotient lands exactly on `.5`. Both execution
/// strategies read it from the same [`NormalizeConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundingMode {
    /// `f64::round`: ties move away from zero (1100.5 -> 1101).
    #[default]
    HalfAwayFromZero,
    /// `f64::round_ties_even`: ties move to the even neighbour
    /// (1100.5 -> 1100, 1101.5 -> 1102).
    HalfToEven,
}

impl RoundingMode {
    /// Round `value` to an integral `f64` using this mode.
    #[must_use]
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Self::HalfAwayFromZero => value.round(),
            Self::HalfToEven => value.round_ties_even(),
        }
    }
}

/// Configuration for the normalization pipeline.
///
/// Every field has a default; a partial JSON object deserializes with
/// the missing fields taken from [`NormalizeConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Rounding mode for the canvas branch formulas.
    pub rounding: RoundingMode,

    /// Resampling filter for the stretch-to-canvas blit.
    pub resample_filter: ResampleFilter,

    /// JPEG quality (1-100) of the stretched output.
    pub jpeg_quality: u8,

    /// Pre-upload compression bound on width.
    pub compress_max_width: u32,

    /// Pre-upload compression bound on height.
    pub compress_max_height: u32,

    /// JPEG quality (1-100) of the pre-upload compression.
    pub compress_quality: u8,

    /// Largest accepted upload in bytes.
    pub max_upload_bytes: usize,

    /// Whether to run normalization on a background worker when one is
    /// available.
    pub offload: bool,
}

impl NormalizeConfig {
    pub const DEFAULT_ROUNDING: RoundingMode = RoundingMode::HalfAwayFromZero;
    pub const DEFAULT_RESAMPLE_FILTER: ResampleFilter = ResampleFilter::Triangle;
    pub const DEFAULT_JPEG_QUALITY: u8 = 95;
    pub const DEFAULT_COMPRESS_MAX_WIDTH: u32 = 4096;
    pub const DEFAULT_COMPRESS_MAX_HEIGHT: u32 = 2048;
    pub const DEFAULT_COMPRESS_QUALITY: u8 = 80;
    pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
    pub const DEFAULT_OFFLOAD: bool = true;

    /// Check field ranges.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::InvalidConfig`] if a quality is outside
    /// `1..=100` or a compression bound is zero.
    pub fn validate(&self) -> Result<(), NormalizeError> {
        for (name, quality) in [
            ("jpeg_quality", self.jpeg_quality),
            ("compress_quality", self.compress_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(NormalizeError::InvalidConfig(format!(
                    "{name} must be in 1..=100, got {quality}"
                )));
            }
        }
        if self.compress_max_width == 0 || self.compress_max_height == 0 {
            return Err(NormalizeError::InvalidConfig(format!(
                "compression bounds must be positive, got {}x{}",
                self.compress_max_width, self.compress_max_height
            )));
        }
        Ok(())
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            rounding: Self::DEFAULT_ROUNDING,
            resample_filter: Self::DEFAULT_RESAMPLE_FILTER,
            jpeg_quality: Self::DEFAULT_JPEG_QUALITY,
            compress_max_width: Self::DEFAULT_COMPRESS_MAX_WIDTH,
            compress_max_height: Self::DEFAULT_COMPRESS_MAX_HEIGHT,
            compress_quality: Self::DEFAULT_COMPRESS_QUALITY,
            max_upload_bytes: Self::DEFAULT_MAX_UPLOAD_BYTES,
            offload: Self::DEFAULT_OFFLOAD,
        }
    }
}

/// An encoded image ready to hand to the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    /// Encoded file bytes.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes` (e.g. `image/jpeg`).
    pub media_type: String,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    /// Pixel dimensions of the encoded image.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }
}

/// Result of normalizing one source image.
///
/// For a true panorama `image` is the source, untouched, and
/// `stretched` is `false`; `geometry` still carries the canonical
/// values so the invariants of [`PanoramaGeometry`] hold for every
/// result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Normalized {
    pub image: EncodedImage,
    pub analysis: ImageAnalysis,
    pub geometry: PanoramaGeometry,
    /// Whether the image went through the stretch-to-canvas stages.
    pub stretched: bool,
}

impl Normalized {
    /// Source classification.
    #[must_use]
    pub const fn is_panorama(&self) -> bool {
        self.analysis.is_panorama
    }

    /// Separate the encoded bytes from everything else, for transports
    /// that move bytes as a raw buffer and metadata as JSON.
    #[must_use]
    pub fn into_parts(self) -> (Vec<u8>, NormalizedMeta) {
        let meta = NormalizedMeta {
            media_type: self.image.media_type,
            width: self.image.width,
            height: self.image.height,
            analysis: self.analysis,
            geometry: self.geometry,
            stretched: self.stretched,
        };
        (self.image.bytes, meta)
    }
}

/// A [`Normalized`] without its image bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedMeta {
    pub media_type: String,
    pub width: u32,
    pub height: u32,
    pub analysis: ImageAnalysis,
    pub geometry: PanoramaGeometry,
    pub stretched: bool,
}

impl NormalizedMeta {
    /// Reattach the encoded bytes.
    #[must_use]
    pub fn with_bytes(self, bytes: Vec<u8>) -> Normalized {
        Normalized {
            image: EncodedImage {
                bytes,
                media_type: self.media_type,
                width: self.width,
                height: self.height,
            },
            analysis: self.analysis,
            geometry: self.geometry,
            stretched: self.stretched,
        }
    }
}

/// Coarse error classes, for callers that only need to branch on the
/// kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The source could not be read as pixel data.
    Decode,
    /// The resampled canvas could not be serialized.
    Encode,
    /// Zero-sized source dimensions.
    DegenerateInput,
    /// The input was rejected before decoding (size, type, config).
    InvalidInput,
    /// The background worker could not run the request.
    Worker,
}

/// Errors that can occur during normalization.
///
/// Every variant carries plain data so the error serializes as-is and
/// crosses a worker boundary without losing its kind: an offloaded
/// failure deserializes to the same value the inline path returns.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum NormalizeError {
    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(String),

    /// Failed to encode the output image.
    #[error("failed to encode image: {0}")]
    Encode(String),

    /// Width or height is zero; no aspect ratio exists.
    #[error("degenerate image dimensions: {width}x{height}")]
    DegenerateDimensions { width: u32, height: u32 },

    /// The upload exceeds the configured size limit.
    #[error("upload of {size} bytes exceeds the {limit}-byte limit")]
    UploadTooLarge { size: usize, limit: usize },

    /// The upload is not an image.
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    /// Normalization configuration is invalid.
    #[error("invalid normalize configuration: {0}")]
    InvalidConfig(String),

    /// The background worker is gone or never answered.
    #[error("normalization worker unavailable: {0}")]
    WorkerUnavailable(String),
}

impl NormalizeError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ImageDecode(_) => ErrorKind::Decode,
            Self::Encode(_) => ErrorKind::Encode,
            Self::DegenerateDimensions { .. } => ErrorKind::DegenerateInput,
            Self::EmptyInput
            | Self::UploadTooLarge { .. }
            | Self::UnsupportedType(_)
            | Self::InvalidConfig(_) => ErrorKind::InvalidInput,
            Self::WorkerUnavailable(_) => ErrorKind::Worker,
        }
    }

    #[allow(clippy::needless_pass_by_value)]
    pub(crate) fn decode(err: image::ImageError) -> Self {
        Self::ImageDecode(err.to_string())
    }

    #[allow(clippy::needless_pass_by_value)]
    pub(crate) fn encode(err: image::ImageError) -> Self {
        Self::Encode(err.to_string())
    }
}
