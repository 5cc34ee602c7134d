//! Staged normalizer: advance one stage at a time, inspecting each
//! intermediate before continuing.
//!
//! ```rust
//! # use pano_pipeline::{NormalizeConfig, NormalizeError, Pipeline};
//! # fn run(jpeg: Vec<u8>) -> Result<(), NormalizeError> {
//! let analyzed = Pipeline::new(jpeg, NormalizeConfig::default())
//!     .decode()?
//!     .analyze()?;
//!
//! let normalized = if analyzed.is_panorama() {
//!     analyzed.pass_through()
//! } else {
//!     analyzed.stretch().encode()?.into_result()
//! };
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self`, so decode, geometry, draw and
//! encode can only run in that order. A true panorama leaves at
//! [`Analyzed::pass_through`] and never reaches the canvas stages.
//!
//! [`crate::normalize`] drives these stages for callers that only want
//! the result.

use image::{DynamicImage, RgbImage};

use crate::decode::DecodedSource;
use crate::types::{
    EncodedImage, ImageAnalysis, NormalizeConfig, NormalizeError, Normalized, PanoramaGeometry,
};

/// Entry point for the staged normalizer.
pub struct Pipeline;

impl Pipeline {
    /// Start a pipeline over `source` bytes.
    pub const fn new(source: Vec<u8>, config: NormalizeConfig) -> Pending {
        Pending { config, source }
    }
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Normalizer state before any processing has occurred.
#[must_use = "pipeline stages are consumed by advancing: call .decode() to continue"]
pub struct Pending {
    config: NormalizeConfig,
    source: Vec<u8>,
}

impl Pending {
    /// The raw source bytes.
    #[must_use]
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// Decode the source and advance to [`Decoded`].
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::EmptyInput`] for empty input and
    /// [`NormalizeError::ImageDecode`] for unreadable data.
    pub fn decode(self) -> Result<Decoded, NormalizeError> {
        let decoded = crate::decode::decode(&self.source)?;
        tracing::debug!(
            bytes = self.source.len(),
            width = decoded.image.width(),
            height = decoded.image.height(),
            media_type = decoded.media_type,
            "decoded source"
        );
        Ok(Decoded {
            config: self.config,
            source: self.source,
            decoded,
        })
    }
}

// ───────────────────────── Stage 1: Decoded ──────────────────────────

/// Normalizer state after decoding.
#[must_use = "pipeline stages are consumed by advancing: call .analyze() to continue"]
pub struct Decoded {
    config: NormalizeConfig,
    source: Vec<u8>,
    decoded: DecodedSource,
}

impl Decoded {
    /// The decoded image.
    #[must_use]
    pub const fn image(&self) -> &DynamicImage {
        &self.decoded.image
    }

    /// Classify the image, compute its canvas geometry and advance to
    /// [`Analyzed`].
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::DegenerateDimensions`] for a zero-sized
    /// image.
    pub fn analyze(self) -> Result<Analyzed, NormalizeError> {
        let analysis =
            crate::geometry::classify(self.decoded.image.width(), self.decoded.image.height())?;
        let geometry = crate::geometry::panorama_geometry(&analysis, self.config.rounding);
        tracing::debug!(
            aspect_ratio = analysis.aspect_ratio,
            is_panorama = analysis.is_panorama,
            pano_width = geometry.pano_width,
            pano_height = geometry.pano_height,
            "analyzed source"
        );
        Ok(Analyzed {
            config: self.config,
            source: self.source,
            decoded: self.decoded,
            analysis,
            geometry,
        })
    }
}

// ───────────────────────── Stage 2: Analyzed ─────────────────────────

/// Normalizer state once classification and geometry are known.
///
/// Either [`pass_through`](Self::pass_through) (true panoramas) or
/// [`stretch`](Self::stretch) (everything else).
#[must_use = "pipeline stages are consumed by advancing: call .stretch() or .pass_through()"]
pub struct Analyzed {
    config: NormalizeConfig,
    source: Vec<u8>,
    decoded: DecodedSource,
    analysis: ImageAnalysis,
    geometry: PanoramaGeometry,
}

impl Analyzed {
    #[must_use]
    pub const fn analysis(&self) -> &ImageAnalysis {
        &self.analysis
    }

    #[must_use]
    pub const fn geometry(&self) -> &PanoramaGeometry {
        &self.geometry
    }

    #[must_use]
    pub const fn is_panorama(&self) -> bool {
        self.analysis.is_panorama
    }

    /// Finish without touching the canvas: the source bytes are the
    /// output.
    pub fn pass_through(self) -> Normalized {
        tracing::debug!("panorama passed through unchanged");
        Normalized {
            image: EncodedImage {
                bytes: self.source,
                media_type: self.decoded.media_type.to_owned(),
                width: self.analysis.width,
                height: self.analysis.height,
            },
            analysis: self.analysis,
            geometry: self.geometry,
            stretched: false,
        }
    }

    /// Stretch the image onto its `pano_width × pano_height` canvas and
    /// advance to [`Stretched`].
    pub fn stretch(self) -> Stretched {
        let canvas = crate::stretch::stretch_to_canvas(
            &self.decoded.image,
            self.geometry.canvas(),
            self.config.resample_filter,
        );
        tracing::debug!(
            width = canvas.width(),
            height = canvas.height(),
            filter = %self.config.resample_filter,
            "stretched onto canvas"
        );
        Stretched {
            config: self.config,
            analysis: self.analysis,
            geometry: self.geometry,
            canvas,
        }
    }
}

// ───────────────────────── Stage 3: Stretched ────────────────────────

/// Normalizer state after the stretch-to-canvas blit.
#[must_use = "pipeline stages are consumed by advancing: call .encode() to continue"]
pub struct Stretched {
    config: NormalizeConfig,
    analysis: ImageAnalysis,
    geometry: PanoramaGeometry,
    canvas: RgbImage,
}

impl Stretched {
    /// The stretched canvas.
    #[must_use]
    pub const fn canvas(&self) -> &RgbImage {
        &self.canvas
    }

    /// JPEG-encode the canvas and advance to [`Encoded`].
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::Encode`] if the encoder fails.
    pub fn encode(self) -> Result<Encoded, NormalizeError> {
        let image = crate::encode::encode_jpeg(&self.canvas, self.config.jpeg_quality)?;
        tracing::debug!(
            bytes = image.bytes.len(),
            quality = self.config.jpeg_quality,
            "encoded canvas"
        );
        Ok(Encoded {
            normalized: Normalized {
                image,
                analysis: self.analysis,
                geometry: self.geometry,
                stretched: true,
            },
        })
    }
}

// ───────────────────────── Stage 4: Encoded ──────────────────────────

/// Terminal state: the encoded canvas plus its geometry.
#[must_use = "call .into_result() to take the normalized image"]
pub struct Encoded {
    normalized: Normalized,
}

impl Encoded {
    #[must_use]
    pub const fn normalized(&self) -> &Normalized {
        &self.normalized
    }

    pub fn into_result(self) -> Normalized {
        self.normalized
    }
}
