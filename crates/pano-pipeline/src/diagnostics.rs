//! Normalization diagnostics: timing and size metrics for each stage.
//!
//! The crate has no time source of its own. Callers pass a [`Clock`];
//! the CLI uses `std::time::Instant`, a browser host can wrap
//! `performance.now()`.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::normalizer::Pipeline;
use crate::types::{NormalizeConfig, NormalizeError, Normalized};

/// A monotonic time source.
pub trait Clock {
    type Instant;

    fn now(&self) -> Self::Instant;

    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single normalization.
///
/// `stretch` and `encode` are `None` for a panorama that was passed
/// through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeDiagnostics {
    pub decode: StageDiagnostics,
    pub analyze: StageDiagnostics,
    pub stretch: Option<StageDiagnostics>,
    pub encode: Option<StageDiagnostics>,
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    Decode {
        input_bytes: usize,
        width: u32,
        height: u32,
        pixel_count: u64,
    },
    Analyze {
        aspect_ratio: f64,
        is_panorama: bool,
        pano_width: u32,
        pano_height: u32,
    },
    Stretch {
        filter: String,
        /// Output pixels divided by source pixels.
        scale_factor: f64,
    },
    Encode {
        quality: u8,
        output_bytes: usize,
    },
}

/// Run [`crate::normalize`] stage by stage, timing each one with `clock`.
///
/// # Errors
///
/// The same errors as [`crate::normalize`].
pub fn normalize_with_diagnostics<C: Clock>(
    bytes: &[u8],
    config: &NormalizeConfig,
    clock: &C,
) -> Result<(Normalized, NormalizeDiagnostics), NormalizeError> {
    config.validate()?;
    let start = clock.now();

    let t = clock.now();
    let decoded = Pipeline::new(bytes.to_vec(), config.clone()).decode()?;
    let (width, height) = (decoded.image().width(), decoded.image().height());
    let decode = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Decode {
            input_bytes: bytes.len(),
            width,
            height,
            pixel_count: u64::from(width) * u64::from(height),
        },
    };

    let t = clock.now();
    let analyzed = decoded.analyze()?;
    let analyze = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Analyze {
            aspect_ratio: analyzed.analysis().aspect_ratio,
            is_panorama: analyzed.is_panorama(),
            pano_width: analyzed.geometry().pano_width,
            pano_height: analyzed.geometry().pano_height,
        },
    };

    if analyzed.is_panorama() {
        let normalized = analyzed.pass_through();
        let diagnostics = NormalizeDiagnostics {
            decode,
            analyze,
            stretch: None,
            encode: None,
            total_duration: clock.elapsed(&start),
        };
        return Ok((normalized, diagnostics));
    }

    let t = clock.now();
    let source_pixels = analyzed.analysis().dimensions().pixel_count();
    let stretched = analyzed.stretch();
    #[allow(clippy::cast_precision_loss)]
    let scale_factor = stretched.canvas().len() as f64 / 3.0 / source_pixels as f64;
    let stretch = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Stretch {
            filter: config.resample_filter.to_string(),
            scale_factor,
        },
    };

    let t = clock.now();
    let normalized = stretched.encode()?.into_result();
    let encode = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Encode {
            quality: config.jpeg_quality,
            output_bytes: normalized.image.bytes.len(),
        },
    };

    let diagnostics = NormalizeDiagnostics {
        decode,
        analyze,
        stretch: Some(stretch),
        encode: Some(encode),
        total_duration: clock.elapsed(&start),
    };
    Ok((normalized, diagnostics))
}

impl NormalizeDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Normalize Diagnostics Report\n{}", "=".repeat(60)));
        if let StageMetrics::Decode {
            width,
            height,
            pixel_count,
            ..
        } = &self.decode.metrics
        {
            lines.push(format!("Image: {width}x{height} ({pixel_count} pixels)"));
        }
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);

        let mut stages = vec![("Decode", &self.decode), ("Analyze", &self.analyze)];
        match (&self.stretch, &self.encode) {
            (Some(stretch), Some(encode)) => {
                stages.push(("Stretch", stretch));
                stages.push(("Encode", encode));
            }
            _ => lines.push(format!("{:<24} {:>10} {:>10}  panorama", "Pass-through", "-", "-")),
        }

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.join("\n")
    }
}

fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            input_bytes,
            width,
            height,
            ..
        } => format!("{input_bytes} bytes -> {width}x{height}"),
        StageMetrics::Analyze {
            aspect_ratio,
            is_panorama,
            pano_width,
            pano_height,
        } => format!(
            "ratio={aspect_ratio:.4} panorama={is_panorama} canvas={pano_width}x{pano_height}"
        ),
        StageMetrics::Stretch {
            filter,
            scale_factor,
        } => format!("{filter} x{scale_factor:.2} pixels"),
        StageMetrics::Encode {
            quality,
            output_bytes,
        } => format!("q={quality} -> {output_bytes} bytes"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;

    /// Advances one millisecond per reading.
    struct StepClock(Cell<u64>);

    impl Clock for StepClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.0.get();
            self.0.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.now() - since)
        }
    }

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(w, h, image::Rgb([9, 9, 9]));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn duration_ms_converts_correctly() {
        assert!((duration_ms(Duration::from_millis(1234)) - 1234.0).abs() < 0.01);
    }

    #[test]
    fn stretched_run_records_all_stages() {
        let clock = StepClock(Cell::new(0));
        let (normalized, diag) =
            normalize_with_diagnostics(&png_bytes(40, 40), &NormalizeConfig::default(), &clock)
                .unwrap();
        assert!(normalized.stretched);
        assert!(diag.stretch.is_some() && diag.encode.is_some());
        assert!(diag.total_duration >= diag.decode.duration + diag.analyze.duration);
        let report = diag.report();
        assert!(report.contains("Normalize Diagnostics Report"));
        assert!(report.contains("Stretch"));
        assert!(report.contains("canvas=4096x2048"));
    }

    #[test]
    fn panorama_run_skips_canvas_stages() {
        let clock = StepClock(Cell::new(0));
        let (normalized, diag) =
            normalize_with_diagnostics(&png_bytes(40, 20), &NormalizeConfig::default(), &clock)
                .unwrap();
        assert!(!normalized.stretched);
        assert!(diag.stretch.is_none() && diag.encode.is_none());
        assert!(diag.report().contains("Pass-through"));
    }

    #[test]
    fn same_result_as_plain_normalize() {
        let bytes = png_bytes(30, 90);
        let config = NormalizeConfig::default();
        let (with_diag, _) =
            normalize_with_diagnostics(&bytes, &config, &StepClock(Cell::new(0))).unwrap();
        let plain = crate::normalize(&bytes, &config).unwrap();
        assert_eq!(with_diag.geometry, plain.geometry);
        assert_eq!(with_diag.analysis, plain.analysis);
    }

    #[test]
    fn diagnostics_serialize_durations_as_seconds() {
        let clock = StepClock(Cell::new(0));
        let (_, diag) =
            normalize_with_diagnostics(&png_bytes(8, 4), &NormalizeConfig::default(), &clock)
                .unwrap();
        let json = serde_json::to_value(&diag).unwrap();
        assert!(json["total_duration"].as_f64().unwrap() > 0.0);
        assert!(json["stretch"].is_null());
    }
}
