//! Normalization flags shared by the subcommands.

use clap::{Args, ValueEnum};
use pano_pipeline::{NormalizeConfig, ResampleFilter, RoundingMode, StrategyKind};

use crate::commands::CliError;

/// Flags that build a [`NormalizeConfig`].
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Execution strategy.
    #[arg(long, value_enum, default_value_t = Strategy::Auto)]
    pub strategy: Strategy,

    /// Rounding of the canvas dimension at exact .5 ties.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_ROUNDING)]
    pub rounding: Rounding,

    /// Resampling filter for the stretch (nearest, triangle, catmull-rom, gaussian, lanczos3).
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_FILTER)]
    pub filter: Filter,

    /// JPEG quality of the stretched output (1-100).
    #[arg(long, default_value_t = NormalizeConfig::DEFAULT_JPEG_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: u8,

    /// Full normalization config as a JSON string.
    ///
    /// When provided, the individual config flags above are ignored.
    /// Missing fields take their defaults.
    #[arg(long)]
    pub config_json: Option<String>,
}

/// Execution strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Worker thread when it starts, inline otherwise.
    Auto,
    /// On the calling thread.
    Inline,
    /// On a dedicated worker thread.
    Offload,
}

impl From<Strategy> for StrategyKind {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Auto => Self::Auto,
            Strategy::Inline => Self::Inline,
            Strategy::Offload => Self::Offload,
        }
    }
}

/// Tie-breaking rule for canvas rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Rounding {
    /// 1100.5 -> 1101.
    HalfAwayFromZero,
    /// 1100.5 -> 1100.
    HalfToEven,
}

/// Stretch resampling filter selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Filter {
    /// Nearest-neighbor (fastest, blocky).
    Nearest,
    /// Bilinear interpolation (fast, decent quality).
    Triangle,
    /// Bicubic Catmull-Rom (moderate, good quality).
    CatmullRom,
    /// Gaussian (moderate, smooth).
    Gaussian,
    /// Lanczos with 3 lobes (slowest, sharpest).
    Lanczos3,
}

const fn rounding_from_pipeline(mode: RoundingMode) -> Rounding {
    match mode {
        RoundingMode::HalfAwayFromZero => Rounding::HalfAwayFromZero,
        RoundingMode::HalfToEven => Rounding::HalfToEven,
    }
}

const fn filter_from_pipeline(filter: ResampleFilter) -> Filter {
    match filter {
        ResampleFilter::Nearest => Filter::Nearest,
        ResampleFilter::Triangle => Filter::Triangle,
        ResampleFilter::CatmullRom => Filter::CatmullRom,
        ResampleFilter::Gaussian => Filter::Gaussian,
        ResampleFilter::Lanczos3 => Filter::Lanczos3,
    }
}

/// CLI defaults derived from the pipeline constants so the two cannot
/// silently diverge.
const CLI_DEFAULT_ROUNDING: Rounding = rounding_from_pipeline(NormalizeConfig::DEFAULT_ROUNDING);
const CLI_DEFAULT_FILTER: Filter = filter_from_pipeline(NormalizeConfig::DEFAULT_RESAMPLE_FILTER);

impl ConfigArgs {
    /// Build the pipeline config. `--config-json` wins over the flags.
    ///
    /// # Errors
    ///
    /// [`CliError::Config`] for unparsable JSON or out-of-range values.
    pub fn to_config(&self) -> Result<NormalizeConfig, CliError> {
        let config = if let Some(json) = &self.config_json {
            serde_json::from_str(json)
                .map_err(|e| CliError::Config(format!("failed to parse --config-json: {e}")))?
        } else {
            NormalizeConfig {
                rounding: match self.rounding {
                    Rounding::HalfAwayFromZero => RoundingMode::HalfAwayFromZero,
                    Rounding::HalfToEven => RoundingMode::HalfToEven,
                },
                resample_filter: match self.filter {
                    Filter::Nearest => ResampleFilter::Nearest,
                    Filter::Triangle => ResampleFilter::Triangle,
                    Filter::CatmullRom => ResampleFilter::CatmullRom,
                    Filter::Gaussian => ResampleFilter::Gaussian,
                    Filter::Lanczos3 => ResampleFilter::Lanczos3,
                },
                jpeg_quality: self.quality,
                offload: self.strategy != Strategy::Inline,
                ..NormalizeConfig::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy.into()
    }
}
