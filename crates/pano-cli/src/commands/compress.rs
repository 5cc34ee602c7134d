//! `pano compress`: the pre-upload size bound.

use std::path::PathBuf;

use clap::Args;
use pano_pipeline::NormalizeConfig;

use super::{CliError, media_type_for, read_input, sibling_path, write_output};

#[derive(Args, Debug)]
pub struct CompressArgs {
    /// Path to the input image.
    pub image_path: PathBuf,

    /// Where to write the JPEG. Defaults to `<stem>-compressed.jpg`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Largest output width.
    #[arg(long, default_value_t = NormalizeConfig::DEFAULT_COMPRESS_MAX_WIDTH, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_width: u32,

    /// Largest output height.
    #[arg(long, default_value_t = NormalizeConfig::DEFAULT_COMPRESS_MAX_HEIGHT, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_height: u32,

    /// JPEG quality (1-100).
    #[arg(long, default_value_t = NormalizeConfig::DEFAULT_COMPRESS_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: u8,
}

pub fn run(args: &CompressArgs) -> Result<(), CliError> {
    let config = NormalizeConfig {
        compress_max_width: args.max_width,
        compress_max_height: args.max_height,
        compress_quality: args.quality,
        ..NormalizeConfig::default()
    };
    config.validate()?;

    let bytes = read_input(&args.image_path)?;
    let name = args.image_path.to_string_lossy();
    pano_pipeline::check_upload(&bytes, &name, media_type_for(&args.image_path), &config)?;

    let compressed = pano_pipeline::compress_for_upload(&bytes, &config)?;
    println!(
        "{}x{} -> {}x{}{}",
        compressed.original.width,
        compressed.original.height,
        compressed.image.width,
        compressed.image.height,
        if compressed.resized { "" } else { " (not resized)" },
    );

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| sibling_path(&args.image_path, "compressed", "jpg"));
    write_output(&output, &compressed.image.bytes)
}
