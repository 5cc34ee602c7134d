//! `pano thumbnail`: the scene strip preview.

use std::path::PathBuf;

use clap::Args;

use super::{CliError, read_input, sibling_path, write_output};

#[derive(Args, Debug)]
pub struct ThumbnailArgs {
    /// Path to the input image.
    pub image_path: PathBuf,

    /// Where to write the PNG. Defaults to `<stem>-thumb.png`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &ThumbnailArgs) -> Result<(), CliError> {
    let bytes = read_input(&args.image_path)?;
    let decoded = pano_pipeline::decode::decode(&bytes)?;
    let thumbnail = pano_pipeline::thumbnail::thumbnail_png(&decoded.image)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| sibling_path(&args.image_path, "thumb", "png"));
    write_output(&output, &thumbnail.bytes)
}
