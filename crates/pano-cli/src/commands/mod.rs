//! Subcommand implementations.

pub mod compress;
pub mod normalize;
pub mod thumbnail;
pub mod tour;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use pano_pipeline::{Clock, NormalizeError};
use pano_tour::TourError;

/// Errors surfaced to the user by a subcommand.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Tour(#[from] TourError),

    #[error("{0}")]
    Config(String),

    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn read_input(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|source| CliError::Io {
        action: "reading",
        path: path.to_owned(),
        source,
    })
}

pub fn write_output(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, bytes).map_err(|source| CliError::Io {
        action: "writing",
        path: path.to_owned(),
        source,
    })?;
    eprintln!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// `<dir>/<stem>-<suffix>.<ext>` next to `input`.
pub fn sibling_path(input: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    input.with_file_name(format!("{stem}-{suffix}.{extension}"))
}

/// File extension for an encoded image's media type.
pub fn extension_for(media_type: &str) -> &str {
    match media_type {
        "image/jpeg" => "jpg",
        other => other.strip_prefix("image/").unwrap_or("bin"),
    }
}

/// Media type guessed from a file name, for the upload check.
pub fn media_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "bmp" => Some("image/bmp"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
pub struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}
