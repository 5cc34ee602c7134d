//! pano-io: Browser I/O for the panorama pipeline.
//!
//! Runs normalization in a web worker when the browser has one, turns
//! encoded results into object URLs for the viewer, and exports tours
//! as JSON downloads.
//!
//! Everything except reply decoding requires a browser environment
//! (`wasm32-unknown-unknown` target).

pub mod blob;
pub mod download;
pub mod normalizer;
pub mod prepare;
pub mod worker;

pub use blob::{bytes_to_blob_url, revoke_blob_url};
pub use download::{DownloadError, download_tour, trigger_download};
pub use normalizer::BrowserNormalizer;
pub use prepare::{prepare_scene, release_scene_urls};
pub use worker::{NormalizeWorker, WorkerReply};

use pano_pipeline::NormalizeError;
use wasm_bindgen::JsValue;

/// Errors from browser-side scene preparation.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    /// The upload was rejected or could not be normalized.
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),
}

impl From<JsValue> for BrowserError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}
