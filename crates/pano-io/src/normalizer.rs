//! Strategy selection in the browser.

use pano_pipeline::{NormalizeConfig, NormalizeError, Normalized, StrategyKind};
use wasm_bindgen::JsValue;

use crate::worker::NormalizeWorker;

/// Normalizes on a web worker when the browser provides one, inline
/// on the calling thread otherwise.
///
/// Both arms run the same [`pano_pipeline::normalize`], so the result
/// does not depend on which one was picked.
pub enum BrowserNormalizer {
    Worker(NormalizeWorker),
    Inline,
}

impl BrowserNormalizer {
    /// Pick a strategy by capability check.
    ///
    /// Offloads only when `config.offload` is set, the `Worker` global
    /// exists and the worker can actually be started.
    #[must_use]
    pub fn select(worker_js: &str, worker_wasm: &[u8], config: &NormalizeConfig) -> Self {
        if !config.offload {
            tracing::info!("offload disabled; normalizing inline");
            return Self::Inline;
        }
        if !worker_supported() {
            tracing::info!("no Worker global; normalizing inline");
            return Self::Inline;
        }
        match NormalizeWorker::new(worker_js, worker_wasm) {
            Ok(worker) => {
                tracing::info!("normalizing on a web worker");
                Self::Worker(worker)
            }
            Err(e) => {
                tracing::warn!(error = ?e, "failed to start worker; normalizing inline");
                Self::Inline
            }
        }
    }

    /// Which strategy was picked.
    #[must_use]
    pub const fn kind(&self) -> StrategyKind {
        match self {
            Self::Worker(_) => StrategyKind::Offload,
            Self::Inline => StrategyKind::Inline,
        }
    }

    /// Normalize one source image.
    ///
    /// # Errors
    ///
    /// See [`pano_pipeline::normalize`]; the worker arm may also return
    /// [`NormalizeError::WorkerUnavailable`].
    #[allow(clippy::future_not_send)] // WASM is single-threaded; Send is not needed
    pub async fn normalize(
        &self,
        bytes: &[u8],
        config: &NormalizeConfig,
    ) -> Result<Normalized, NormalizeError> {
        match self {
            Self::Worker(worker) => worker.run(bytes, config).await,
            Self::Inline => pano_pipeline::normalize(bytes, config),
        }
    }
}

fn worker_supported() -> bool {
    js_sys::Reflect::has(&js_sys::global(), &JsValue::from_str("Worker")).unwrap_or(false)
}
