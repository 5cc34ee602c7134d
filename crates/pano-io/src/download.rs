//! Tour export as a file download.
//!
//! Browsers only save files on a user-visible link, so the bytes go
//! into an object URL from [`crate::blob`] and a `<a download>` link to
//! it is clicked on the user's behalf.

use pano_tour::{EXPORT_FILENAME, SavedTour, TourError};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlAnchorElement};

use crate::BrowserError;
use crate::blob::{bytes_to_blob_url, revoke_blob_url};

/// Media type of an exported tour.
pub const TOUR_MEDIA_TYPE: &str = "application/json";

/// Errors from exporting a tour.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// The tour could not be serialized.
    #[error(transparent)]
    Tour(#[from] TourError),

    /// Not running in a page with a `<body>`, e.g. inside a worker.
    #[error("downloads need a document body")]
    NoDocument,

    #[error(transparent)]
    Browser(#[from] BrowserError),
}

impl From<JsValue> for DownloadError {
    fn from(value: JsValue) -> Self {
        Self::Browser(value.into())
    }
}

/// Offer `saved` to the user as `virtual-tour.json`.
///
/// # Errors
///
/// [`DownloadError::Tour`] if serialization fails, otherwise see
/// [`trigger_download`].
pub fn download_tour(saved: &SavedTour) -> Result<(), DownloadError> {
    let json = saved.to_json_pretty()?;
    trigger_download(json.as_bytes(), EXPORT_FILENAME, TOUR_MEDIA_TYPE)
}

/// Save `bytes` as `filename` through the browser's download flow.
///
/// The object URL lives only for the click, whether or not it succeeds.
///
/// # Errors
///
/// [`DownloadError::NoDocument`] outside a page, and
/// [`DownloadError::Browser`] if the URL or the link cannot be created.
pub fn trigger_download(bytes: &[u8], filename: &str, media_type: &str) -> Result<(), DownloadError> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or(DownloadError::NoDocument)?;
    let url = bytes_to_blob_url(bytes, media_type)?;
    let clicked = click_link(&document, &url, filename);
    revoke_blob_url(&url);
    clicked
}

fn click_link(document: &Document, url: &str, filename: &str) -> Result<(), DownloadError> {
    let body = document.body().ok_or(DownloadError::NoDocument)?;
    let link = document
        .create_element("a")?
        .dyn_into::<HtmlAnchorElement>()
        .map_err(|_| BrowserError::JsError("<a> is not an HtmlAnchorElement".into()))?;
    link.set_href(url);
    link.set_download(filename);

    // Firefox ignores clicks on detached links.
    body.append_child(&link)?;
    link.click();
    link.remove();
    tracing::debug!(filename, "download started");
    Ok(())
}
