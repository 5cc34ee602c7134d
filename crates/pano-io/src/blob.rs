//! Object URLs for encoded images.
//!
//! URLs created here hold the image in browser memory until revoked.
//! Whoever stores the URL (usually a scene) is responsible for handing
//! it to [`revoke_blob_url`] once it is no longer displayed.

use web_sys::BlobPropertyBag;

use crate::BrowserError;

/// Wrap encoded file bytes in a `Blob` and return its object URL.
///
/// # Errors
///
/// Returns [`BrowserError::JsError`] if Blob or URL creation fails.
pub fn bytes_to_blob_url(bytes: &[u8], media_type: &str) -> Result<String, BrowserError> {
    let array = js_sys::Uint8Array::from(bytes);
    let parts = js_sys::Array::new();
    parts.push(&array);

    let opts = BlobPropertyBag::new();
    opts.set_type(media_type);
    let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &opts)?;

    Ok(web_sys::Url::create_object_url_with_blob(&blob)?)
}

/// Revoke a URL from [`bytes_to_blob_url`].
///
/// The URL becomes invalid immediately after this call. Non-blob URLs
/// are ignored.
pub fn revoke_blob_url(url: &str) {
    if url.starts_with("blob:") {
        let _ = web_sys::Url::revoke_object_url(url);
    }
}
