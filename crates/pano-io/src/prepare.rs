//! Upload-to-scene orchestration.

use pano_pipeline::NormalizeConfig;
use pano_tour::{Scene, SceneSpec, scene_id, upload_title};

use crate::BrowserError;
use crate::blob::{bytes_to_blob_url, revoke_blob_url};
use crate::normalizer::BrowserNormalizer;

/// Turn one uploaded file into a scene ready to add to a tour.
///
/// Steps: upload check, pre-upload compression, normalization, image
/// URL, thumbnail URL. The thumbnail is drawn from the normalized image. The scene is titled after the `existing_scenes`
/// already in the tour and its id comes from the current time.
///
/// On failure no scene is produced and any object URL already created
/// has been revoked. On success the scene owns its URLs; release them
/// with [`release_scene_urls`] when the scene is removed.
///
/// # Errors
///
/// [`BrowserError::Normalize`] if the upload is rejected or any
/// pipeline step fails, [`BrowserError::JsError`] if a URL cannot be
/// created.
#[allow(clippy::future_not_send)] // WASM is single-threaded; Send is not needed
pub async fn prepare_scene(
    normalizer: &BrowserNormalizer,
    bytes: &[u8],
    name: &str,
    media_type: Option<&str>,
    config: &NormalizeConfig,
    existing_scenes: usize,
) -> Result<Scene, BrowserError> {
    pano_pipeline::check_upload(bytes, name, media_type, config)?;
    let compressed = pano_pipeline::compress_for_upload(bytes, config)?;
    let normalized = normalizer.normalize(&compressed.image.bytes, config).await?;
    tracing::debug!(
        file = name,
        strategy = %normalizer.kind(),
        width = normalized.image.width,
        height = normalized.image.height,
        stretched = normalized.stretched,
        "normalized upload"
    );
    let thumbnail = pano_pipeline::thumbnail::scene_thumbnail(&normalized)?;

    let image_url = bytes_to_blob_url(&normalized.image.bytes, &normalized.image.media_type)?;
    let thumbnail_url = match bytes_to_blob_url(&thumbnail.bytes, &thumbnail.media_type) {
        Ok(url) => url,
        Err(e) => {
            revoke_blob_url(&image_url);
            return Err(e);
        }
    };

    let spec = SceneSpec::new(scene_id(now_ms()), upload_title(existing_scenes), image_url)
        .with_thumbnail(thumbnail_url);
    Ok(Scene::from_normalized(spec, &normalized))
}

/// Revoke the object URLs a prepared scene holds.
pub fn release_scene_urls(scene: &Scene) {
    revoke_blob_url(&scene.image);
    if let Some(thumbnail) = &scene.thumbnail {
        revoke_blob_url(thumbnail);
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn now_ms() -> u128 {
    js_sys::Date::now() as u128
}
