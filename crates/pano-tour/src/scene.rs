//! Scene builder: assemble a viewer scene from normalization output.
//!
//! A scene only ever copies geometry it is given. The view
//! configuration comes from [`pano_pipeline::compute_view_config`] over
//! the same [`PanoramaGeometry`] the normalizer produced.

use pano_pipeline::{ImageAnalysis, Normalized, PanoramaGeometry, SceneViewConfig};
use serde::{Deserialize, Serialize};

use crate::hotspot::Hotspot;

/// Projection of a scene's source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneType {
    #[default]
    Equirectangular,
    Cubemap,
}

/// Caller-supplied parts of a scene.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneSpec {
    pub id: String,
    pub title: String,
    /// Image reference handed to the viewer: object URL, path or data URL.
    pub image: String,
    pub thumbnail: Option<String>,
    /// Inherited hotspots; usually empty for a fresh upload.
    pub hotspots: Vec<Hotspot>,
}

impl SceneSpec {
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image: image.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }
}

/// A viewer scene descriptor.
///
/// The view configuration is flattened, so the JSON carries `haov`,
/// `vaov`, `hfov`, `vOffset` and (for non-panoramas) the navigation
/// limits at the top level next to `id` and `image`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: String,
    pub title: String,
    pub image: String,
    #[serde(rename = "type", default)]
    pub scene_type: SceneType,
    #[serde(default)]
    pub hotspots: Vec<Hotspot>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Geometry of the normalized image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<PanoramaGeometry>,
    /// Whether the source was a true panorama.
    #[serde(default)]
    pub is_panorama: bool,
    #[serde(flatten)]
    pub view: SceneViewConfig,
}

/// Assemble a scene from values already produced by the pipeline.
#[must_use]
pub fn build_scene(spec: SceneSpec, analysis: &ImageAnalysis, geometry: &PanoramaGeometry) -> Scene {
    Scene {
        id: spec.id,
        title: spec.title,
        image: spec.image,
        scene_type: SceneType::Equirectangular,
        hotspots: spec.hotspots,
        thumbnail: spec.thumbnail,
        image_data: Some(*geometry),
        is_panorama: analysis.is_panorama,
        view: pano_pipeline::compute_view_config(analysis.is_panorama, geometry),
    }
}

impl Scene {
    /// Shortcut for [`build_scene`] over a normalization result.
    #[must_use]
    pub fn from_normalized(spec: SceneSpec, normalized: &Normalized) -> Self {
        build_scene(spec, &normalized.analysis, &normalized.geometry)
    }

    /// Whether the viewer may look around freely.
    #[must_use]
    pub const fn is_free_look(&self) -> bool {
        self.view.is_free_look()
    }
}

/// Title for the `n`-th uploaded scene when `existing` scenes exist.
#[must_use]
pub fn upload_title(existing: usize) -> String {
    format!("View {}", existing + 1)
}

/// Scene id derived from a millisecond timestamp.
#[must_use]
pub fn scene_id(timestamp_ms: u128) -> String {
    format!("scene_{timestamp_ms}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn wide() -> (ImageAnalysis, PanoramaGeometry) {
        let analysis = pano_pipeline::classify(4000, 1000).unwrap();
        let geometry =
            pano_pipeline::panorama_geometry(&analysis, pano_pipeline::RoundingMode::default());
        (analysis, geometry)
    }

    #[test]
    fn scene_carries_geometry_unchanged() {
        let (analysis, geometry) = wide();
        let scene = build_scene(SceneSpec::new("scene_1", "View 1", "blob:x"), &analysis, &geometry);
        assert_eq!(scene.image_data, Some(geometry));
        assert!(!scene.is_panorama);
        assert_eq!(
            scene.view,
            pano_pipeline::compute_view_config(false, &geometry)
        );
        assert!(scene.hotspots.is_empty());
    }

    #[test]
    fn panorama_scene_is_free_look() {
        let analysis = pano_pipeline::classify(4096, 2048).unwrap();
        let geometry =
            pano_pipeline::panorama_geometry(&analysis, pano_pipeline::RoundingMode::default());
        let scene = build_scene(SceneSpec::new("p", "Pano", "pano.jpg"), &analysis, &geometry);
        assert!(scene.is_panorama);
        assert!(scene.is_free_look());
    }

    #[test]
    fn json_has_flat_viewer_keys() {
        let (analysis, geometry) = wide();
        let scene = build_scene(
            SceneSpec::new("scene_1", "View 1", "blob:x").with_thumbnail("data:image/png;base64,"),
            &analysis,
            &geometry,
        );
        let json = serde_json::to_value(&scene).unwrap();
        assert_eq!(json["type"], "equirectangular");
        assert_eq!(json["haov"], 360.0);
        assert_eq!(json["vaov"], 90.0);
        assert_eq!(json["maxPitch"], 45.0);
        assert_eq!(json["imageData"]["panoHeight"], 1024);
        assert_eq!(json["isPanorama"], false);
        let back: Scene = serde_json::from_value(json).unwrap();
        assert_eq!(back, scene);
    }

    #[test]
    fn legacy_scene_json_deserializes() {
        let scene: Scene = serde_json::from_str(
            r#"{"id":"roomA","title":"Living Room","image":"alma.jpg","hotspots":[],
                "type":"equirectangular","isPanorama":true,"thumbnail":null,
                "haov":360,"vaov":180,"hfov":100,"vOffset":0}"#,
        )
        .unwrap();
        assert!(scene.is_free_look());
        assert!(scene.image_data.is_none());
    }

    #[test]
    fn upload_naming() {
        assert_eq!(upload_title(2), "View 3");
        assert_eq!(scene_id(1_700_000_000_000), "scene_1700000000000");
    }
}
