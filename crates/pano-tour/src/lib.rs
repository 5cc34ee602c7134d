//! pano-tour: scene descriptors and virtual tours over normalized
//! panoramas (sans-IO).
//!
//! [`build_scene`] turns normalization output into a viewer scene.
//! [`Tour`] keeps scenes and the hotspots between them consistent, and
//! [`SavedTour`] is its JSON form.

pub mod hotspot;
pub mod saved;
pub mod scene;
pub mod tour;

pub use hotspot::{Direction, Hotspot, HotspotType};
pub use saved::{EXPORT_FILENAME, SAVED_TOUR_VERSION, SavedTour};
pub use scene::{Scene, SceneSpec, SceneType, build_scene, scene_id, upload_title};
pub use tour::{Step, Tour};

/// Errors from tour editing and loading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TourError {
    #[error("scene already exists: {0}")]
    DuplicateScene(String),

    #[error("no such scene: {0}")]
    UnknownScene(String),

    #[error("hotspot {hotspot} already exists on scene {scene}")]
    DuplicateHotspot { scene: String, hotspot: String },

    #[error("no hotspot {hotspot} on scene {scene}")]
    UnknownHotspot { scene: String, hotspot: String },

    /// A tour always keeps at least one scene.
    #[error("cannot remove the last scene")]
    LastScene,

    #[error("unsupported saved tour version: {0}")]
    UnsupportedVersion(String),

    #[error("invalid tour JSON: {0}")]
    Json(String),
}

impl From<serde_json::Error> for TourError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}
