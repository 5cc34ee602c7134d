//! Saved-tour JSON: the persisted form of a [`Tour`].

use serde::{Deserialize, Serialize};

use crate::TourError;
use crate::scene::Scene;
use crate::tour::Tour;

/// Format version written by [`Tour::to_saved`].
pub const SAVED_TOUR_VERSION: &str = "1.0";

/// File name used when exporting a tour.
pub const EXPORT_FILENAME: &str = "virtual-tour.json";

/// A tour as written to disk or storage.
///
/// `scenes` is an array so the navigation order survives a round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTour {
    pub version: String,
    /// RFC 3339 timestamp supplied by the caller.
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_scene: Option<String>,
    pub scenes: Vec<Scene>,
}

impl SavedTour {
    /// Parse a saved tour.
    ///
    /// # Errors
    ///
    /// [`TourError::Json`] for malformed input.
    pub fn from_json(json: &str) -> Result<Self, TourError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Pretty-printed JSON, as exported to a file.
    ///
    /// # Errors
    ///
    /// [`TourError::Json`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, TourError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Tour {
    /// Snapshot the tour for saving.
    #[must_use]
    pub fn to_saved(&self, created_at: impl Into<String>) -> SavedTour {
        SavedTour {
            version: SAVED_TOUR_VERSION.to_owned(),
            created_at: created_at.into(),
            current_scene: self.current().map(str::to_owned),
            scenes: self.scenes(),
        }
    }

    /// Rebuild a tour from a saved snapshot.
    ///
    /// Hotspots pointing at scenes missing from the snapshot are dropped
    /// with a warning. The saved current scene is restored when present,
    /// otherwise the first scene is current.
    ///
    /// # Errors
    ///
    /// [`TourError::UnsupportedVersion`] for any version other than
    /// [`SAVED_TOUR_VERSION`], [`TourError::DuplicateScene`] if two
    /// scenes share an id.
    pub fn from_saved(saved: SavedTour) -> Result<Self, TourError> {
        if saved.version != SAVED_TOUR_VERSION {
            return Err(TourError::UnsupportedVersion(saved.version));
        }

        let known: std::collections::HashSet<String> =
            saved.scenes.iter().map(|s| s.id.clone()).collect();
        let mut tour = Self::new();
        let mut deferred = Vec::with_capacity(saved.scenes.len());
        for mut scene in saved.scenes {
            let hotspots = std::mem::take(&mut scene.hotspots);
            deferred.push((scene.id.clone(), hotspots));
            tour.add_scene(scene)?;
        }

        for (scene, hotspots) in deferred {
            for hotspot in hotspots {
                if let Some(target) = hotspot.target.as_deref()
                    && !known.contains(target)
                {
                    tracing::warn!(
                        scene = %scene,
                        hotspot = %hotspot.id,
                        target,
                        "dropping hotspot with dangling target"
                    );
                    continue;
                }
                match tour.add_hotspot(&scene, hotspot) {
                    Ok(()) => {}
                    Err(TourError::DuplicateHotspot { scene, hotspot }) => {
                        tracing::warn!(%scene, %hotspot, "dropping duplicate hotspot");
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        if let Some(current) = saved.current_scene.as_deref()
            && tour.contains(current)
        {
            tour.set_current(current)?;
        }
        Ok(tour)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const LEGACY: &str = r#"{
        "version": "1.0",
        "createdAt": "2026-01-02T03:04:05Z",
        "scenes": [
            {"id":"roomA","title":"Living Room","image":"alma.jpg","type":"equirectangular",
             "isPanorama":true,"thumbnail":null,"haov":360,"vaov":180,"hfov":100,"vOffset":0,
             "hotspots":[{"id":"forward_1","pitch":0,"yaw":0,"target":"roomB","type":"street-view",
                          "direction":"forward","cssClass":"street-view-hotspot forward"},
                         {"id":"ghost","pitch":0,"yaw":0,"target":"gone"}]},
            {"id":"roomB","title":"Bedroom","image":"milan.jpg","type":"equirectangular",
             "isPanorama":true,"thumbnail":null,"haov":360,"vaov":180,"hfov":100,"vOffset":0,
             "hotspots":[{"id":"backward_1","pitch":0,"yaw":180,"target":"roomA",
                          "type":"street-view","direction":"backward"}]}
        ]
    }"#;

    #[test]
    fn loads_forward_references_and_drops_dangling() {
        let tour = Tour::from_saved(SavedTour::from_json(LEGACY).unwrap()).unwrap();
        assert_eq!(tour.current(), Some("roomA"));
        let a = tour.hotspots("roomA").unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].id, "forward_1");
        assert_eq!(tour.links_into("roomA"), [("roomB".to_owned(), "backward_1".to_owned())]);
    }

    #[test]
    fn rejects_unknown_version() {
        let mut saved = SavedTour::from_json(LEGACY).unwrap();
        saved.version = "2.0".into();
        assert_eq!(
            Tour::from_saved(saved).unwrap_err(),
            TourError::UnsupportedVersion("2.0".into())
        );
    }

    #[test]
    fn saved_current_scene_is_restored() {
        let mut saved = SavedTour::from_json(LEGACY).unwrap();
        saved.current_scene = Some("roomB".into());
        assert_eq!(Tour::from_saved(saved).unwrap().current(), Some("roomB"));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        assert!(matches!(SavedTour::from_json("{"), Err(TourError::Json(_))));
    }

    #[test]
    fn export_is_pretty_json_with_version() {
        let tour = Tour::from_saved(SavedTour::from_json(LEGACY).unwrap()).unwrap();
        let json = tour.to_saved("2026-10-14T00:00:00Z").to_json_pretty().unwrap();
        assert!(json.contains("\n"));
        assert!(json.contains("\"version\": \"1.0\""));
        assert!(json.contains("\"createdAt\": \"2026-10-14T00:00:00Z\""));
    }
}
