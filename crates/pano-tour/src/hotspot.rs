//! Hotspots: clickable points placed on a scene.

use serde::{Deserialize, Serialize};

/// CSS class of a navigation hotspot that has no target yet.
pub const PENDING_CSS_CLASS: &str = "custom-hotspot white-hotspot";
/// CSS class of a navigation hotspot once linked to a scene.
pub const LINKED_CSS_CLASS: &str = "custom-hotspot";

/// Default body of an info hotspot.
pub const DEFAULT_INFO_CONTENT: &str = "Information point";

/// What clicking a hotspot does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HotspotType {
    /// Jump to another scene.
    #[default]
    Navigation,
    /// Show an information popup.
    Info,
    Video,
    /// Directional arrow between neighbouring scenes.
    StreetView,
}

/// Travel direction of a street-view hotspot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

/// A point on a scene, in viewer coordinates (degrees).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    pub id: String,
    pub pitch: f64,
    pub yaw: f64,
    #[serde(rename = "type", default)]
    pub kind: HotspotType,
    /// Scene id this hotspot leads to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
}

impl Hotspot {
    /// A bare hotspot of `kind` at `(pitch, yaw)`.
    #[must_use]
    pub fn new(id: impl Into<String>, pitch: f64, yaw: f64, kind: HotspotType) -> Self {
        Self {
            id: id.into(),
            pitch,
            yaw,
            kind,
            target: None,
            label: None,
            css_class: None,
            icon: None,
            content: None,
            direction: None,
        }
    }

    /// A navigation hotspot placed on the viewer but not linked yet.
    #[must_use]
    pub fn pending_navigation(id: impl Into<String>, pitch: f64, yaw: f64) -> Self {
        Self {
            label: Some(String::new()),
            css_class: Some(PENDING_CSS_CLASS.to_owned()),
            ..Self::new(id, pitch, yaw, HotspotType::Navigation)
        }
    }

    /// An info hotspot; `content` defaults to [`DEFAULT_INFO_CONTENT`].
    #[must_use]
    pub fn info(id: impl Into<String>, pitch: f64, yaw: f64, content: Option<String>) -> Self {
        Self {
            label: Some("Info".to_owned()),
            content: Some(content.unwrap_or_else(|| DEFAULT_INFO_CONTENT.to_owned())),
            ..Self::new(id, pitch, yaw, HotspotType::Info)
        }
    }

    /// A street-view arrow towards `target`.
    #[must_use]
    pub fn street_view(
        id: impl Into<String>,
        pitch: f64,
        yaw: f64,
        target: impl Into<String>,
        direction: Direction,
    ) -> Self {
        let css = match direction {
            Direction::Forward => "street-view-hotspot forward",
            Direction::Backward => "street-view-hotspot backward",
        };
        Self {
            target: Some(target.into()),
            css_class: Some(css.to_owned()),
            direction: Some(direction),
            ..Self::new(id, pitch, yaw, HotspotType::StreetView)
        }
    }

    /// Point this hotspot at `target` and drop the pending marker.
    pub fn link_to(&mut self, target: impl Into<String>) {
        self.target = Some(target.into());
        if self.kind == HotspotType::Navigation {
            self.css_class = Some(LINKED_CSS_CLASS.to_owned());
        }
    }

    #[must_use]
    pub const fn is_linked(&self) -> bool {
        self.target.is_some()
    }

    /// Whether an arrow control for `direction` should use this hotspot:
    /// an explicit direction, or a yaw beyond ±90°.
    #[must_use]
    pub fn points(&self, direction: Direction) -> bool {
        match direction {
            Direction::Forward => self.direction == Some(Direction::Forward) || self.yaw > 90.0,
            Direction::Backward => {
                self.direction == Some(Direction::Backward) || self.yaw < -90.0
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn pending_hotspot_is_white_until_linked() {
        let mut hs = Hotspot::pending_navigation("hs_1", 3.0, 40.0);
        assert!(!hs.is_linked());
        assert_eq!(hs.css_class.as_deref(), Some(PENDING_CSS_CLASS));
        hs.link_to("scene_2");
        assert!(hs.is_linked());
        assert_eq!(hs.css_class.as_deref(), Some(LINKED_CSS_CLASS));
    }

    #[test]
    fn info_hotspot_defaults() {
        let hs = Hotspot::info("info_1", 0.0, 0.0, None);
        assert_eq!(hs.kind, HotspotType::Info);
        assert_eq!(hs.content.as_deref(), Some(DEFAULT_INFO_CONTENT));
        assert_eq!(hs.label.as_deref(), Some("Info"));
    }

    #[test]
    fn serializes_with_viewer_keys() {
        let hs = Hotspot::street_view("forward_1", 0.0, 0.0, "roomB", Direction::Forward);
        let json = serde_json::to_value(&hs).unwrap();
        assert_eq!(json["type"], "street-view");
        assert_eq!(json["direction"], "forward");
        assert_eq!(json["cssClass"], "street-view-hotspot forward");
        assert!(json.get("content").is_none());
    }

    #[test]
    fn minimal_json_deserializes() {
        let hs: Hotspot =
            serde_json::from_str(r#"{"id":"toRoomB","pitch":10,"yaw":120,"target":"roomB"}"#)
                .unwrap();
        assert_eq!(hs.kind, HotspotType::Navigation);
        assert_eq!(hs.target.as_deref(), Some("roomB"));
    }

    #[test]
    fn direction_from_yaw_or_tag() {
        assert!(Hotspot::new("a", 0.0, 120.0, HotspotType::Navigation).points(Direction::Forward));
        assert!(Hotspot::new("b", 0.0, -135.0, HotspotType::Navigation).points(Direction::Backward));
        assert!(!Hotspot::new("c", 0.0, 45.0, HotspotType::Navigation).points(Direction::Forward));
        let back = Hotspot::street_view("d", 0.0, 180.0, "x", Direction::Backward);
        assert!(back.points(Direction::Backward));
    }
}
