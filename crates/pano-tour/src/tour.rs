//! The tour: scenes as graph nodes, linked hotspots as edges.
//!
//! A hotspot with a target is stored as an edge from its scene to the
//! target scene, so deleting a scene deletes every hotspot leading to
//! it in the same step. Hotspots without a target (pending navigation
//! points, info popups) stay on their scene's node. A sequence number
//! per hotspot restores placement order when a scene is read back.

use std::collections::HashMap;

use petgraph::Direction as EdgeDirection;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;

use crate::TourError;
use crate::hotspot::{Direction, Hotspot};
use crate::scene::Scene;

/// Next or previous scene in tour order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Next,
    Previous,
}

#[derive(Debug, Clone)]
struct Placed {
    seq: u64,
    hotspot: Hotspot,
}

#[derive(Debug, Clone)]
struct SceneNode {
    /// The scene with `hotspots` emptied.
    scene: Scene,
    unlinked: Vec<Placed>,
}

enum Location {
    Unlinked(usize),
    Edge(EdgeIndex),
}

/// An ordered collection of scenes connected by hotspots.
#[derive(Debug, Clone, Default)]
pub struct Tour {
    graph: StableDiGraph<SceneNode, Placed>,
    index: HashMap<String, NodeIndex>,
    /// Scene ids in insertion order.
    order: Vec<String>,
    current: Option<String>,
    next_seq: u64,
}

impl Tour {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Scene ids in tour order.
    pub fn scene_ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Add a scene and its hotspots. The first scene becomes current.
    ///
    /// # Errors
    ///
    /// [`TourError::DuplicateScene`] if the id is taken,
    /// [`TourError::UnknownScene`] if a hotspot targets a scene that is
    /// neither in the tour nor the scene itself, and
    /// [`TourError::DuplicateHotspot`] for repeated hotspot ids. Nothing
    /// is added on error.
    pub fn add_scene(&mut self, mut scene: Scene) -> Result<(), TourError> {
        if self.contains(&scene.id) {
            return Err(TourError::DuplicateScene(scene.id));
        }
        let hotspots = std::mem::take(&mut scene.hotspots);
        for (i, hotspot) in hotspots.iter().enumerate() {
            if let Some(target) = &hotspot.target
                && *target != scene.id
                && !self.contains(target)
            {
                return Err(TourError::UnknownScene(target.clone()));
            }
            if hotspots[..i].iter().any(|h| h.id == hotspot.id) {
                return Err(TourError::DuplicateHotspot {
                    scene: scene.id.clone(),
                    hotspot: hotspot.id.clone(),
                });
            }
        }

        let id = scene.id.clone();
        let node = self.graph.add_node(SceneNode {
            scene,
            unlinked: Vec::new(),
        });
        self.index.insert(id.clone(), node);
        self.order.push(id.clone());
        if self.current.is_none() {
            self.current = Some(id.clone());
        }
        for hotspot in hotspots {
            self.place(node, hotspot);
        }
        tracing::debug!(scene = %id, scenes = self.len(), "added scene");
        Ok(())
    }

    /// Make `id` the current scene.
    ///
    /// # Errors
    ///
    /// [`TourError::UnknownScene`] if `id` is not in the tour.
    pub fn set_current(&mut self, id: &str) -> Result<(), TourError> {
        self.node(id)?;
        self.current = Some(id.to_owned());
        Ok(())
    }

    /// Add a hotspot to `scene`.
    ///
    /// # Errors
    ///
    /// [`TourError::UnknownScene`] if `scene` or the hotspot's target is
    /// missing, [`TourError::DuplicateHotspot`] if the id is taken on
    /// that scene.
    pub fn add_hotspot(&mut self, scene: &str, hotspot: Hotspot) -> Result<(), TourError> {
        let node = self.node(scene)?;
        if let Some(target) = &hotspot.target {
            self.node(target)?;
        }
        if self.locate(node, &hotspot.id).is_some() {
            return Err(TourError::DuplicateHotspot {
                scene: scene.to_owned(),
                hotspot: hotspot.id,
            });
        }
        self.place(node, hotspot);
        Ok(())
    }

    /// Link hotspot `hotspot_id` on `scene` to `target`, replacing any
    /// previous target.
    ///
    /// # Errors
    ///
    /// [`TourError::UnknownScene`] for a missing scene or target,
    /// [`TourError::UnknownHotspot`] for a missing hotspot.
    pub fn link_hotspot(&mut self, scene: &str, hotspot_id: &str, target: &str) -> Result<(), TourError> {
        let node = self.node(scene)?;
        let target_node = self.node(target)?;
        let mut placed = self.take(node, scene, hotspot_id)?;
        placed.hotspot.link_to(target);
        self.graph.add_edge(node, target_node, placed);
        Ok(())
    }

    /// Replace a hotspot's label.
    ///
    /// # Errors
    ///
    /// [`TourError::UnknownScene`] or [`TourError::UnknownHotspot`].
    pub fn update_hotspot_label(
        &mut self,
        scene: &str,
        hotspot_id: &str,
        label: impl Into<String>,
    ) -> Result<(), TourError> {
        let node = self.node(scene)?;
        let hotspot = match self.locate(node, hotspot_id) {
            Some(Location::Unlinked(i)) => &mut self.graph[node].unlinked[i].hotspot,
            Some(Location::Edge(e)) => &mut self.graph[e].hotspot,
            None => return Err(unknown_hotspot(scene, hotspot_id)),
        };
        hotspot.label = Some(label.into());
        Ok(())
    }

    /// Remove a hotspot from `scene` and return it.
    ///
    /// # Errors
    ///
    /// [`TourError::UnknownScene`] or [`TourError::UnknownHotspot`].
    pub fn remove_hotspot(&mut self, scene: &str, hotspot_id: &str) -> Result<Hotspot, TourError> {
        let node = self.node(scene)?;
        Ok(self.take(node, scene, hotspot_id)?.hotspot)
    }

    /// Remove a scene, every hotspot on it and every hotspot leading to
    /// it. Returns the removed scene so the caller can release its image.
    ///
    /// If the current scene is removed, the first remaining scene
    /// becomes current.
    ///
    /// # Errors
    ///
    /// [`TourError::UnknownScene`] if `id` is missing,
    /// [`TourError::LastScene`] if it is the only scene.
    pub fn remove_scene(&mut self, id: &str) -> Result<Scene, TourError> {
        let node = self.node(id)?;
        if self.len() <= 1 {
            return Err(TourError::LastScene);
        }
        let removed = self.materialize(node);
        let incoming = self
            .graph
            .edges_directed(node, EdgeDirection::Incoming)
            .filter(|e| e.source() != node)
            .count();
        self.graph.remove_node(node);
        self.index.remove(id);
        self.order.retain(|s| s != id);
        if self.current.as_deref() == Some(id) {
            self.current = self.order.first().cloned();
        }
        tracing::debug!(scene = id, dropped_links = incoming, "removed scene");
        Ok(removed)
    }

    /// The scene one step from the current one, wrapping at both ends.
    #[must_use]
    pub fn adjacent(&self, step: Step) -> Option<&str> {
        let current = self.current.as_deref()?;
        let pos = self.order.iter().position(|s| s == current)?;
        let len = self.order.len();
        let next = match step {
            Step::Next => (pos + 1) % len,
            Step::Previous => (pos + len - 1) % len,
        };
        Some(self.order[next].as_str())
    }

    /// Target of the first linked hotspot on `scene` pointing in
    /// `direction`, for arrow controls.
    #[must_use]
    pub fn directional_target(&self, scene: &str, direction: Direction) -> Option<String> {
        self.hotspots(scene)
            .ok()?
            .into_iter()
            .find(|h| h.is_linked() && h.points(direction))
            .and_then(|h| h.target)
    }

    /// Hotspots of `scene` in placement order.
    ///
    /// # Errors
    ///
    /// [`TourError::UnknownScene`] if `scene` is missing.
    pub fn hotspots(&self, scene: &str) -> Result<Vec<Hotspot>, TourError> {
        Ok(self.placed(self.node(scene)?).into_iter().map(|p| p.hotspot).collect())
    }

    /// `(scene, hotspot id)` of every hotspot leading to `target`.
    #[must_use]
    pub fn links_into(&self, target: &str) -> Vec<(String, String)> {
        let Some(&node) = self.index.get(target) else {
            return Vec::new();
        };
        let mut links: Vec<_> = self
            .graph
            .edges_directed(node, EdgeDirection::Incoming)
            .map(|e| {
                (
                    e.weight().seq,
                    self.graph[e.source()].scene.id.clone(),
                    e.weight().hotspot.id.clone(),
                )
            })
            .collect();
        links.sort_by_key(|(seq, ..)| *seq);
        links.into_iter().map(|(_, scene, hotspot)| (scene, hotspot)).collect()
    }

    /// A full copy of scene `id`, hotspots included.
    #[must_use]
    pub fn scene(&self, id: &str) -> Option<Scene> {
        self.index.get(id).map(|&node| self.materialize(node))
    }

    /// Every scene in tour order.
    #[must_use]
    pub fn scenes(&self) -> Vec<Scene> {
        self.order
            .iter()
            .filter_map(|id| self.scene(id))
            .collect()
    }

    fn node(&self, id: &str) -> Result<NodeIndex, TourError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| TourError::UnknownScene(id.to_owned()))
    }

    fn place(&mut self, node: NodeIndex, hotspot: Hotspot) {
        let placed = Placed {
            seq: self.next_seq,
            hotspot,
        };
        self.next_seq += 1;
        let target = placed
            .hotspot
            .target
            .as_deref()
            .and_then(|t| self.index.get(t))
            .copied();
        match target {
            Some(target) => {
                self.graph.add_edge(node, target, placed);
            }
            None => {
                if placed.hotspot.target.is_some() {
                    tracing::warn!(hotspot = %placed.hotspot.id, "hotspot target missing, keeping unlinked");
                }
                self.graph[node].unlinked.push(placed);
            }
        }
    }

    fn locate(&self, node: NodeIndex, hotspot_id: &str) -> Option<Location> {
        if let Some(i) = self.graph[node]
            .unlinked
            .iter()
            .position(|p| p.hotspot.id == hotspot_id)
        {
            return Some(Location::Unlinked(i));
        }
        self.graph
            .edges_directed(node, EdgeDirection::Outgoing)
            .find(|e| e.weight().hotspot.id == hotspot_id)
            .map(|e| Location::Edge(e.id()))
    }

    fn take(&mut self, node: NodeIndex, scene: &str, hotspot_id: &str) -> Result<Placed, TourError> {
        match self.locate(node, hotspot_id) {
            Some(Location::Unlinked(i)) => Ok(self.graph[node].unlinked.remove(i)),
            Some(Location::Edge(e)) => self
                .graph
                .remove_edge(e)
                .ok_or_else(|| unknown_hotspot(scene, hotspot_id)),
            None => Err(unknown_hotspot(scene, hotspot_id)),
        }
    }

    fn placed(&self, node: NodeIndex) -> Vec<Placed> {
        let mut all: Vec<Placed> = self.graph[node].unlinked.clone();
        all.extend(
            self.graph
                .edges_directed(node, EdgeDirection::Outgoing)
                .map(|e| e.weight().clone()),
        );
        all.sort_by_key(|p| p.seq);
        all
    }

    fn materialize(&self, node: NodeIndex) -> Scene {
        let mut scene = self.graph[node].scene.clone();
        scene.hotspots = self.placed(node).into_iter().map(|p| p.hotspot).collect();
        scene
    }
}

fn unknown_hotspot(scene: &str, hotspot: &str) -> TourError {
    TourError::UnknownHotspot {
        scene: scene.to_owned(),
        hotspot: hotspot.to_owned(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pano_pipeline::SceneViewConfig;

    use super::*;
    use crate::scene::SceneType;

    fn scene(id: &str) -> Scene {
        Scene {
            id: id.to_owned(),
            title: id.to_uppercase(),
            image: format!("{id}.jpg"),
            scene_type: SceneType::Equirectangular,
            hotspots: Vec::new(),
            thumbnail: None,
            image_data: None,
            is_panorama: true,
            view: SceneViewConfig {
                haov: 360.0,
                vaov: 180.0,
                hfov: 100.0,
                v_offset: 0.0,
                bounds: None,
            },
        }
    }

    fn nav(id: &str, target: &str) -> Hotspot {
        let mut hs = Hotspot::pending_navigation(id, 0.0, 0.0);
        hs.link_to(target);
        hs
    }

    fn three() -> Tour {
        let mut tour = Tour::new();
        for id in ["a", "b", "c"] {
            tour.add_scene(scene(id)).unwrap();
        }
        tour
    }

    #[test]
    fn first_scene_becomes_current() {
        let tour = three();
        assert_eq!(tour.current(), Some("a"));
        assert_eq!(tour.scene_ids().collect::<Vec<_>>(), ["a", "b", "c"]);
    }

    #[test]
    fn duplicate_scene_is_rejected() {
        let mut tour = three();
        assert_eq!(tour.add_scene(scene("b")), Err(TourError::DuplicateScene("b".into())));
        assert_eq!(tour.len(), 3);
    }

    #[test]
    fn hotspot_to_unknown_scene_is_rejected() {
        let mut tour = three();
        assert_eq!(
            tour.add_hotspot("a", nav("h", "zzz")),
            Err(TourError::UnknownScene("zzz".into()))
        );
        let mut with_bad = scene("d");
        with_bad.hotspots.push(nav("h", "nowhere"));
        assert!(tour.add_scene(with_bad).is_err());
        assert!(!tour.contains("d"));
    }

    #[test]
    fn hotspots_keep_placement_order() {
        let mut tour = three();
        tour.add_hotspot("a", nav("to_b", "b")).unwrap();
        tour.add_hotspot("a", Hotspot::info("info", 1.0, 2.0, None)).unwrap();
        tour.add_hotspot("a", nav("to_c", "c")).unwrap();
        let ids: Vec<_> = tour.hotspots("a").unwrap().into_iter().map(|h| h.id).collect();
        assert_eq!(ids, ["to_b", "info", "to_c"]);
    }

    #[test]
    fn linking_pending_hotspot_keeps_its_position() {
        let mut tour = three();
        tour.add_hotspot("a", Hotspot::pending_navigation("p", 5.0, 6.0)).unwrap();
        tour.add_hotspot("a", nav("to_c", "c")).unwrap();
        tour.link_hotspot("a", "p", "b").unwrap();
        let hotspots = tour.hotspots("a").unwrap();
        assert_eq!(hotspots[0].id, "p");
        assert_eq!(hotspots[0].target.as_deref(), Some("b"));
        assert_eq!(hotspots[0].css_class.as_deref(), Some(crate::hotspot::LINKED_CSS_CLASS));
        assert_eq!(tour.links_into("b"), [("a".to_owned(), "p".to_owned())]);
    }

    #[test]
    fn removing_scene_removes_hotspots_into_it() {
        let mut tour = three();
        tour.add_hotspot("a", nav("a_to_b", "b")).unwrap();
        tour.add_hotspot("c", nav("c_to_b", "b")).unwrap();
        tour.add_hotspot("c", nav("c_to_a", "a")).unwrap();
        tour.add_hotspot("b", nav("b_to_a", "a")).unwrap();

        let removed = tour.remove_scene("b").unwrap();
        assert_eq!(removed.id, "b");
        assert_eq!(removed.hotspots.len(), 1);

        assert!(tour.hotspots("a").unwrap().is_empty());
        let c: Vec<_> = tour.hotspots("c").unwrap().into_iter().map(|h| h.id).collect();
        assert_eq!(c, ["c_to_a"]);
        assert_eq!(tour.links_into("a"), [("c".to_owned(), "c_to_a".to_owned())]);
        for scene in tour.scenes() {
            assert!(scene.hotspots.iter().all(|h| h.target.as_deref() != Some("b")));
        }
    }

    #[test]
    fn removing_last_scene_fails() {
        let mut tour = Tour::new();
        tour.add_scene(scene("only")).unwrap();
        assert_eq!(tour.remove_scene("only"), Err(TourError::LastScene));
        assert_eq!(tour.len(), 1);
    }

    #[test]
    fn removing_current_falls_back_to_first() {
        let mut tour = three();
        tour.set_current("a").unwrap();
        tour.remove_scene("a").unwrap();
        assert_eq!(tour.current(), Some("b"));
    }

    #[test]
    fn adjacent_wraps_both_ways() {
        let mut tour = three();
        assert_eq!(tour.adjacent(Step::Previous), Some("c"));
        assert_eq!(tour.adjacent(Step::Next), Some("b"));
        tour.set_current("c").unwrap();
        assert_eq!(tour.adjacent(Step::Next), Some("a"));
    }

    #[test]
    fn directional_target_uses_direction_or_yaw() {
        let mut tour = three();
        tour.add_hotspot(
            "b",
            Hotspot::street_view("fwd", 0.0, 0.0, "c", Direction::Forward),
        )
        .unwrap();
        let mut behind = nav("back", "a");
        behind.yaw = -120.0;
        tour.add_hotspot("b", behind).unwrap();
        assert_eq!(tour.directional_target("b", Direction::Forward).as_deref(), Some("c"));
        assert_eq!(tour.directional_target("b", Direction::Backward).as_deref(), Some("a"));
        assert_eq!(tour.directional_target("a", Direction::Forward), None);
    }

    #[test]
    fn label_update_and_hotspot_removal() {
        let mut tour = three();
        tour.add_hotspot("a", nav("h", "b")).unwrap();
        tour.update_hotspot_label("a", "h", "Kitchen").unwrap();
        assert_eq!(tour.hotspots("a").unwrap()[0].label.as_deref(), Some("Kitchen"));
        let removed = tour.remove_hotspot("a", "h").unwrap();
        assert_eq!(removed.label.as_deref(), Some("Kitchen"));
        assert!(matches!(
            tour.remove_hotspot("a", "h"),
            Err(TourError::UnknownHotspot { .. })
        ));
        assert!(tour.links_into("b").is_empty());
    }

    #[test]
    fn self_link_survives() {
        let mut tour = three();
        let mut looped = scene("d");
        looped.hotspots.push(nav("spin", "d"));
        tour.add_scene(looped).unwrap();
        assert_eq!(tour.links_into("d"), [("d".to_owned(), "spin".to_owned())]);
    }
}
