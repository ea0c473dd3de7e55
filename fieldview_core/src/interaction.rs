//! Pointer hit-testing and selection/hover state.

use crate::error::ConfigError;
use crate::model::{NodeId, Snapshot};
use crate::projector::Projector;
use nalgebra::Vector2;

/// Default hit radius in plane units.
pub const DEFAULT_HIT_RADIUS: f64 = 25.0;

/// Maps a render-space pointer coordinate back to a node.
#[derive(Debug, Clone, Copy)]
pub struct InteractionResolver {
    hit_radius: f64,
}

impl Default for InteractionResolver {
    fn default() -> Self {
        Self {
            hit_radius: DEFAULT_HIT_RADIUS,
        }
    }
}

impl InteractionResolver {
    pub fn new(hit_radius: f64) -> Result<Self, ConfigError> {
        if !(hit_radius.is_finite() && hit_radius > 0.0) {
            return Err(ConfigError::InvalidHitRadius(hit_radius));
        }
        Ok(Self { hit_radius })
    }

    pub fn hit_radius(&self) -> f64 {
        self.hit_radius
    }

    /// Nearest node whose projected center lies strictly within the hit
    /// radius of `screen`, after undoing pan and zoom.
    ///
    /// Ties go to the node that comes first in store order. Nodes behind the
    /// camera are never hit.
    pub fn pick(&self, snapshot: &Snapshot, projector: &Projector, screen: Vector2<f64>) -> Option<NodeId> {
        let pointer = projector.screen_to_plane(&screen);

        let mut best: Option<(f64, &NodeId)> = None;
        for node in &snapshot.nodes {
            let Some(center) = projector.to_plane(&node.position) else {
                continue;
            };
            let distance = (center - pointer).norm();
            if distance >= self.hit_radius {
                continue;
            }
            match best {
                Some((closest, _)) if closest <= distance => {}
                _ => best = Some((distance, &node.id)),
            }
        }
        best.map(|(_, id)| id.clone())
    }
}

/// Currently selected and hovered node ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    selected: Option<NodeId>,
    hovered: Option<NodeId>,
}

impl SelectionState {
    pub fn selected(&self) -> Option<&NodeId> {
        self.selected.as_ref()
    }

    pub fn hovered(&self) -> Option<&NodeId> {
        self.hovered.as_ref()
    }

    pub fn is_selected(&self, id: &NodeId) -> bool {
        self.selected.as_ref() == Some(id)
    }

    pub fn is_hovered(&self, id: &NodeId) -> bool {
        self.hovered.as_ref() == Some(id)
    }

    /// Returns true if the selection changed.
    pub fn select(&mut self, id: Option<NodeId>) -> bool {
        if self.selected == id {
            return false;
        }
        self.selected = id;
        true
    }

    /// Returns true if the hover target changed.
    pub fn hover(&mut self, id: Option<NodeId>) -> bool {
        if self.hovered == id {
            return false;
        }
        self.hovered = id;
        true
    }

    /// Clears any reference to a removed node.
    /// Returns `(selection_changed, hover_changed)`.
    pub fn forget(&mut self, id: &NodeId) -> (bool, bool) {
        let selection_changed = self.is_selected(id) && self.select(None);
        let hover_changed = self.is_hovered(id) && self.hover(None);
        (selection_changed, hover_changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Dimensionality;
    use crate::model::{NodeCategory, NodeSpec};
    use crate::projector::ProjectorConfig;
    use crate::store::EntityStore;

    fn snapshot() -> Snapshot {
        let mut store = EntityStore::new();
        store
            .add_node(NodeSpec::new("user-1", NodeCategory::User, "Alice").at(100.0, 100.0, 0.0))
            .unwrap();
        store
            .add_node(NodeSpec::new("device-1", NodeCategory::Device, "Laptop").at(120.0, 100.0, 0.0))
            .unwrap();
        store
            .add_node(NodeSpec::new("device-2", NodeCategory::Device, "Phone").at(120.0, 100.0, 0.0))
            .unwrap();
        store.snapshot(0)
    }

    fn planar() -> Projector {
        Projector::new(ProjectorConfig::default(), Dimensionality::Planar)
    }

    #[test]
    fn test_click_on_center_selects() {
        let resolver = InteractionResolver::default();
        let hit = resolver.pick(&snapshot(), &planar(), Vector2::new(100.0, 100.0));
        assert_eq!(hit, Some(NodeId::from("user-1")));
    }

    #[test]
    fn test_far_click_misses() {
        let resolver = InteractionResolver::default();
        let hit = resolver.pick(&snapshot(), &planar(), Vector2::new(1100.0, 100.0));
        assert_eq!(hit, None);
    }

    #[test]
    fn test_nearest_wins_over_first() {
        let resolver = InteractionResolver::default();
        // Within radius of both; closer to the devices
        let hit = resolver.pick(&snapshot(), &planar(), Vector2::new(112.0, 100.0));
        assert_eq!(hit, Some(NodeId::from("device-1")));
    }

    #[test]
    fn test_radius_is_strict() {
        let resolver = InteractionResolver::new(20.0).unwrap();
        let hit = resolver.pick(&snapshot(), &planar(), Vector2::new(100.0, 80.0));
        assert_eq!(hit, None);
    }

    #[test]
    fn test_pick_undoes_pan_zoom() {
        let mut projector = planar();
        projector.set_pan_zoom(Vector2::new(50.0, 0.0), 2.0).unwrap();
        let resolver = InteractionResolver::default();

        // user-1 renders at ((100 + 50) * 2, 100 * 2)
        let hit = resolver.pick(&snapshot(), &projector, Vector2::new(300.0, 200.0));
        assert_eq!(hit, Some(NodeId::from("user-1")));
    }

    #[test]
    fn test_selection_reports_changes() {
        let mut selection = SelectionState::default();
        assert!(selection.select(Some(NodeId::from("a"))));
        assert!(!selection.select(Some(NodeId::from("a"))));
        assert!(selection.hover(Some(NodeId::from("a"))));

        assert_eq!(selection.forget(&NodeId::from("b")), (false, false));
        assert_eq!(selection.forget(&NodeId::from("a")), (true, true));
        assert_eq!(selection.selected(), None);
    }
}
