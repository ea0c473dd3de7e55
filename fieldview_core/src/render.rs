//! Per-frame render commands.
//!
//! The engine does no drawing. A frame is an ordered list of commands: every
//! projectable edge first, then every projectable node, each carrying the
//! data a render adapter needs to style it.

use crate::interaction::SelectionState;
use crate::model::{EdgeId, NodeCategory, NodeId, QuantumState, RelationKind, Snapshot};
use crate::projector::Projector;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDraw {
    pub id: EdgeId,
    pub kind: RelationKind,
    pub from: Vector2<f64>,
    pub to: Vector2<f64>,
    pub strength: f64,
    pub phase: f64,
    pub entangled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDraw {
    pub id: NodeId,
    pub category: NodeCategory,
    pub label: String,
    pub screen: Vector2<f64>,
    /// `zoom · f` at the node's depth
    pub scale: f64,
    pub quantum: QuantumState,
    pub selected: bool,
    pub hovered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "draw", rename_all = "snake_case")]
pub enum RenderCommand {
    Edge(EdgeDraw),
    Node(NodeDraw),
}

/// Builds the draw list for one snapshot under the current view.
pub fn build_frame(snapshot: &Snapshot, projector: &Projector, selection: &SelectionState) -> Vec<RenderCommand> {
    let mut commands = Vec::with_capacity(snapshot.edges.len() + snapshot.nodes.len());

    for edge in &snapshot.edges {
        let endpoints = snapshot
            .node(&edge.source)
            .zip(snapshot.node(&edge.target))
            .and_then(|(source, target)| {
                projector
                    .project(&source.position)
                    .zip(projector.project(&target.position))
            });
        if let Some((from, to)) = endpoints {
            commands.push(RenderCommand::Edge(EdgeDraw {
                id: edge.id.clone(),
                kind: edge.kind,
                from,
                to,
                strength: edge.strength,
                phase: edge.phase,
                entangled: edge.entangled,
            }));
        }
    }

    for node in &snapshot.nodes {
        let (Some(screen), Some(scale)) = (
            projector.project(&node.position),
            projector.scale_at(node.position.z),
        ) else {
            continue;
        };
        commands.push(RenderCommand::Node(NodeDraw {
            id: node.id.clone(),
            category: node.category,
            label: node.label.clone(),
            screen,
            scale,
            quantum: node.quantum,
            selected: selection.is_selected(&node.id),
            hovered: selection.is_hovered(&node.id),
        }));
    }

    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Dimensionality;
    use crate::model::{EdgeSpec, NodeSpec};
    use crate::projector::ProjectorConfig;
    use crate::store::EntityStore;

    fn store() -> EntityStore {
        let mut store = EntityStore::new();
        store
            .add_node(NodeSpec::new("user-1", NodeCategory::User, "Alice").at(100.0, 100.0, 0.0))
            .unwrap();
        store
            .add_node(NodeSpec::new("svc-1", NodeCategory::Service, "NetBird").at(300.0, 200.0, -900.0))
            .unwrap();
        store
            .add_node(NodeSpec::new("file-1", NodeCategory::Resource, "Report").at(200.0, 150.0, 0.0))
            .unwrap();
        store
            .add_edge(EdgeSpec::new("conn-1", "user-1", "svc-1", RelationKind::Network))
            .unwrap();
        store
            .add_edge(EdgeSpec::new("conn-2", "user-1", "file-1", RelationKind::Data).with_phase(1.5))
            .unwrap();
        store
    }

    #[test]
    fn test_edges_precede_nodes() {
        let projector = Projector::new(ProjectorConfig::default(), Dimensionality::Planar);
        let frame = build_frame(&store().snapshot(0), &projector, &SelectionState::default());

        assert_eq!(frame.len(), 5);
        assert!(matches!(frame[0], RenderCommand::Edge(_)));
        assert!(matches!(frame[1], RenderCommand::Edge(_)));
        assert!(frame[2..].iter().all(|c| matches!(c, RenderCommand::Node(_))));
    }

    #[test]
    fn test_unprojectable_entities_skipped() {
        let projector = Projector::new(ProjectorConfig::default(), Dimensionality::Spatial);
        let frame = build_frame(&store().snapshot(0), &projector, &SelectionState::default());

        // svc-1 sits behind the camera, taking conn-1 with it
        assert_eq!(frame.len(), 3);
        match &frame[0] {
            RenderCommand::Edge(edge) => {
                assert_eq!(edge.id, EdgeId::from("conn-2"));
                assert_eq!(edge.phase, 1.5);
            }
            other => panic!("expected edge, got {:?}", other),
        }
    }

    #[test]
    fn test_selection_flags_and_scale() {
        let mut projector = Projector::new(ProjectorConfig::default(), Dimensionality::Planar);
        projector.set_pan_zoom(Vector2::zeros(), 2.0).unwrap();
        let mut selection = SelectionState::default();
        selection.select(Some(NodeId::from("file-1")));

        let frame = build_frame(&store().snapshot(0), &projector, &selection);
        let file = frame
            .iter()
            .find_map(|c| match c {
                RenderCommand::Node(node) if node.id.as_str() == "file-1" => Some(node),
                _ => None,
            })
            .unwrap();

        assert!(file.selected);
        assert!(!file.hovered);
        assert_eq!(file.scale, 2.0);
        assert_eq!(file.screen, Vector2::new(400.0, 300.0));
    }
}
