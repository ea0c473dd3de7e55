//! Commands accepted by the engine and events it emits.
//!
//! Both sides are plain data so hosts can queue, log or serialize them.

use crate::model::{EdgeId, EdgeSpec, NodeId, NodeSpec, Snapshot};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// =============================================================================
// COMMANDS
// =============================================================================

/// Where a reset takes its state from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetSource {
    /// Replace the state with a caller-supplied snapshot (revalidated).
    Snapshot(Box<Snapshot>),
    /// Keep the entities, scatter them from this seed and restart the clock.
    Seed(u64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Command {
    AddNode(NodeSpec),
    RemoveNode(NodeId),
    AddEdge(EdgeSpec),
    RemoveEdge(EdgeId),
    SetPlaying(bool),
    TogglePlaying,
    Reset(ResetSource),
    SetPanZoom { pan: Vector2<f64>, zoom: f64 },
    ZoomIn,
    ZoomOut,
    CenterView,
    /// Screen coordinate of a click
    PointerClick(Vector2<f64>),
    /// Screen coordinate of the pointer
    PointerMove(Vector2<f64>),
    RandomizePositions(u64),
}

/// Synchronous result of applying a command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Applied,
    /// Node under the pointer for click/move commands
    Picked(Option<NodeId>),
}

// =============================================================================
// EVENTS
// =============================================================================

/// Simulation playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    #[default]
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KinematicField {
    Position,
    Velocity,
}

/// Why a tick was thrown away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickDiscard {
    /// First node (in store order) that went non-finite
    pub node: NodeId,
    pub field: KinematicField,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    SelectionChanged { selected: Option<NodeId> },
    HoverChanged { hovered: Option<NodeId> },
    PlaybackChanged { state: LoopState },
    SnapshotReset { tick: u64 },
    /// `tick` is the tick that would have been produced.
    TickDiscarded { tick: u64, discard: TickDiscard },
}

/// An event stamped with the context clock and the tick it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub at: Duration,
    pub tick: u64,
    pub event: EngineEvent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeCategory;

    #[test]
    fn test_commands_deserialize_from_host_json() {
        let json = r#"[
            {"type": "add_node", "payload": {"id": "user-1", "category": "user", "label": "Alice", "position": [100.0, 100.0, 0.0]}},
            {"type": "pointer_click", "payload": [100.0, 100.0]},
            {"type": "set_pan_zoom", "payload": {"pan": [0.0, 0.0], "zoom": 1.5}},
            {"type": "reset", "payload": {"seed": 7}},
            {"type": "toggle_playing"}
        ]"#;
        let commands: Vec<Command> = serde_json::from_str(json).unwrap();

        assert_eq!(
            commands[0],
            Command::AddNode(NodeSpec::new("user-1", NodeCategory::User, "Alice").at(100.0, 100.0, 0.0))
        );
        assert_eq!(commands[1], Command::PointerClick(Vector2::new(100.0, 100.0)));
        assert!(matches!(commands[2], Command::SetPanZoom { zoom, .. } if zoom == 1.5));
        assert_eq!(commands[3], Command::Reset(ResetSource::Seed(7)));
        assert_eq!(commands[4], Command::TogglePlaying);
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = EngineEvent::PlaybackChanged {
            state: LoopState::Running,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "playback_changed");
        assert_eq!(json["state"], "running");
    }
}
