//! FieldView Core - Real-Time Force-Directed Layout & Projection Engine
//!
//! Labeled entities connected by typed relationships settle under a stylized
//! superposition of forces, and are projected into render space for a host
//! to draw:
//! 1. **Forces**: mass attraction, charge attraction/repulsion, entanglement
//!    cohesion and observer-local positional noise
//! 2. **Integration**: semi-implicit Euler with damping, inelastic walls
//! 3. **Projection**: perspective division followed by pan/zoom, with the
//!    inverse used for pointer hit-testing
//!
//! Hosts drive everything through [`FieldEngine`]: commands in, snapshots,
//! render commands and events out. Time, seeds and frame scheduling are
//! injected through `fieldview_env`.

pub mod boundary;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod field;
pub mod forces;
pub mod integrator;
pub mod interaction;
pub mod metrics;
pub mod model;
pub mod projector;
pub mod render;
pub mod simulation;
pub mod store;

#[cfg(feature = "dashboard")]
pub mod dashboard;

// Re-export key types for convenience
pub use boundary::Bounds;
pub use config::EngineConfig;
pub use engine::FieldEngine;
pub use error::{ConfigError, EngineError, ProjectionError, StoreError};
pub use events::{Command, CommandOutcome, EngineEvent, EventRecord, LoopState, ResetSource};
pub use field::{Dimensionality, FieldParams};
pub use metrics::LayoutMetrics;
pub use model::{Edge, EdgeId, EdgeSpec, Node, NodeCategory, NodeId, NodeSpec, QuantumState, RelationKind, Snapshot};
pub use projector::{Projector, ProjectorConfig};
pub use render::RenderCommand;
pub use simulation::TickOutcome;
pub use store::EntityStore;
