//! Error types for the FieldView engine.

use crate::model::{EdgeId, NodeId};
use thiserror::Error;

/// Integrity failures raised by the entity store.
///
/// Every variant is raised synchronously, before anything is stored.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Entity id must not be empty")]
    EmptyId,

    #[error("Node already exists: {0}")]
    DuplicateNode(NodeId),

    #[error("Edge already exists: {0}")]
    DuplicateEdge(EdgeId),

    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Unknown edge: {0}")]
    UnknownEdge(EdgeId),

    #[error("Node {id} has invalid mass {mass} (must be finite and > 0)")]
    InvalidMass { id: NodeId, mass: f64 },

    #[error("Node {id} has invalid probability {probability} (must be within [0, 1])")]
    InvalidProbability { id: NodeId, probability: f64 },

    #[error("Node {0} cannot be both collapsed and in superposition")]
    ContradictoryQuantumState(NodeId),

    #[error("{entity} has a non-finite {field}")]
    NonFinite { entity: String, field: &'static str },

    #[error("Edge {id} has invalid strength {strength} (must be finite and >= 0)")]
    InvalidStrength { id: EdgeId, strength: f64 },

    #[error("Edge {0} connects a node to itself")]
    SelfLoop(EdgeId),
}

/// Rejected pan/zoom updates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("Zoom {0} is not usable (must be finite and >= {min})", min = crate::projector::MIN_ZOOM)]
    InvalidZoom(f64),

    #[error("Pan offset must be finite")]
    NonFinitePan,
}

/// Rejected engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Damping {0} must lie strictly between 0 and 1")]
    InvalidDamping(f64),

    #[error("Bounds on axis {axis} are invalid: min {min} must be finite and below max {max}")]
    InvalidBounds { axis: usize, min: f64, max: f64 },

    #[error("Planar layouts need bounds that contain z = 0")]
    PlanarBoundsExcludeOrigin,

    #[error("Field parameter {0} must be finite")]
    NonFiniteField(&'static str),

    #[error("Field parameter {name} must be positive, got {value}")]
    NonPositiveField { name: &'static str, value: f64 },

    #[error("Hit radius {0} must be finite and > 0")]
    InvalidHitRadius(f64),

    #[error("Focal length {0} must be finite and > 0")]
    InvalidFocalLength(f64),

    #[error("Zoom limits [{min}, {max}] with step {step} are invalid")]
    InvalidZoomLimits { min: f64, max: f64, step: f64 },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Umbrella error returned by the engine facade.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
