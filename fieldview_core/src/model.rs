//! Entity records: nodes, edges and the immutable snapshot handed between
//! the tick and the render/interaction side.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique identifier of a node (e.g. `"user-1"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Unique identifier of an edge (e.g. `"conn-1"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// =============================================================================
// CATEGORIES
// =============================================================================

/// What kind of entity a node stands for. Drives render style only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    User,
    Device,
    #[serde(alias = "file")]
    Resource,
    Policy,
    Service,
}

impl NodeCategory {
    pub fn name(&self) -> &'static str {
        match self {
            NodeCategory::User => "user",
            NodeCategory::Device => "device",
            NodeCategory::Resource => "resource",
            NodeCategory::Policy => "policy",
            NodeCategory::Service => "service",
        }
    }
}

impl fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Relationship category carried by an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Identity,
    Network,
    Data,
    Policy,
    Entanglement,
}

impl RelationKind {
    pub fn name(&self) -> &'static str {
        match self {
            RelationKind::Identity => "identity",
            RelationKind::Network => "network",
            RelationKind::Data => "data",
            RelationKind::Policy => "policy",
            RelationKind::Entanglement => "entanglement",
        }
    }
}

// =============================================================================
// NODE
// =============================================================================

/// Quantum-state flags of a node.
///
/// `entangled` feeds the force model; the remaining fields only drive
/// rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantumState {
    pub superposition: bool,
    pub entangled: bool,
    pub collapsed: bool,
    /// Probability in [0, 1]
    pub probability: f64,
}

impl Default for QuantumState {
    fn default() -> Self {
        Self {
            superposition: false,
            entangled: false,
            collapsed: false,
            probability: 1.0,
        }
    }
}

/// A simulated entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub category: NodeCategory,
    pub label: String,

    /// Simulation-space position (z stays 0 for planar layouts)
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,

    /// Always > 0
    pub mass: f64,
    pub charge: f64,

    /// Ids of related nodes. Ids only, never references.
    pub neighbors: BTreeSet<NodeId>,
    pub quantum: QuantumState,

    /// Free-form detail fields shown by external panels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

/// Creation request for a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: NodeId,
    pub category: NodeCategory,
    pub label: String,
    pub position: Vector3<f64>,
    #[serde(default = "zero_vector")]
    pub velocity: Vector3<f64>,
    #[serde(default = "default_mass")]
    pub mass: f64,
    #[serde(default)]
    pub charge: f64,
    #[serde(default)]
    pub neighbors: Vec<NodeId>,
    #[serde(default)]
    pub quantum: QuantumState,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

fn default_mass() -> f64 {
    1.0
}

fn zero_vector() -> Vector3<f64> {
    Vector3::zeros()
}

impl NodeSpec {
    /// Unit mass, neutral, at rest at the origin.
    pub fn new(id: impl Into<String>, category: NodeCategory, label: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(id),
            category,
            label: label.into(),
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            mass: default_mass(),
            charge: 0.0,
            neighbors: Vec::new(),
            quantum: QuantumState::default(),
            properties: BTreeMap::new(),
        }
    }

    pub fn at(mut self, x: f64, y: f64, z: f64) -> Self {
        self.position = Vector3::new(x, y, z);
        self
    }

    pub fn with_velocity(mut self, velocity: Vector3<f64>) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_charge(mut self, charge: f64) -> Self {
        self.charge = charge;
        self
    }

    pub fn with_quantum(mut self, quantum: QuantumState) -> Self {
        self.quantum = quantum;
        self
    }

    pub fn entangled(mut self) -> Self {
        self.quantum.entangled = true;
        self
    }

    pub fn with_neighbors<I, S>(mut self, neighbors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.neighbors = neighbors.into_iter().map(NodeId::new).collect();
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// EDGE
// =============================================================================

/// A typed relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub kind: RelationKind,
    /// Non-negative
    pub strength: f64,
    /// Radians, rendering only
    pub phase: f64,
    pub entangled: bool,
}

impl Edge {
    /// Returns true if either endpoint is `id`.
    pub fn touches(&self, id: &NodeId) -> bool {
        &self.source == id || &self.target == id
    }

    /// Returns true if the edge links `a` and `b` in either direction.
    pub fn links(&self, a: &NodeId, b: &NodeId) -> bool {
        (&self.source == a && &self.target == b) || (&self.source == b && &self.target == a)
    }
}

/// Creation request for an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub kind: RelationKind,
    #[serde(default = "default_strength")]
    pub strength: f64,
    #[serde(default)]
    pub phase: f64,
    #[serde(default)]
    pub entangled: bool,
}

fn default_strength() -> f64 {
    1.0
}

impl EdgeSpec {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        kind: RelationKind,
    ) -> Self {
        Self {
            id: EdgeId::new(id),
            source: NodeId::new(source),
            target: NodeId::new(target),
            kind,
            strength: default_strength(),
            phase: 0.0,
            entangled: false,
        }
    }

    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = phase;
        self
    }

    pub fn entangled(mut self) -> Self {
        self.entangled = true;
        self
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Immutable point-in-time copy of every node and edge.
///
/// Shared as `Arc<Snapshot>`; once published it is never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Number of completed ticks that produced this state
    pub tick: u64,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Snapshot {
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| &node.id == id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|edge| &edge.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
