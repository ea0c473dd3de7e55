//! The entity store: flat, id-keyed collections of nodes and edges.
//!
//! Nodes never own their neighbors. Relations are ids resolved through the
//! store, so snapshots are plain data and cannot form reference cycles.
//!
//! Neighbor sets are kept symmetric: adding an edge (or declaring a neighbor
//! on creation) links both endpoints, and removing the last edge between two
//! nodes unlinks them again.

use crate::error::StoreError;
use crate::integrator::Kinematics;
use crate::model::{Edge, EdgeId, EdgeSpec, Node, NodeId, NodeSpec, Snapshot};
use nalgebra::Vector3;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Owns node and edge records and enforces their integrity rules.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    nodes: Vec<Node>,
    node_index: HashMap<NodeId, usize>,
    edges: Vec<Edge>,
    edge_index: HashMap<EdgeId, usize>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from a snapshot, revalidating every record.
    ///
    /// Nodes are inserted first, then their declared neighbors are linked
    /// (ids missing from the snapshot are dropped), then edges. The first
    /// invalid record aborts the rebuild.
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for node in &snapshot.nodes {
            let spec = NodeSpec {
                id: node.id.clone(),
                category: node.category,
                label: node.label.clone(),
                position: node.position,
                velocity: node.velocity,
                mass: node.mass,
                charge: node.charge,
                neighbors: Vec::new(),
                quantum: node.quantum,
                properties: node.properties.clone(),
            };
            store.add_node(spec)?;
        }
        for node in &snapshot.nodes {
            for neighbor in &node.neighbors {
                if neighbor != &node.id && store.contains_node(neighbor) {
                    store.link(&node.id, neighbor);
                } else {
                    warn!("Dropping dangling neighbor {} of node {}", neighbor, node.id);
                }
            }
        }
        for edge in &snapshot.edges {
            store.add_edge(EdgeSpec {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                kind: edge.kind,
                strength: edge.strength,
                phase: edge.phase,
                entangled: edge.entangled,
            })?;
        }
        Ok(store)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.node_index.get(id).map(|&index| &self.nodes[index])
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edge_index.get(id).map(|&index| &self.edges[index])
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.node_index.contains_key(id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges with `id` as either endpoint.
    pub fn edges_of<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| edge.touches(id))
    }

    /// Copies the current records into a snapshot stamped with `tick`.
    pub fn snapshot(&self, tick: u64) -> Snapshot {
        Snapshot {
            tick,
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    // =========================================================================
    // NODES
    // =========================================================================

    /// Validates and stores a node.
    ///
    /// Neighbor ids that do not resolve (or point at the node itself) are
    /// dropped with a warning.
    pub fn add_node(&mut self, spec: NodeSpec) -> Result<&Node, StoreError> {
        validate_node(&spec)?;
        if self.contains_node(&spec.id) {
            return Err(StoreError::DuplicateNode(spec.id));
        }

        let mut neighbors = BTreeSet::new();
        for neighbor in spec.neighbors {
            if neighbor != spec.id && self.contains_node(&neighbor) {
                neighbors.insert(neighbor);
            } else {
                warn!("Dropping dangling neighbor {} of node {}", neighbor, spec.id);
            }
        }

        for neighbor in &neighbors {
            if let Some(&index) = self.node_index.get(neighbor) {
                self.nodes[index].neighbors.insert(spec.id.clone());
            }
        }

        let index = self.nodes.len();
        self.node_index.insert(spec.id.clone(), index);
        self.nodes.push(Node {
            id: spec.id,
            category: spec.category,
            label: spec.label,
            position: spec.position,
            velocity: spec.velocity,
            mass: spec.mass,
            charge: spec.charge,
            neighbors,
            quantum: spec.quantum,
            properties: spec.properties,
        });
        Ok(&self.nodes[index])
    }

    /// Removes a node, cascading to every edge that touches it.
    ///
    /// Returns the removed node and the edges removed with it.
    pub fn remove_node(&mut self, id: &NodeId) -> Result<(Node, Vec<Edge>), StoreError> {
        if !self.contains_node(id) {
            return Err(StoreError::UnknownNode(id.clone()));
        }

        let touching: Vec<EdgeId> = self.edges_of(id).map(|edge| edge.id.clone()).collect();
        let mut removed_edges = Vec::with_capacity(touching.len());
        for edge_id in touching {
            removed_edges.push(self.remove_edge(&edge_id)?);
        }

        for node in &mut self.nodes {
            node.neighbors.remove(id);
        }

        let index = self.node_index[id];
        let node = self.nodes.remove(index);
        self.reindex_nodes();

        debug!(
            "Removed node {} ({} cascaded edges)",
            node.id,
            removed_edges.len()
        );
        Ok((node, removed_edges))
    }

    // =========================================================================
    // EDGES
    // =========================================================================

    /// Validates and stores an edge. Both endpoints must already exist.
    pub fn add_edge(&mut self, spec: EdgeSpec) -> Result<&Edge, StoreError> {
        if spec.id.as_str().is_empty() {
            return Err(StoreError::EmptyId);
        }
        if self.edge_index.contains_key(&spec.id) {
            return Err(StoreError::DuplicateEdge(spec.id));
        }
        for endpoint in [&spec.source, &spec.target] {
            if !self.contains_node(endpoint) {
                return Err(StoreError::UnknownNode(endpoint.clone()));
            }
        }
        if spec.source == spec.target {
            return Err(StoreError::SelfLoop(spec.id));
        }
        if !spec.strength.is_finite() || spec.strength < 0.0 {
            return Err(StoreError::InvalidStrength {
                id: spec.id,
                strength: spec.strength,
            });
        }
        if !spec.phase.is_finite() {
            return Err(StoreError::NonFinite {
                entity: format!("edge {}", spec.id),
                field: "phase",
            });
        }

        self.link(&spec.source, &spec.target);

        let index = self.edges.len();
        self.edge_index.insert(spec.id.clone(), index);
        self.edges.push(Edge {
            id: spec.id,
            source: spec.source,
            target: spec.target,
            kind: spec.kind,
            strength: spec.strength,
            phase: spec.phase,
            entangled: spec.entangled,
        });
        Ok(&self.edges[index])
    }

    /// Removes an edge and unlinks its endpoints unless another edge still
    /// joins them.
    pub fn remove_edge(&mut self, id: &EdgeId) -> Result<Edge, StoreError> {
        let index = *self
            .edge_index
            .get(id)
            .ok_or_else(|| StoreError::UnknownEdge(id.clone()))?;
        let edge = self.edges.remove(index);
        self.reindex_edges();

        let still_linked = self
            .edges
            .iter()
            .any(|other| other.links(&edge.source, &edge.target));
        if !still_linked {
            self.unlink(&edge.source, &edge.target);
        }
        Ok(edge)
    }

    // =========================================================================
    // KINEMATICS
    // =========================================================================

    /// Writes one tick's results back, in node order.
    ///
    /// `kinematics` must have been computed from a snapshot of this store.
    pub fn commit_kinematics(&mut self, kinematics: &[Kinematics]) {
        debug_assert_eq!(kinematics.len(), self.nodes.len());
        for (node, state) in self.nodes.iter_mut().zip(kinematics) {
            node.position = state.position;
            node.velocity = state.velocity;
        }
    }

    /// Overwrites every position with `place(index, node)` and zeroes
    /// velocities.
    pub fn reposition<F>(&mut self, mut place: F)
    where
        F: FnMut(usize, &Node) -> Vector3<f64>,
    {
        for (index, node) in self.nodes.iter_mut().enumerate() {
            node.position = place(index, node);
            node.velocity = Vector3::zeros();
        }
    }

    fn link(&mut self, a: &NodeId, b: &NodeId) {
        if let Some(&index) = self.node_index.get(a) {
            self.nodes[index].neighbors.insert(b.clone());
        }
        if let Some(&index) = self.node_index.get(b) {
            self.nodes[index].neighbors.insert(a.clone());
        }
    }

    fn unlink(&mut self, a: &NodeId, b: &NodeId) {
        if let Some(&index) = self.node_index.get(a) {
            self.nodes[index].neighbors.remove(b);
        }
        if let Some(&index) = self.node_index.get(b) {
            self.nodes[index].neighbors.remove(a);
        }
    }

    fn reindex_nodes(&mut self) {
        self.node_index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();
    }

    fn reindex_edges(&mut self) {
        self.edge_index = self
            .edges
            .iter()
            .enumerate()
            .map(|(index, edge)| (edge.id.clone(), index))
            .collect();
    }
}

fn validate_node(spec: &NodeSpec) -> Result<(), StoreError> {
    if spec.id.as_str().is_empty() {
        return Err(StoreError::EmptyId);
    }
    if !spec.mass.is_finite() || spec.mass <= 0.0 {
        return Err(StoreError::InvalidMass {
            id: spec.id.clone(),
            mass: spec.mass,
        });
    }
    let probability = spec.quantum.probability;
    if !(0.0..=1.0).contains(&probability) {
        return Err(StoreError::InvalidProbability {
            id: spec.id.clone(),
            probability,
        });
    }
    if spec.quantum.collapsed && spec.quantum.superposition {
        return Err(StoreError::ContradictoryQuantumState(spec.id.clone()));
    }

    let non_finite = if !spec.charge.is_finite() {
        Some("charge")
    } else if !spec.position.iter().all(|c| c.is_finite()) {
        Some("position")
    } else if !spec.velocity.iter().all(|c| c.is_finite()) {
        Some("velocity")
    } else {
        None
    };
    match non_finite {
        Some(field) => Err(StoreError::NonFinite {
            entity: format!("node {}", spec.id),
            field,
        }),
        None => Ok(()),
    }
}
