//! Layout Metrics
//! ==============
//!
//! Summary numbers over a snapshot, used by the harness to check invariants
//! and by the dashboard status line:
//! - **Kinetic energy**: `Σ ½·m·|v|²`, falls towards zero as the layout settles
//! - **Max speed**: fastest node, a cheap "still moving" signal
//! - **Centroid**: mass-weighted center of the layout
//! - **Bounds violations / non-finite count**: must both stay at zero

use crate::boundary::Bounds;
use crate::model::Snapshot;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutMetrics {
    pub tick: u64,
    pub node_count: usize,
    pub edge_count: usize,
    pub kinetic_energy: f64,
    pub max_speed: f64,
    /// Mass-weighted; zero for an empty layout
    pub centroid: Vector3<f64>,
    /// Nodes outside the bounds
    pub bounds_violations: usize,
    /// Nodes with a non-finite position or velocity
    pub non_finite: usize,
}

impl LayoutMetrics {
    pub fn from_snapshot(snapshot: &Snapshot, bounds: &Bounds) -> Self {
        let mut metrics = Self {
            tick: snapshot.tick,
            node_count: snapshot.nodes.len(),
            edge_count: snapshot.edges.len(),
            ..Self::default()
        };

        let mut total_mass = 0.0;
        let mut weighted = Vector3::zeros();
        for node in &snapshot.nodes {
            let finite = node
                .position
                .iter()
                .chain(node.velocity.iter())
                .all(|c| c.is_finite());
            if !finite {
                metrics.non_finite += 1;
                continue;
            }
            if !bounds.contains(&node.position) {
                metrics.bounds_violations += 1;
            }

            let speed = node.velocity.norm();
            metrics.kinetic_energy += 0.5 * node.mass * speed * speed;
            metrics.max_speed = metrics.max_speed.max(speed);
            total_mass += node.mass;
            weighted += node.position * node.mass;
        }

        if total_mass > 0.0 {
            metrics.centroid = weighted / total_mass;
        }
        metrics
    }

    /// True when every node is finite and inside the bounds.
    pub fn is_healthy(&self) -> bool {
        self.bounds_violations == 0 && self.non_finite == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeCategory, NodeSpec};
    use crate::store::EntityStore;
    use approx::assert_relative_eq;

    #[test]
    fn test_energy_and_centroid() {
        let mut store = EntityStore::new();
        store
            .add_node(
                NodeSpec::new("a", NodeCategory::User, "A")
                    .with_mass(2.0)
                    .with_velocity(Vector3::new(3.0, 4.0, 0.0))
                    .at(100.0, 100.0, 0.0),
            )
            .unwrap();
        store
            .add_node(NodeSpec::new("b", NodeCategory::Device, "B").at(400.0, 100.0, 0.0))
            .unwrap();

        let metrics = LayoutMetrics::from_snapshot(&store.snapshot(3), &Bounds::default());

        assert_eq!(metrics.tick, 3);
        assert_relative_eq!(metrics.kinetic_energy, 25.0);
        assert_relative_eq!(metrics.max_speed, 5.0);
        assert_relative_eq!(metrics.centroid.x, 200.0);
        assert!(metrics.is_healthy());
    }

    #[test]
    fn test_violations_counted() {
        let mut store = EntityStore::new();
        store
            .add_node(NodeSpec::new("out", NodeCategory::Service, "Out").at(0.0, 0.0, 0.0))
            .unwrap();
        let mut snapshot = store.snapshot(0);
        snapshot.nodes.push(snapshot.nodes[0].clone());
        snapshot.nodes[1].velocity.x = f64::NAN;

        let metrics = LayoutMetrics::from_snapshot(&snapshot, &Bounds::default());
        assert_eq!(metrics.bounds_violations, 1);
        assert_eq!(metrics.non_finite, 1);
        assert!(!metrics.is_healthy());
    }
}
