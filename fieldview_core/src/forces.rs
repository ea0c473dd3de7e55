//! The force model.
//!
//! Net force on every node is the sum of three pairwise terms plus a local
//! noise term:
//!
//! ```text
//! F_ij = û_ij · ( G·m_i·m_j / d²  −  E·q_i·q_j / d²  +  [both entangled] K / d )
//! N_i  = U / max(|o − p_i|, ε) · (ξ − ½)      per axis, ξ ~ U[0, 1), only if |o − p_i| < R
//! ```
//!
//! where `û_ij` is the unit vector from i towards j and `d = max(|p_j − p_i|, ε)`.
//! Positive magnitudes attract. Each unordered pair is evaluated once and
//! applied with opposite signs, so pairwise forces balance exactly.

use crate::field::{Dimensionality, FieldParams};
use crate::model::Node;
use nalgebra::Vector3;
use rand::Rng;

/// Evaluates net forces over a snapshot.
#[derive(Debug, Clone)]
pub struct ForceModel {
    params: FieldParams,
    dimensionality: Dimensionality,
}

impl ForceModel {
    pub fn new(params: FieldParams, dimensionality: Dimensionality) -> Self {
        Self {
            params,
            dimensionality,
        }
    }

    pub fn params(&self) -> &FieldParams {
        &self.params
    }

    /// Deterministic force exerted on `a` by `b` (gravity, electromagnetism
    /// and entanglement; no noise).
    pub fn pair_force(&self, a: &Node, b: &Node) -> Vector3<f64> {
        let delta = b.position - a.position;
        let separation = delta.norm();
        if separation == 0.0 {
            // Coincident nodes have no direction to push along.
            return Vector3::zeros();
        }
        let direction = delta / separation;
        let distance = separation.max(self.params.epsilon);
        let distance_sq = distance * distance;

        // Products are formed pair-first so (a, b) and (b, a) round identically.
        let gravitational = self.params.gravity * (a.mass * b.mass) / distance_sq;
        let electromagnetic = -self.params.electromagnetism * (a.charge * b.charge) / distance_sq;
        let entanglement = if a.quantum.entangled && b.quantum.entangled {
            self.params.entanglement / distance
        } else {
            0.0
        };

        direction * (gravitational + electromagnetic + entanglement)
    }

    /// Positional-noise term for one node.
    ///
    /// Draws one sample per evolving axis, and draws nothing at all outside
    /// the observation radius.
    pub fn observer_noise<R: Rng + ?Sized>(&self, node: &Node, rng: &mut R) -> Vector3<f64> {
        let mut noise = Vector3::zeros();
        if self.params.uncertainty == 0.0 {
            return noise;
        }

        let distance = (self.params.observer - node.position).norm();
        if distance >= self.params.observation_radius {
            return noise;
        }

        let magnitude = self.params.uncertainty / distance.max(self.params.epsilon);
        for axis in 0..self.dimensionality.axes() {
            noise[axis] = (rng.gen::<f64>() - 0.5) * magnitude;
        }
        noise
    }

    /// Net force per node, in node order.
    ///
    /// Reads only `nodes`; the caller keeps them immutable for the duration
    /// of the pass so evaluation order cannot bias the result.
    pub fn net_forces<R: Rng + ?Sized>(&self, nodes: &[Node], rng: &mut R) -> Vec<Vector3<f64>> {
        let mut forces = vec![Vector3::zeros(); nodes.len()];

        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let force = self.pair_force(&nodes[i], &nodes[j]);
                forces[i] += force;
                forces[j] -= force;
            }
        }

        for (force, node) in forces.iter_mut().zip(nodes) {
            *force += self.observer_noise(node, rng);
        }

        forces
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeCategory, NodeSpec};
    use crate::store::EntityStore;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn node(spec: NodeSpec) -> Node {
        let mut store = EntityStore::new();
        store.add_node(spec).unwrap().clone()
    }

    fn binary_field() -> FieldParams {
        FieldParams {
            gravity: 0.1,
            electromagnetism: 0.05,
            ..FieldParams::inert()
        }
    }

    #[test]
    fn test_opposite_charges_attract() {
        let a = node(NodeSpec::new("a", NodeCategory::User, "A").with_charge(1.0));
        let b = node(
            NodeSpec::new("b", NodeCategory::User, "B")
                .with_charge(-1.0)
                .at(10.0, 0.0, 0.0),
        );
        let model = ForceModel::new(binary_field(), Dimensionality::Spatial);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let forces = model.net_forces(&[a, b], &mut rng);

        // 0.001 gravity + 0.0005 electromagnetic, both towards the partner
        assert_relative_eq!(forces[0].x, 0.0015, epsilon = 1e-12);
        assert_relative_eq!(forces[1].x, -0.0015, epsilon = 1e-12);
        assert_eq!(forces[0].y, 0.0);
        assert_eq!(forces[0].z, 0.0);
    }

    #[test]
    fn test_like_charges_repel() {
        let a = node(NodeSpec::new("a", NodeCategory::User, "A").with_charge(1.0));
        let b = node(
            NodeSpec::new("b", NodeCategory::User, "B")
                .with_charge(1.0)
                .at(10.0, 0.0, 0.0),
        );
        let model = ForceModel::new(
            FieldParams {
                electromagnetism: 0.05,
                ..FieldParams::inert()
            },
            Dimensionality::Planar,
        );

        let force = model.pair_force(&a, &b);
        assert_relative_eq!(force.x, -0.0005, epsilon = 1e-12);
    }

    #[test]
    fn test_entanglement_needs_both_flags() {
        let field = FieldParams {
            entanglement: 0.3,
            ..FieldParams::inert()
        };
        let model = ForceModel::new(field, Dimensionality::Planar);
        let a = node(NodeSpec::new("a", NodeCategory::User, "A").entangled());
        let b = node(NodeSpec::new("b", NodeCategory::Device, "B").at(0.0, 30.0, 0.0));
        let c = node(
            NodeSpec::new("c", NodeCategory::Device, "C")
                .entangled()
                .at(0.0, 30.0, 0.0),
        );

        assert_eq!(model.pair_force(&a, &b), Vector3::zeros());
        // Linear falloff: K / d
        assert_relative_eq!(model.pair_force(&a, &c).y, 0.3 / 30.0, epsilon = 1e-12);
    }

    #[test]
    fn test_distance_is_floored_at_epsilon() {
        let model = ForceModel::new(
            FieldParams {
                gravity: 1.0,
                epsilon: 1.0,
                ..FieldParams::inert()
            },
            Dimensionality::Planar,
        );
        let a = node(NodeSpec::new("a", NodeCategory::User, "A"));
        let b = node(NodeSpec::new("b", NodeCategory::User, "B").at(0.001, 0.0, 0.0));
        let c = node(NodeSpec::new("c", NodeCategory::User, "C"));

        let close = model.pair_force(&a, &b);
        assert!(close.x.is_finite());
        assert_relative_eq!(close.x, 1.0, epsilon = 1e-12);

        // Coincident: no direction, no force, no NaN
        assert_eq!(model.pair_force(&a, &c), Vector3::zeros());
    }

    #[test]
    fn test_noise_only_inside_observation_radius() {
        let field = FieldParams {
            uncertainty: 10.0,
            observer: Vector3::zeros(),
            observation_radius: 100.0,
            ..FieldParams::inert()
        };
        let model = ForceModel::new(field, Dimensionality::Planar);
        let near = node(NodeSpec::new("near", NodeCategory::User, "N").at(20.0, 0.0, 0.0));
        let far = node(NodeSpec::new("far", NodeCategory::User, "F").at(150.0, 0.0, 0.0));
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        assert_eq!(model.observer_noise(&far, &mut rng), Vector3::zeros());

        let noise = model.observer_noise(&near, &mut rng);
        // |noise| per axis is bounded by U / d / 2
        assert!(noise.x.abs() <= 0.25 && noise.y.abs() <= 0.25);
        assert_eq!(noise.z, 0.0);
        assert_ne!(noise, Vector3::zeros());
    }

    #[test]
    fn test_noise_reproducible_from_seed() {
        let field = FieldParams {
            uncertainty: 1.0,
            observer: Vector3::zeros(),
            observation_radius: 50.0,
            ..FieldParams::inert()
        };
        let model = ForceModel::new(field, Dimensionality::Spatial);
        let nodes = vec![
            node(NodeSpec::new("a", NodeCategory::User, "A").at(3.0, 4.0, 0.0)),
            node(NodeSpec::new("b", NodeCategory::User, "B").at(-5.0, 1.0, 2.0)),
        ];

        let first = model.net_forces(&nodes, &mut ChaCha8Rng::seed_from_u64(77));
        let second = model.net_forces(&nodes, &mut ChaCha8Rng::seed_from_u64(77));
        assert_eq!(first, second);
    }

    proptest! {
        #[test]
        fn test_pair_forces_are_antisymmetric(
            m1 in 0.01f64..10.0, m2 in 0.01f64..10.0,
            q1 in -5.0f64..5.0, q2 in -5.0f64..5.0,
            x in -500.0f64..500.0, y in -500.0f64..500.0, z in -200.0f64..200.0,
        ) {
            let model = ForceModel::new(FieldParams::default(), Dimensionality::Spatial);
            let a = node(NodeSpec::new("a", NodeCategory::User, "A").with_mass(m1).with_charge(q1));
            let b = node(
                NodeSpec::new("b", NodeCategory::Service, "B")
                    .with_mass(m2)
                    .with_charge(q2)
                    .at(x, y, z),
            );

            let on_b = model.pair_force(&b, &a);
            let on_a = model.pair_force(&a, &b);
            prop_assert_eq!(on_a, -on_b);
        }
    }
}
