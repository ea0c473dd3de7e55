//! Fixed-step semi-implicit Euler integration with velocity damping.
//!
//! One step per tick, no sub-stepping:
//!
//! ```text
//! a  = F / m
//! v' = (v + a) · damping
//! p' = p + v'
//! ```

use crate::error::ConfigError;
use crate::events::KinematicField;
use crate::model::Node;
use nalgebra::Vector3;

/// Position and velocity of one node after a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
}

impl Kinematics {
    /// The first field holding a NaN or infinite component, position first.
    pub fn non_finite_field(&self) -> Option<KinematicField> {
        if !self.position.iter().all(|c| c.is_finite()) {
            Some(KinematicField::Position)
        } else if !self.velocity.iter().all(|c| c.is_finite()) {
            Some(KinematicField::Velocity)
        } else {
            None
        }
    }
}

/// Advances velocity and position from a net force.
#[derive(Debug, Clone, Copy)]
pub struct Integrator {
    damping: f64,
}

impl Integrator {
    /// `damping` must lie strictly inside (0, 1).
    pub fn new(damping: f64) -> Result<Self, ConfigError> {
        if !(damping > 0.0 && damping < 1.0) {
            return Err(ConfigError::InvalidDamping(damping));
        }
        Ok(Self { damping })
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    pub fn step(&self, node: &Node, force: &Vector3<f64>) -> Kinematics {
        let acceleration = force / node.mass;
        let velocity = (node.velocity + acceleration) * self.damping;
        Kinematics {
            position: node.position + velocity,
            velocity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeCategory, NodeSpec};
    use crate::store::EntityStore;
    use approx::assert_relative_eq;

    fn node(spec: NodeSpec) -> Node {
        EntityStore::new().add_node(spec).unwrap().clone()
    }

    #[test]
    fn test_damping_range() {
        assert!(Integrator::new(0.99).is_ok());
        assert!(Integrator::new(0.0).is_err());
        assert!(Integrator::new(1.0).is_err());
        assert!(Integrator::new(f64::NAN).is_err());
    }

    #[test]
    fn test_step_is_semi_implicit() {
        let integrator = Integrator::new(0.5).unwrap();
        let n = node(
            NodeSpec::new("a", NodeCategory::User, "A")
                .with_mass(2.0)
                .with_velocity(Vector3::new(1.0, 0.0, 0.0))
                .at(10.0, 10.0, 0.0),
        );

        let next = integrator.step(&n, &Vector3::new(4.0, 2.0, 0.0));

        // a = (2, 1), v = (3, 1) * 0.5
        assert_relative_eq!(next.velocity, Vector3::new(1.5, 0.5, 0.0));
        // Position uses the updated velocity
        assert_relative_eq!(next.position, Vector3::new(11.5, 10.5, 0.0));
    }

    #[test]
    fn test_isolated_node_comes_to_rest() {
        let integrator = Integrator::new(0.99).unwrap();
        let mut n = node(
            NodeSpec::new("a", NodeCategory::Device, "A")
                .with_velocity(Vector3::new(3.0, -4.0, 0.0))
                .at(400.0, 300.0, 0.0),
        );

        let mut last_speed = n.velocity.norm();
        for _ in 0..5000 {
            let next = integrator.step(&n, &Vector3::zeros());
            let speed = next.velocity.norm();
            assert!(speed <= last_speed);
            last_speed = speed;
            n.position = next.position;
            n.velocity = next.velocity;
        }
        assert!(last_speed < 1e-20);
    }

    #[test]
    fn test_non_finite_detected() {
        let mut state = Kinematics {
            position: Vector3::new(0.0, 1.0, 0.0),
            velocity: Vector3::zeros(),
        };
        assert_eq!(state.non_finite_field(), None);

        state.velocity.x = f64::NAN;
        assert_eq!(state.non_finite_field(), Some(KinematicField::Velocity));

        // Position is reported ahead of velocity
        state.position.y = f64::INFINITY;
        assert_eq!(state.non_finite_field(), Some(KinematicField::Position));
    }
}
