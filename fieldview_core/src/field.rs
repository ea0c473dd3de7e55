//! Field parameters: the constants of the stylized force model.

use crate::error::ConfigError;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Whether the layout lives on a plane or in a volume.
///
/// Planar layouts pin every z coordinate to 0, draw no random z samples and
/// project with a perspective factor of 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimensionality {
    #[default]
    Planar,
    Spatial,
}

impl Dimensionality {
    /// Number of axes that evolve.
    pub fn axes(&self) -> usize {
        match self {
            Dimensionality::Planar => 2,
            Dimensionality::Spatial => 3,
        }
    }
}

/// Constants of the force field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldParams {
    /// Gravitational constant G
    pub gravity: f64,

    /// Electromagnetic constant E
    pub electromagnetism: f64,

    /// Entanglement constant K
    pub entanglement: f64,

    /// Positional-uncertainty magnitude U
    pub uncertainty: f64,

    /// Observer position in simulation space
    pub observer: Vector3<f64>,

    /// Beyond this distance from the observer the noise term is zero
    pub observation_radius: f64,

    /// Floor applied to every distance before it is used as a divisor
    pub epsilon: f64,
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            gravity: 0.1,
            electromagnetism: 0.05,
            entanglement: 0.3,
            uncertainty: 0.01,
            observer: Vector3::new(400.0, 300.0, 0.0),
            observation_radius: 100.0,
            epsilon: 1.0,
        }
    }
}

impl FieldParams {
    /// A field with every constant zeroed. Useful as a base for tests and
    /// scenarios that enable one term at a time.
    pub fn inert() -> Self {
        Self {
            gravity: 0.0,
            electromagnetism: 0.0,
            entanglement: 0.0,
            uncertainty: 0.0,
            observation_radius: 0.0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let scalars = [
            ("gravity", self.gravity),
            ("electromagnetism", self.electromagnetism),
            ("entanglement", self.entanglement),
            ("uncertainty", self.uncertainty),
            ("observation_radius", self.observation_radius),
            ("epsilon", self.epsilon),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteField(name));
            }
        }
        if !self.observer.iter().all(|c| c.is_finite()) {
            return Err(ConfigError::NonFiniteField("observer"));
        }
        if self.epsilon <= 0.0 {
            return Err(ConfigError::NonPositiveField {
                name: "epsilon",
                value: self.epsilon,
            });
        }
        if self.observation_radius < 0.0 {
            return Err(ConfigError::NonPositiveField {
                name: "observation_radius",
                value: self.observation_radius,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_field_is_valid() {
        assert!(FieldParams::default().validate().is_ok());
        assert!(FieldParams::inert().validate().is_ok());
    }

    #[test]
    fn test_epsilon_must_be_positive() {
        let params = FieldParams {
            epsilon: 0.0,
            ..FieldParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::NonPositiveField { name: "epsilon", .. })
        ));
    }

    #[test]
    fn test_non_finite_constant_rejected() {
        let params = FieldParams {
            gravity: f64::NAN,
            ..FieldParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::NonFiniteField("gravity"))
        ));
    }
}
