//! Engine configuration.

use crate::boundary::Bounds;
use crate::error::ConfigError;
use crate::field::{Dimensionality, FieldParams};
use crate::interaction::DEFAULT_HIT_RADIUS;
use crate::projector::ProjectorConfig;
use serde::{Deserialize, Serialize};

/// Every tunable of the engine. Missing JSON fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub field: FieldParams,

    /// Velocity multiplier per tick, strictly inside (0, 1)
    pub damping: f64,

    pub bounds: Bounds,
    pub dimensionality: Dimensionality,
    pub projector: ProjectorConfig,

    /// Pointer hit radius in plane units
    pub hit_radius: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            field: FieldParams::default(),
            damping: 0.99,
            bounds: Bounds::default(),
            dimensionality: Dimensionality::default(),
            projector: ProjectorConfig::default(),
            hit_radius: DEFAULT_HIT_RADIUS,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.field.validate()?;
        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(ConfigError::InvalidDamping(self.damping));
        }
        self.bounds.validate()?;
        if self.dimensionality == Dimensionality::Planar
            && !(self.bounds.min.z <= 0.0 && self.bounds.max.z >= 0.0)
        {
            return Err(ConfigError::PlanarBoundsExcludeOrigin);
        }
        self.projector.validate()?;
        if !(self.hit_radius.is_finite() && self.hit_radius > 0.0) {
            return Err(ConfigError::InvalidHitRadius(self.hit_radius));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = EngineConfig::from_json(
            r#"{"damping": 0.9, "dimensionality": "spatial", "field": {"gravity": 0.5}}"#,
        )
        .unwrap();

        assert_eq!(config.damping, 0.9);
        assert_eq!(config.dimensionality, Dimensionality::Spatial);
        assert_eq!(config.field.gravity, 0.5);
        assert_eq!(config.field.entanglement, 0.3);
        assert_eq!(config.hit_radius, 25.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"damping": 1.5}"#),
            Err(ConfigError::InvalidDamping(_))
        ));
        assert!(matches!(
            EngineConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));

        let config = EngineConfig {
            bounds: Bounds {
                min: Vector3::new(0.0, 0.0, 10.0),
                max: Vector3::new(100.0, 100.0, 20.0),
            },
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PlanarBoundsExcludeOrigin)
        ));
    }
}
