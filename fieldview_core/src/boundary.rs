//! Boundary containment: axis-aligned bounds with inelastic walls.

use crate::error::ConfigError;
use crate::field::Dimensionality;
use crate::integrator::Kinematics;
use nalgebra::Vector3;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Axis-aligned simulation-space box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vector3<f64>,
    pub max: Vector3<f64>,
}

impl Default for Bounds {
    /// An 800x600 canvas with a 50-unit margin and ±200 depth.
    fn default() -> Self {
        Self {
            min: Vector3::new(50.0, 50.0, -200.0),
            max: Vector3::new(750.0, 550.0, 200.0),
        }
    }
}

impl Bounds {
    pub fn new(min: Vector3<f64>, max: Vector3<f64>) -> Result<Self, ConfigError> {
        let bounds = Self { min, max };
        bounds.validate()?;
        Ok(bounds)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for axis in 0..3 {
            let (min, max) = (self.min[axis], self.max[axis]);
            if !(min.is_finite() && max.is_finite() && min <= max) {
                return Err(ConfigError::InvalidBounds { axis, min, max });
            }
        }
        Ok(())
    }

    pub fn contains(&self, point: &Vector3<f64>) -> bool {
        (0..3).all(|axis| point[axis] >= self.min[axis] && point[axis] <= self.max[axis])
    }

    pub fn center(&self) -> Vector3<f64> {
        (self.min + self.max) / 2.0
    }

    /// Clamps each coordinate into the box and zeroes the velocity component
    /// of every clamped axis. Returns whether any wall was hit.
    pub fn clamp(&self, state: Kinematics) -> (Kinematics, bool) {
        let mut clamped = state;
        let mut hit = false;
        for axis in 0..3 {
            let value = state.position[axis];
            let bounded = value.clamp(self.min[axis], self.max[axis]);
            if bounded != value {
                clamped.position[axis] = bounded;
                clamped.velocity[axis] = 0.0;
                hit = true;
            }
        }
        (clamped, hit)
    }

    /// Uniform random point inside the box. Planar layouts get `z = 0` and
    /// consume no draw for it.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, dimensionality: Dimensionality) -> Vector3<f64> {
        let mut point = Vector3::zeros();
        for axis in 0..dimensionality.axes() {
            point[axis] = self.min[axis] + rng.gen::<f64>() * (self.max[axis] - self.min[axis]);
        }
        point
    }
}
