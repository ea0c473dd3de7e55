//! Simulation space to render space.
//!
//! ```text
//! f      = focal / (focal + z)        (1 for planar layouts)
//! plane  = (x·f, y·f)
//! screen = (plane + pan) · zoom
//! ```
//!
//! Points with `focal + z <= 0` sit behind the camera and do not project.

use crate::error::{ConfigError, ProjectionError};
use crate::field::Dimensionality;
use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Smallest zoom accepted by [`Projector::set_pan_zoom`].
pub const MIN_ZOOM: f64 = 1e-3;

/// Camera constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectorConfig {
    pub focal_length: f64,
    /// Lower limit for [`Projector::zoom_out`]
    pub min_zoom: f64,
    /// Upper limit for [`Projector::zoom_in`]
    pub max_zoom: f64,
    /// Factor applied by one zoom in/out step
    pub zoom_step: f64,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            focal_length: 800.0,
            min_zoom: 0.5,
            max_zoom: 3.0,
            zoom_step: 1.2,
        }
    }
}

impl ProjectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.focal_length.is_finite() && self.focal_length > 0.0) {
            return Err(ConfigError::InvalidFocalLength(self.focal_length));
        }
        let limits_ok = self.min_zoom.is_finite()
            && self.max_zoom.is_finite()
            && self.zoom_step.is_finite()
            && self.min_zoom >= MIN_ZOOM
            && self.min_zoom <= 1.0
            && self.max_zoom >= 1.0
            && self.zoom_step > 1.0;
        if !limits_ok {
            return Err(ConfigError::InvalidZoomLimits {
                min: self.min_zoom,
                max: self.max_zoom,
                step: self.zoom_step,
            });
        }
        Ok(())
    }
}

/// Perspective camera with pan/zoom.
#[derive(Debug, Clone)]
pub struct Projector {
    config: ProjectorConfig,
    dimensionality: Dimensionality,
    pan: Vector2<f64>,
    zoom: f64,
}

impl Projector {
    /// Centered view: zero pan, unit zoom.
    pub fn new(config: ProjectorConfig, dimensionality: Dimensionality) -> Self {
        Self {
            config,
            dimensionality,
            pan: Vector2::zeros(),
            zoom: 1.0,
        }
    }

    pub fn pan(&self) -> Vector2<f64> {
        self.pan
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn config(&self) -> &ProjectorConfig {
        &self.config
    }

    // =========================================================================
    // VIEW CONTROL
    // =========================================================================

    /// Replaces pan and zoom. Rejected values leave the view unchanged.
    pub fn set_pan_zoom(&mut self, pan: Vector2<f64>, zoom: f64) -> Result<(), ProjectionError> {
        if !(zoom.is_finite() && zoom >= MIN_ZOOM) {
            return Err(ProjectionError::InvalidZoom(zoom));
        }
        if !(pan.x.is_finite() && pan.y.is_finite()) {
            return Err(ProjectionError::NonFinitePan);
        }
        self.pan = pan;
        self.zoom = zoom;
        Ok(())
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * self.config.zoom_step).min(self.config.max_zoom);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / self.config.zoom_step).max(self.config.min_zoom);
    }

    /// Back to zero pan and unit zoom.
    pub fn center(&mut self) {
        self.pan = Vector2::zeros();
        self.zoom = 1.0;
    }

    // =========================================================================
    // FORWARD
    // =========================================================================

    /// `focal / (focal + z)`, or `None` behind the camera.
    pub fn perspective_factor(&self, z: f64) -> Option<f64> {
        match self.dimensionality {
            Dimensionality::Planar => Some(1.0),
            Dimensionality::Spatial => {
                let depth = self.config.focal_length + z;
                (depth > 0.0).then(|| self.config.focal_length / depth)
            }
        }
    }

    /// Perspective-divided plane coordinate.
    pub fn to_plane(&self, point: &Vector3<f64>) -> Option<Vector2<f64>> {
        let f = self.perspective_factor(point.z)?;
        Some(Vector2::new(point.x * f, point.y * f))
    }

    pub fn plane_to_screen(&self, plane: &Vector2<f64>) -> Vector2<f64> {
        (plane + self.pan) * self.zoom
    }

    pub fn project(&self, point: &Vector3<f64>) -> Option<Vector2<f64>> {
        self.to_plane(point).map(|plane| self.plane_to_screen(&plane))
    }

    /// Screen-space size multiplier at depth `z` (`zoom · f`).
    pub fn scale_at(&self, z: f64) -> Option<f64> {
        self.perspective_factor(z).map(|f| f * self.zoom)
    }

    // =========================================================================
    // INVERSE
    // =========================================================================

    /// Undoes pan and zoom only.
    pub fn screen_to_plane(&self, screen: &Vector2<f64>) -> Vector2<f64> {
        screen / self.zoom - self.pan
    }

    /// Full inverse for a point known to sit at depth `z`.
    pub fn unproject(&self, screen: &Vector2<f64>, z: f64) -> Option<Vector3<f64>> {
        let f = self.perspective_factor(z)?;
        let plane = self.screen_to_plane(screen);
        Some(Vector3::new(plane.x / f, plane.y / f, z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_planar_identity_at_default_view() {
        let projector = Projector::new(ProjectorConfig::default(), Dimensionality::Planar);
        let screen = projector.project(&Vector3::new(120.0, 80.0, 0.0)).unwrap();
        assert_eq!(screen, Vector2::new(120.0, 80.0));
    }

    #[test]
    fn test_perspective_shrinks_distant_points() {
        let projector = Projector::new(ProjectorConfig::default(), Dimensionality::Spatial);
        // 800 / (800 + 800) = 0.5
        let screen = projector.project(&Vector3::new(100.0, 50.0, 800.0)).unwrap();
        assert_relative_eq!(screen, Vector2::new(50.0, 25.0));
        assert_relative_eq!(projector.scale_at(800.0).unwrap(), 0.5);
    }

    #[test]
    fn test_behind_camera_not_projectable() {
        let projector = Projector::new(ProjectorConfig::default(), Dimensionality::Spatial);
        assert!(projector.project(&Vector3::new(0.0, 0.0, -800.0)).is_none());
        assert!(projector.project(&Vector3::new(0.0, 0.0, -900.0)).is_none());
    }

    #[test]
    fn test_pan_then_zoom() {
        let mut projector = Projector::new(ProjectorConfig::default(), Dimensionality::Planar);
        projector.set_pan_zoom(Vector2::new(10.0, -20.0), 2.0).unwrap();
        let screen = projector.project(&Vector3::new(100.0, 100.0, 0.0)).unwrap();
        assert_eq!(screen, Vector2::new(220.0, 160.0));
    }

    #[test]
    fn test_invalid_zoom_rejected() {
        let mut projector = Projector::new(ProjectorConfig::default(), Dimensionality::Planar);
        assert!(projector.set_pan_zoom(Vector2::zeros(), 0.0).is_err());
        assert!(projector.set_pan_zoom(Vector2::zeros(), f64::NAN).is_err());
        assert_eq!(
            projector.set_pan_zoom(Vector2::new(f64::INFINITY, 0.0), 1.0),
            Err(ProjectionError::NonFinitePan)
        );
        assert_eq!(projector.zoom(), 1.0);
    }

    #[test]
    fn test_zoom_steps_clamped_to_limits() {
        let mut projector = Projector::new(ProjectorConfig::default(), Dimensionality::Planar);
        projector.zoom_in();
        assert_relative_eq!(projector.zoom(), 1.2);

        for _ in 0..20 {
            projector.zoom_in();
        }
        assert_eq!(projector.zoom(), 3.0);

        for _ in 0..40 {
            projector.zoom_out();
        }
        assert_eq!(projector.zoom(), 0.5);

        projector.center();
        assert_eq!(projector.zoom(), 1.0);
        assert_eq!(projector.pan(), Vector2::zeros());
    }

    #[test]
    fn test_config_validation() {
        assert!(ProjectorConfig::default().validate().is_ok());
        let bad = ProjectorConfig {
            zoom_step: 1.0,
            ..ProjectorConfig::default()
        };
        assert!(matches!(bad.validate(), Err(ConfigError::InvalidZoomLimits { .. })));
    }

    proptest! {
        #[test]
        fn test_unproject_inverts_project(
            x in -1000.0f64..1000.0, y in -1000.0f64..1000.0, z in -200.0f64..200.0,
            px in -500.0f64..500.0, py in -500.0f64..500.0, zoom in 0.01f64..10.0,
        ) {
            let mut projector = Projector::new(ProjectorConfig::default(), Dimensionality::Spatial);
            projector.set_pan_zoom(Vector2::new(px, py), zoom).unwrap();

            let point = Vector3::new(x, y, z);
            let screen = projector.project(&point).unwrap();
            let back = projector.unproject(&screen, z).unwrap();

            prop_assert!((back - point).norm() < 1e-6);
        }
    }
}
