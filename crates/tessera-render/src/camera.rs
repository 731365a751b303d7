//! 2D camera: translation, rotation and zoom shared by every sprite.
//!
//! A world point `p` maps to clip space as
//!
//! ```text
//! clip = zoom * rot * (p - position)
//! ```
//!
//! where `zoom = diag(2 / width, 2 / height)` and `rot` rotates by the negated
//! camera angle, so turning the camera counter-clockwise turns the world
//! clockwise on screen. With the default size of 1x1 the visible world spans
//! `[-0.5, 0.5]` on both axes.
//!
//! # Example
//!
//! ```rust
//! use glam::Vec2;
//! use tessera_render::Camera2D;
//!
//! let mut camera = Camera2D::new();
//! camera.set_position(Vec2::new(10.0, 0.0));
//! camera.set_size(Vec2::new(20.0, 20.0)).unwrap();
//!
//! let clip = camera.world_to_clip(Vec2::new(20.0, 0.0));
//! assert!((clip.x - 1.0).abs() < 1e-6);
//! ```

use tessera_core::math::{Mat2, Mat4, Vec2, Vec3};
use tessera_test_utils::CameraUniform;

use crate::error::CameraError;

/// Camera state. Persists across frames; only the setters mutate it.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera2D {
    position: Vec2,
    size: Vec2,
    angle: f32,
    /// Set when state changed since the last uniform upload.
    dirty: bool,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera2D {
    /// Camera at the origin, 1x1 zoom window, no rotation.
    pub fn new() -> Self {
        Self {
            position: Vec2::ZERO,
            size: Vec2::ONE,
            angle: 0.0,
            dirty: true,
        }
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.dirty = true;
    }

    /// Set the zoom window. Rejects non-finite or non-positive dimensions and
    /// leaves the current size untouched.
    pub fn set_size(&mut self, size: Vec2) -> Result<(), CameraError> {
        if !(size.is_finite() && size.x > 0.0 && size.y > 0.0) {
            return Err(CameraError::InvalidSize {
                width: size.x,
                height: size.y,
            });
        }
        self.size = size;
        self.dirty = true;
        Ok(())
    }

    /// Set the camera angle in radians.
    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle;
        self.dirty = true;
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Per-axis zoom factors, `2 / size`.
    pub fn zoom(&self) -> Vec2 {
        Vec2::new(2.0 / self.size.x, 2.0 / self.size.y)
    }

    /// Rotation applied to camera-relative positions (negated camera angle).
    pub fn rotation(&self) -> Mat2 {
        Mat2::from_angle(-self.angle)
    }

    /// Full world-to-clip matrix. Z passes through unchanged.
    pub fn matrix(&self) -> Mat4 {
        let zoom = self.zoom();
        Mat4::from_scale(Vec3::new(zoom.x, zoom.y, 1.0))
            * Mat4::from_rotation_z(-self.angle)
            * Mat4::from_translation(Vec3::new(-self.position.x, -self.position.y, 0.0))
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            view: self.matrix().to_cols_array_2d(),
        }
    }

    /// Apply the camera transform on the CPU.
    pub fn world_to_clip(&self, point: Vec2) -> Vec2 {
        self.zoom() * (self.rotation() * (point - self.position))
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Return the uniform if state changed since the last call.
    pub(crate) fn take_uniform(&mut self) -> Option<CameraUniform> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.uniform())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn assert_close(a: Vec2, b: Vec2) {
        assert!((a - b).length() < 1e-5, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_defaults() {
        let camera = Camera2D::new();
        assert_eq!(camera.position(), Vec2::ZERO);
        assert_eq!(camera.size(), Vec2::ONE);
        assert_eq!(camera.angle(), 0.0);
        assert_eq!(camera.zoom(), Vec2::new(2.0, 2.0));
        assert_close(camera.world_to_clip(Vec2::new(0.5, -0.5)), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_setters_round_trip() {
        let mut camera = Camera2D::new();
        camera.set_position(Vec2::new(3.5, -2.25));
        camera.set_size(Vec2::new(1920.0, 1080.0)).unwrap();
        camera.set_angle(0.75);

        assert_eq!(camera.position(), Vec2::new(3.5, -2.25));
        assert_eq!(camera.size(), Vec2::new(1920.0, 1080.0));
        assert_eq!(camera.angle(), 0.75);
    }

    #[test]
    fn test_invalid_size_keeps_state() {
        let mut camera = Camera2D::new();
        camera.set_size(Vec2::new(4.0, 2.0)).unwrap();

        for bad in [
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(f32::NAN, 1.0),
            Vec2::new(1.0, f32::INFINITY),
        ] {
            assert!(matches!(
                camera.set_size(bad),
                Err(CameraError::InvalidSize { .. })
            ));
        }
        assert_eq!(camera.size(), Vec2::new(4.0, 2.0));
    }

    #[test]
    fn test_rotation_uses_negated_angle() {
        let mut camera = Camera2D::new();
        camera.set_size(Vec2::new(2.0, 2.0)).unwrap();
        camera.set_angle(FRAC_PI_2);

        // A point above the camera ends up to its right.
        assert_close(camera.world_to_clip(Vec2::new(0.0, 1.0)), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_matrix_matches_cpu_transform() {
        let mut camera = Camera2D::new();
        camera.set_position(Vec2::new(5.0, -3.0));
        camera.set_size(Vec2::new(10.0, 4.0)).unwrap();
        camera.set_angle(0.3);

        for point in [Vec2::ZERO, Vec2::new(7.0, 1.0), Vec2::new(-2.0, 8.5)] {
            let clip = camera.matrix() * point.extend(0.25).extend(1.0);
            assert_close(clip.truncate().truncate(), camera.world_to_clip(point));
            assert!((clip.z - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn test_dirty_tracking() {
        let mut camera = Camera2D::new();
        assert!(camera.take_uniform().is_some());
        assert!(camera.take_uniform().is_none());

        camera.set_angle(1.0);
        assert!(camera.is_dirty());
        assert!(camera.take_uniform().is_some());
    }
}
