//! Transform component and utilities for spatial positioning.

use glam::{EulerRot, Quat, Vec3};

/// A 3D transform representing position, rotation, and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform at the given position.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a new transform with position and rotation.
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Translate the transform by a delta.
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Euler angles (pitch, yaw, roll) in XYZ order.
    pub fn euler(&self) -> Vec3 {
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        Vec3::new(x, y, z)
    }

    /// Replace the rotation from XYZ euler angles.
    pub fn set_euler(&mut self, angles: Vec3) {
        self.rotation = Quat::from_euler(EulerRot::XYZ, angles.x, angles.y, angles.z);
    }

    /// Apply an incremental euler rotation (radians) on top of the current one.
    pub fn rotate_euler(&mut self, delta: Vec3) {
        self.rotation = Quat::from_euler(EulerRot::XYZ, delta.x, delta.y, delta.z) * self.rotation;
    }

    /// Transform a point from local space to world space.
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * (local * self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euler_round_trip_within_tolerance() {
        let mut t = Transform::default();
        t.set_euler(Vec3::new(0.2, 0.7, -0.1));
        let e = t.euler();
        assert!((e.x - 0.2).abs() < 1e-4);
        assert!((e.y - 0.7).abs() < 1e-4);
        assert!((e.z + 0.1).abs() < 1e-4);
    }

    #[test]
    fn transform_point_applies_scale_then_translation() {
        let t = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            scale: Vec3::splat(2.0),
            ..Default::default()
        };
        assert_eq!(t.transform_point(Vec3::X), Vec3::new(3.0, 2.0, 3.0));
    }
}
