//! Axis-aligned bounding boxes for coarse collision.

use glam::Vec3;

use crate::Transform;

/// An axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Box centered on `center` with the given half extents.
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// World-space box enclosing a local box of `half_extents` after `transform`.
    ///
    /// All eight corners are transformed, so tilted objects grow their box.
    pub fn from_transform(transform: &Transform, half_extents: Vec3) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { -half_extents.x } else { half_extents.x },
                if i & 2 == 0 { -half_extents.y } else { half_extents.y },
                if i & 4 == 0 { -half_extents.z } else { half_extents.z },
            );
            let world = transform.transform_point(corner);
            min = min.min(world);
            max = max.max(world);
        }
        Self { min, max }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Overlap test; touching faces count as intersecting.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}
