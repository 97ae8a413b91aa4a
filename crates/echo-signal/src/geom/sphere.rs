// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::geom::Aabb;
use crate::math::Vec3;

/// Bounding sphere addressing a spatial broadcast.
///
/// A negative radius is treated as zero, so the sphere always degrades to a
/// point rather than an inverted box.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct BoundSphere {
    center: Vec3,
    radius: f32,
}

impl BoundSphere {
    /// Creates a sphere from its centre and radius.
    #[must_use]
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
        }
    }

    /// Sphere centre.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Sphere radius (never negative).
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// `true` when the centre and radius are finite numbers.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.radius.is_finite() && self.center.is_finite()
    }

    /// Smallest axis-aligned box enclosing the sphere.
    #[must_use]
    pub fn to_aabb(&self) -> Aabb {
        Aabb::from_center_half_extents(self.center, self.radius, self.radius, self.radius)
    }
}
