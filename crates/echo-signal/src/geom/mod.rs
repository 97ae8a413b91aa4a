// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Geometry carried by signals.
//!
//! - Overlap semantics are inclusive on faces, matching the cell walk in the
//!   spatial expansion (a sphere touching a cell boundary visits that cell).
//! - Float32 throughout.

#[doc = "Axis-aligned bounding boxes (world space)."]
pub mod aabb;
#[doc = "Bounding spheres used to address spatial signals."]
pub mod sphere;
#[doc = "Rigid transforms with non-uniform scale."]
pub mod transform;

pub use aabb::Aabb;
pub use sphere::BoundSphere;
pub use transform::Transform;
