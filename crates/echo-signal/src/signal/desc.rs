// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::geom::{BoundSphere, Transform};
use crate::ident::{make_signal_type_id, Handle, SignalTypeId};

/// Producer-side description of a signal.
///
/// Borrowed for the duration of a broadcast only; the path is hashed
/// immediately and never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalDesc<'a> {
    /// Dispatch order key; lower values are delivered first.
    pub priority: i32,
    /// Hierarchical signal path, e.g. `"interact/door/open"`.
    pub path: &'a str,
    /// Free-form bitmask interpreted by receivers.
    pub flags: u32,
    /// Scalar payload (damage amount, volume, ...).
    pub value: f32,
    /// Transform payload.
    pub target_transform: Transform,
    /// Object that emitted the signal, if any.
    pub origin: Option<Handle>,
    /// Delta time of the producing tick.
    pub delta_time: f32,
}

impl<'a> SignalDesc<'a> {
    /// Describes a signal on `path` with priority 0 and empty payload.
    pub fn new(path: &'a str) -> Self {
        Self {
            priority: 0,
            path,
            flags: 0,
            value: 0.0,
            target_transform: Transform::identity(),
            origin: None,
            delta_time: 0.0,
        }
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the flags bitmask.
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the scalar payload.
    pub fn with_value(mut self, value: f32) -> Self {
        self.value = value;
        self
    }

    /// Sets the transform payload.
    pub fn with_target_transform(mut self, transform: Transform) -> Self {
        self.target_transform = transform;
        self
    }

    /// Sets the emitting object.
    pub fn with_origin(mut self, origin: Handle) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Sets the producing tick's delta time.
    pub fn with_delta_time(mut self, dt: f32) -> Self {
        self.delta_time = dt;
        self
    }
}

/// Resolved, immutable form of a [`SignalDesc`] handed to receivers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalContext {
    type_id: SignalTypeId,
    priority: i32,
    flags: u32,
    value: f32,
    bounds_sphere: BoundSphere,
    target_transform: Transform,
    origin: Option<Handle>,
    delta_time: f32,
}

impl SignalContext {
    /// Hashes `desc.path` and captures the payload. `bounds` is the address
    /// sphere of spatial signals and the zero sphere otherwise.
    pub(crate) fn resolve(desc: &SignalDesc<'_>, bounds: BoundSphere) -> Self {
        Self {
            type_id: make_signal_type_id(desc.path),
            priority: desc.priority,
            flags: desc.flags,
            value: desc.value,
            bounds_sphere: bounds,
            target_transform: desc.target_transform,
            origin: desc.origin,
            delta_time: desc.delta_time,
        }
    }

    /// Type id derived from the signal path.
    pub fn type_id(&self) -> SignalTypeId {
        self.type_id
    }

    /// `true` if this signal was broadcast on `path`.
    pub fn is(&self, path: &str) -> bool {
        self.type_id == make_signal_type_id(path)
    }

    /// Dispatch priority.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Flags bitmask.
    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Scalar payload.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Address sphere of a spatial signal; zero radius at the origin otherwise.
    pub fn bounds_sphere(&self) -> BoundSphere {
        self.bounds_sphere
    }

    /// Transform payload.
    pub fn target_transform(&self) -> Transform {
        self.target_transform
    }

    /// Emitting object, if any.
    pub fn origin(&self) -> Option<Handle> {
        self.origin
    }

    /// Delta time of the producing tick.
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{Quat, Vec3};

    #[test]
    fn resolve_copies_payload_and_hashes_path() {
        let desc = SignalDesc::new("damage/fire")
            .with_priority(-3)
            .with_flags(0b101)
            .with_value(12.5)
            .with_delta_time(1.0 / 60.0)
            .with_target_transform(Transform::from_translation(Vec3::new(0.0, 9.0, 0.0)))
            .with_origin(Handle::new(3).unwrap());
        let sphere = BoundSphere::new(Vec3::new(1.0, 2.0, 3.0), 4.0);
        let ctx = SignalContext::resolve(&desc, sphere);
        assert!(ctx.is("damage/fire"));
        assert!(!ctx.is("damage/ice"));
        assert_eq!(ctx.priority(), -3);
        assert_eq!(ctx.flags(), 0b101);
        assert_eq!(ctx.value(), 12.5);
        assert_eq!(ctx.bounds_sphere(), sphere);
        assert_eq!(ctx.origin(), Handle::new(3));
        assert_eq!(ctx.target_transform().translation().y(), 9.0);
        assert_eq!(ctx.target_transform().rotation(), Quat::identity());
    }
}
