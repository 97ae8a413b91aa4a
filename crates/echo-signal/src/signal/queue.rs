// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pending broadcast storage.
//!
//! Each addressing mode keeps parallel arrays: spatial signals pair with a
//! sphere, targeted signals with a handle. Lengths of paired arrays must match
//! at all times.

use super::desc::{SignalContext, SignalDesc};
use crate::geom::BoundSphere;
use crate::ident::Handle;

/// Queue lengths at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingCounts {
    /// Queued global broadcasts.
    pub global: usize,
    /// Queued spatial broadcasts.
    pub spatial: usize,
    /// Queued targeted broadcasts.
    pub targeted: usize,
}

impl PendingCounts {
    /// Sum over every mode.
    pub fn total(&self) -> usize {
        self.global + self.spatial + self.targeted
    }
}

#[derive(Debug, Default)]
pub(crate) struct PendingBroadcasts {
    pub(crate) global: Vec<SignalContext>,
    pub(crate) spatial: Vec<SignalContext>,
    pub(crate) spheres: Vec<BoundSphere>,
    pub(crate) targeted: Vec<SignalContext>,
    pub(crate) targets: Vec<Handle>,
}

impl PendingBroadcasts {
    pub(crate) fn with_reserve(n: usize) -> Self {
        Self {
            global: Vec::with_capacity(n),
            spatial: Vec::with_capacity(n),
            spheres: Vec::with_capacity(n),
            targeted: Vec::with_capacity(n),
            targets: Vec::with_capacity(n),
        }
    }

    pub(crate) fn push_global(&mut self, ctx: SignalContext) {
        self.global.push(ctx);
    }

    pub(crate) fn push_spatial(&mut self, ctx: SignalContext, sphere: BoundSphere) {
        self.spatial.push(ctx);
        self.spheres.push(sphere);
    }

    pub(crate) fn push_targeted(&mut self, ctx: SignalContext, target: Handle) {
        self.targeted.push(ctx);
        self.targets.push(target);
    }

    /// Moves every entry of `other` to the back of `self`, mode by mode.
    pub(crate) fn append(&mut self, other: &mut Self) {
        self.global.append(&mut other.global);
        self.spatial.append(&mut other.spatial);
        self.spheres.append(&mut other.spheres);
        self.targeted.append(&mut other.targeted);
        self.targets.append(&mut other.targets);
    }

    pub(crate) fn counts(&self) -> PendingCounts {
        PendingCounts {
            global: self.global.len(),
            spatial: self.spatial.len(),
            targeted: self.targeted.len(),
        }
    }

    /// # Panics
    /// If a paired array drifted out of step.
    pub(crate) fn assert_consistent(&self) {
        assert_eq!(
            self.spatial.len(),
            self.spheres.len(),
            "spatial signals and spheres out of step"
        );
        assert_eq!(
            self.targeted.len(),
            self.targets.len(),
            "targeted signals and handles out of step"
        );
    }

    pub(crate) fn clear(&mut self) {
        self.global.clear();
        self.spatial.clear();
        self.spheres.clear();
        self.targeted.clear();
        self.targets.clear();
    }
}

/// Worker-local staging area for broadcasts.
///
/// Producers fill a batch without touching the dispatcher's lock, then hand
/// it over with [`SignalDispatcher::submit`](super::SignalDispatcher::submit).
/// Submitting a batch is equivalent to issuing its broadcasts one by one in
/// the order they were staged within each mode.
#[derive(Debug, Default)]
pub struct BroadcastBatch {
    pub(crate) inner: PendingBroadcasts,
}

impl BroadcastBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a global broadcast.
    pub fn global(&mut self, desc: &SignalDesc<'_>) -> &mut Self {
        self.inner
            .push_global(SignalContext::resolve(desc, BoundSphere::default()));
        self
    }

    /// Stages a spatial broadcast addressed to `sphere`.
    pub fn spatial(&mut self, desc: &SignalDesc<'_>, sphere: BoundSphere) -> &mut Self {
        self.inner
            .push_spatial(SignalContext::resolve(desc, sphere), sphere);
        self
    }

    /// Stages a broadcast for `target` only.
    pub fn targeted(&mut self, desc: &SignalDesc<'_>, target: Handle) -> &mut Self {
        self.inner
            .push_targeted(SignalContext::resolve(desc, BoundSphere::default()), target);
        self
    }

    /// Staged entries per mode.
    pub fn counts(&self) -> PendingCounts {
        self.inner.counts()
    }

    /// Number of staged broadcasts.
    pub fn len(&self) -> usize {
        self.inner.counts().total()
    }

    /// `true` when nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    #[test]
    fn append_drains_source_and_keeps_pairs() {
        let mut batch = BroadcastBatch::new();
        let sphere = BoundSphere::new(Vec3::ZERO, 2.0);
        batch
            .global(&SignalDesc::new("a"))
            .spatial(&SignalDesc::new("b"), sphere)
            .targeted(&SignalDesc::new("c"), Handle::new(4).unwrap());
        let mut pending = PendingBroadcasts::with_reserve(8);
        pending.append(&mut batch.inner);
        assert!(batch.is_empty());
        assert_eq!(
            pending.counts(),
            PendingCounts {
                global: 1,
                spatial: 1,
                targeted: 1
            }
        );
        pending.assert_consistent();
        assert_eq!(pending.spheres, vec![sphere]);
        pending.clear();
        assert_eq!(pending.counts().total(), 0);
    }

    #[test]
    #[should_panic(expected = "spatial signals and spheres out of step")]
    fn unpaired_spatial_signal_panics() {
        let mut pending = PendingBroadcasts::default();
        pending
            .spatial
            .push(SignalContext::resolve(&SignalDesc::new("a"), BoundSphere::default()));
        pending.assert_consistent();
    }

    #[test]
    #[should_panic(expected = "targeted signals and handles out of step")]
    fn unpaired_target_panics() {
        let mut pending = PendingBroadcasts::default();
        pending.targets.push(Handle::new(3).unwrap());
        pending.assert_consistent();
    }
}
