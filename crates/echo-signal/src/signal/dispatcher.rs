// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tick-scoped signal dispatch.
//!
//! Producers call the `broadcast_*` family (or [`SignalDispatcher::submit`])
//! through a shared reference while a tick runs. Once producers are done the
//! owner calls [`SignalDispatcher::dispatch`], which needs `&mut self`, so the
//! borrow checker keeps dispatch and registry edits out of any window in which
//! shared references are handed to producer threads.
//!
//! Dispatch expands every queued broadcast into `(signal, receiver)` entries
//! (global, then targeted, then spatial), stable-sorts them by ascending
//! priority and delivers in that order. All working storage is cleared before
//! returning, so nothing leaks into the next tick.

use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, instrument, trace};

use super::desc::{SignalContext, SignalDesc};
use super::queue::{BroadcastBatch, PendingBroadcasts, PendingCounts};
use super::receiver::SignalReceiver;
use super::registry::Registry;
use crate::config::{ConfigError, DispatcherConfig};
use crate::geom::BoundSphere;
use crate::ident::Handle;
use crate::math::Vec3;
use crate::spatial::{cell_span, cells_overlapping, SpatialCellKey, SpatialIndex};
use crate::table::TableError;

/// Errors surfaced by registry and spatial operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SignalError {
    /// A receiver with the same identifier is already registered.
    #[error("handle {0} is already registered")]
    DuplicateHandle(Handle),
    /// The handle does not name a registered receiver.
    #[error("handle {0} is not registered")]
    UnknownHandle(Handle),
    /// A backing table could not take another entry.
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Summary of one [`SignalDispatcher::dispatch`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchReport {
    /// Broadcasts drained from the queues.
    pub queued: PendingCounts,
    /// `(signal, receiver)` pairs built and delivered.
    pub entries: usize,
    /// Deliveries the receiver accepted.
    pub delivered: usize,
    /// Deliveries the receiver rejected.
    pub rejected: usize,
    /// Targets that did not resolve to a registered receiver, plus spatial
    /// broadcasts whose sphere was non-finite or touched more than
    /// [`DispatcherConfig::max_broadcast_cells`] cells.
    pub dropped: usize,
}

#[derive(Debug, Clone, Copy)]
struct DispatchEntry {
    priority: i32,
    target: usize,
    signal: usize,
}

/// Per-scene signal bus over receivers of type `O`.
///
/// The dispatcher owns its receivers: [`Self::register_object`] moves the
/// object in and [`Self::unregister_object`] hands it back.
#[derive(Debug)]
pub struct SignalDispatcher<O> {
    config: DispatcherConfig,
    pending: Mutex<PendingBroadcasts>,
    registry: Registry<O>,
    space: SpatialIndex,
    signals: Vec<SignalContext>,
    entries: Vec<DispatchEntry>,
}

impl<O: SignalReceiver> Default for SignalDispatcher<O> {
    fn default() -> Self {
        Self::build(DispatcherConfig::default())
    }
}

impl<O: SignalReceiver> SignalDispatcher<O> {
    /// Creates a dispatcher with [`DispatcherConfig::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dispatcher sized by `config`.
    pub fn with_config(config: DispatcherConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: DispatcherConfig) -> Self {
        Self {
            pending: Mutex::new(PendingBroadcasts::with_reserve(config.queue_reserve)),
            registry: Registry::new(
                config.registry_reserve,
                config.table_reserve,
                config.table_limit,
            ),
            space: SpatialIndex::from_config(&config),
            signals: Vec::with_capacity(config.output_reserve),
            entries: Vec::with_capacity(config.output_reserve),
            config,
        }
    }

    /// Configuration this dispatcher was built with.
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, PendingBroadcasts> {
        // A producer that panicked mid-push leaves at worst one extra entry.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── producers ────────────────────────────────────────────────────────

    /// Queues `desc` for every registered receiver.
    pub fn broadcast_global(&self, desc: &SignalDesc<'_>) {
        let ctx = SignalContext::resolve(desc, BoundSphere::default());
        self.lock_pending().push_global(ctx);
    }

    /// Queues `desc` for every receiver placed in a cell touched by the
    /// bounding box of `sphere`.
    pub fn broadcast_spatial(&self, desc: &SignalDesc<'_>, sphere: BoundSphere) {
        let ctx = SignalContext::resolve(desc, sphere);
        self.lock_pending().push_spatial(ctx, sphere);
    }

    /// Queues `desc` for `target` only. Unknown targets are dropped at dispatch.
    pub fn broadcast_targeted(&self, desc: &SignalDesc<'_>, target: Handle) {
        let ctx = SignalContext::resolve(desc, BoundSphere::default());
        self.lock_pending().push_targeted(ctx, target);
    }

    /// Moves every broadcast staged in `batch` into the queues under a single
    /// lock acquisition, leaving `batch` empty for reuse.
    pub fn submit(&self, batch: &mut BroadcastBatch) {
        if batch.is_empty() {
            return;
        }
        self.lock_pending().append(&mut batch.inner);
    }

    /// Current queue lengths.
    pub fn pending(&self) -> PendingCounts {
        self.lock_pending().counts()
    }

    // ── registry ─────────────────────────────────────────────────────────

    /// Registers `obj` under its [`SignalReceiver::identifier`].
    ///
    /// The object is not placed in space; call [`Self::place_in_space`].
    pub fn register_object(&mut self, obj: O) -> Result<Handle, SignalError> {
        self.registry.insert(obj)
    }

    /// Removes the receiver and every spatial entry recorded for it, returning
    /// it.
    ///
    /// Entries left in old cells by moves that were never retracked go too,
    /// so a later registration under the same handle starts unplaced.
    pub fn unregister_object(&mut self, handle: Handle) -> Option<O> {
        let dense = self.registry.resolve(handle)?;
        for key in self.registry.take_placements(dense) {
            self.space.remove(handle, key);
        }
        let obj = self.registry.remove(handle);
        trace!(%handle, "receiver unregistered");
        obj
    }

    /// `true` if `handle` is registered.
    pub fn contains(&self, handle: Handle) -> bool {
        self.registry.contains(handle)
    }

    /// Registered receiver for `handle`.
    pub fn object(&self, handle: Handle) -> Option<&O> {
        self.registry.get(handle)
    }

    /// Mutable receiver for `handle`.
    ///
    /// Moving the object does not move its spatial placement; follow up with
    /// [`Self::retrack_in_space`].
    pub fn object_mut(&mut self, handle: Handle) -> Option<&mut O> {
        self.registry.get_mut(handle)
    }

    /// Number of registered receivers.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// `true` when no receiver is registered.
    pub fn is_empty(&self) -> bool {
        self.registry.len() == 0
    }

    /// Registered handles in dense order.
    pub fn handles(&self) -> &[Handle] {
        self.registry.handles()
    }

    /// `true` when a removal has not yet been folded into the registry
    /// pre-filter. The next dispatch rebuilds it.
    pub fn is_cache_stale(&self) -> bool {
        self.registry.is_stale()
    }

    // ── space ────────────────────────────────────────────────────────────

    /// Read access to the spatial index.
    pub fn space(&self) -> &SpatialIndex {
        &self.space
    }

    /// Adds the receiver to the cell containing its current position.
    ///
    /// Placing an object twice without removing it stores it twice.
    pub fn place_in_space(&mut self, handle: Handle) -> Result<(), SignalError> {
        let dense = self
            .registry
            .resolve(handle)
            .ok_or(SignalError::UnknownHandle(handle))?;
        let key = SpatialCellKey::from_position(self.registry.at(dense).world_position());
        self.space.add(handle, key)?;
        self.registry.record_placement(dense, key);
        Ok(())
    }

    /// Moves the receiver from the cell containing `old_position` to the cell
    /// containing its current position.
    pub fn retrack_in_space(
        &mut self,
        handle: Handle,
        old_position: Vec3,
    ) -> Result<(), SignalError> {
        let dense = self
            .registry
            .resolve(handle)
            .ok_or(SignalError::UnknownHandle(handle))?;
        let old_key = SpatialCellKey::from_position(old_position);
        let new_key = SpatialCellKey::from_position(self.registry.at(dense).world_position());
        if old_key == new_key && self.space.contains(handle, old_key) {
            return Ok(());
        }
        if self.space.remove(handle, old_key) {
            self.registry.forget_placement(dense, old_key);
        }
        self.space.add(handle, new_key)?;
        self.registry.record_placement(dense, new_key);
        Ok(())
    }

    /// Removes the receiver from the cell containing its current position.
    ///
    /// Returns whether a placement was found there. Entries in cells the
    /// receiver left without a retrack stay until it is unregistered or the
    /// space is rebuilt.
    pub fn remove_from_space(&mut self, handle: Handle) -> Result<bool, SignalError> {
        let dense = self
            .registry
            .resolve(handle)
            .ok_or(SignalError::UnknownHandle(handle))?;
        let key = SpatialCellKey::from_position(self.registry.at(dense).world_position());
        let removed = self.space.remove(handle, key);
        if removed {
            self.registry.forget_placement(dense, key);
        }
        Ok(removed)
    }

    /// Clears the spatial index and places every previously placed receiver
    /// once, at its current position. Also releases buckets left empty by
    /// removals.
    pub fn rebuild_space(&mut self) -> Result<(), SignalError> {
        self.space.reset();
        for dense in 0..self.registry.len() {
            if !self.registry.is_placed(dense) {
                continue;
            }
            let obj = self.registry.at(dense);
            let key = SpatialCellKey::from_position(obj.world_position());
            self.space.add(obj.identifier(), key)?;
            self.registry.reset_placement(dense, key);
        }
        debug!(cells = self.space.cell_count(), "spatial index rebuilt");
        Ok(())
    }

    // ── dispatch ─────────────────────────────────────────────────────────

    /// Drops every queued broadcast without delivering it.
    pub fn reset(&mut self) {
        self.pending
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Delivers every queued broadcast, lowest priority value first.
    ///
    /// # Panics
    /// If a paired queue (spatial signals/spheres, targeted signals/handles)
    /// is out of step, which indicates memory corruption rather than misuse.
    #[instrument(level = "debug", name = "signal.dispatch", skip(self))]
    pub fn dispatch(&mut self) -> DispatchReport {
        let pending = self.pending.get_mut().unwrap_or_else(PoisonError::into_inner);
        pending.assert_consistent();
        if self.registry.is_stale() {
            self.registry.rebuild_cache();
        }

        let mut report = DispatchReport {
            queued: pending.counts(),
            ..DispatchReport::default()
        };
        let receivers = self.registry.len();

        for ctx in &pending.global {
            let signal = self.signals.len();
            self.signals.push(*ctx);
            self.entries.extend((0..receivers).map(|target| DispatchEntry {
                priority: ctx.priority(),
                target,
                signal,
            }));
        }

        for (ctx, &target) in pending.targeted.iter().zip(&pending.targets) {
            let Some(dense) = self.registry.resolve(target) else {
                report.dropped += 1;
                trace!(handle = %target, "targeted signal dropped: unknown receiver");
                continue;
            };
            self.entries.push(DispatchEntry {
                priority: ctx.priority(),
                target: dense,
                signal: self.signals.len(),
            });
            self.signals.push(*ctx);
        }

        for (ctx, sphere) in pending.spatial.iter().zip(&pending.spheres) {
            if !sphere.is_finite() {
                report.dropped += 1;
                trace!(?sphere, "spatial signal dropped: non-finite sphere");
                continue;
            }
            let bounds = sphere.to_aabb();
            let limit = self.config.max_broadcast_cells;
            let Some(cells) = cell_span(&bounds).filter(|&n| n <= limit) else {
                report.dropped += 1;
                trace!(?sphere, "spatial signal dropped: sphere touches too many cells");
                continue;
            };
            trace!(cells, "spatial signal expanded");
            let signal = self.signals.len();
            self.signals.push(*ctx);
            for key in cells_overlapping(&bounds) {
                for handle in self.space.occupants(key) {
                    match self.registry.resolve(handle) {
                        Some(target) => self.entries.push(DispatchEntry {
                            priority: ctx.priority(),
                            target,
                            signal,
                        }),
                        None => {
                            report.dropped += 1;
                            trace!(%handle, ?key, "spatial signal dropped: stale placement");
                        }
                    }
                }
            }
        }

        // Stable: equal priorities keep build order.
        self.entries.sort_by_key(|entry| entry.priority);
        report.entries = self.entries.len();

        for entry in &self.entries {
            let ctx = &self.signals[entry.signal];
            let receiver = self.registry.at_mut(entry.target);
            match receiver.deliver_signal(ctx) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    report.rejected += 1;
                    trace!(receiver = %receiver.identifier(), %err, "delivery rejected");
                }
            }
        }

        pending.clear();
        self.signals.clear();
        self.entries.clear();

        debug!(
            queued = report.queued.total(),
            entries = report.entries,
            delivered = report.delivered,
            rejected = report.rejected,
            dropped = report.dropped,
            "dispatch complete"
        );
        report
    }

    /// Lengths of every per-dispatch working array, queues included.
    #[cfg(test)]
    fn working_set_len(&mut self) -> usize {
        let pending = self.pending.get_mut().unwrap_or_else(PoisonError::into_inner);
        pending.global.len()
            + pending.spatial.len()
            + pending.spheres.len()
            + pending.targeted.len()
            + pending.targets.len()
            + self.signals.len()
            + self.entries.len()
    }
}
