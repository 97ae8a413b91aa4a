// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Handle → receiver registry.
//!
//! Receivers live in a dense array; a hash table maps each handle to its
//! dense index and a bloom filter rejects unknown handles early. The filter
//! cannot forget, so removals mark it stale until the next rebuild.
//!
//! The registry also records every cell a receiver was placed in, so its
//! entries can be taken out of the spatial index when it leaves, wherever it
//! has moved since.

use tracing::debug;

use super::dispatcher::SignalError;
use super::receiver::SignalReceiver;
use crate::bloom::BloomFilter;
use crate::ident::Handle;
use crate::spatial::SpatialCellKey;
use crate::table::OpenAddressingHashTable;

/// Pre-filter over registered handles (1024 bytes, 4 hashes).
pub(crate) type RegistryBloom = BloomFilter<Handle, 1024, 4>;

#[derive(Debug)]
pub(crate) struct Registry<O> {
    objects: Vec<O>,
    handles: Vec<Handle>,
    placements: Vec<Vec<SpatialCellKey>>,
    index: OpenAddressingHashTable<Handle, usize>,
    bloom: RegistryBloom,
    stale: bool,
}

impl<O: SignalReceiver> Registry<O> {
    pub(crate) fn new(
        reserve: usize,
        table_reserve: usize,
        table_limit: Option<usize>,
    ) -> Self {
        let mut index = OpenAddressingHashTable::new();
        if let Some(limit) = table_limit {
            index = index.with_limit(limit);
        }
        index.reserve(table_reserve);
        Self {
            objects: Vec::with_capacity(reserve),
            handles: Vec::with_capacity(reserve),
            placements: Vec::with_capacity(reserve),
            index,
            bloom: RegistryBloom::new(),
            stale: false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.objects.len()
    }

    pub(crate) fn handles(&self) -> &[Handle] {
        &self.handles
    }

    pub(crate) fn is_stale(&self) -> bool {
        self.stale
    }

    /// Dense index of `handle`, consulting the bloom filter first.
    pub(crate) fn resolve(&self, handle: Handle) -> Option<usize> {
        if !self.bloom.might_exist(&handle) {
            return None;
        }
        self.index.find(handle).copied()
    }

    pub(crate) fn contains(&self, handle: Handle) -> bool {
        self.resolve(handle).is_some()
    }

    pub(crate) fn get(&self, handle: Handle) -> Option<&O> {
        self.resolve(handle).map(|i| &self.objects[i])
    }

    pub(crate) fn get_mut(&mut self, handle: Handle) -> Option<&mut O> {
        self.resolve(handle).map(|i| &mut self.objects[i])
    }

    pub(crate) fn at(&self, dense: usize) -> &O {
        &self.objects[dense]
    }

    pub(crate) fn at_mut(&mut self, dense: usize) -> &mut O {
        &mut self.objects[dense]
    }

    /// Whether the object at `dense` holds any spatial placement.
    pub(crate) fn is_placed(&self, dense: usize) -> bool {
        !self.placements[dense].is_empty()
    }

    pub(crate) fn record_placement(&mut self, dense: usize, key: SpatialCellKey) {
        self.placements[dense].push(key);
    }

    /// Forgets one recorded entry in `key`.
    pub(crate) fn forget_placement(&mut self, dense: usize, key: SpatialCellKey) {
        let cells = &mut self.placements[dense];
        if let Some(pos) = cells.iter().position(|&k| k == key) {
            cells.swap_remove(pos);
        }
    }

    pub(crate) fn take_placements(&mut self, dense: usize) -> Vec<SpatialCellKey> {
        std::mem::take(&mut self.placements[dense])
    }

    /// Replaces every recorded entry with a single one in `key`.
    pub(crate) fn reset_placement(&mut self, dense: usize, key: SpatialCellKey) {
        let cells = &mut self.placements[dense];
        cells.clear();
        cells.push(key);
    }

    pub(crate) fn insert(&mut self, obj: O) -> Result<Handle, SignalError> {
        let handle = obj.identifier();
        if self.contains(handle) {
            return Err(SignalError::DuplicateHandle(handle));
        }
        self.index.insert(handle, self.objects.len())?;
        self.bloom.insert(&handle);
        self.objects.push(obj);
        self.handles.push(handle);
        self.placements.push(Vec::new());
        Ok(handle)
    }

    /// Swap-removes `handle`, fixing the index of the moved object.
    pub(crate) fn remove(&mut self, handle: Handle) -> Option<O> {
        let dense = self.resolve(handle)?;
        self.index.remove(handle);
        let obj = self.objects.swap_remove(dense);
        self.handles.swap_remove(dense);
        self.placements.swap_remove(dense);
        if let Some(&moved) = self.handles.get(dense) {
            if let Some(slot) = self.index.find_mut(moved) {
                *slot = dense;
            }
        }
        self.stale = true;
        Some(obj)
    }

    /// Refills the bloom filter from the live handle list.
    pub(crate) fn rebuild_cache(&mut self) {
        self.bloom.reset();
        for handle in &self.handles {
            self.bloom.insert(handle);
        }
        self.stale = false;
        debug!(objects = self.handles.len(), "registry bloom rebuilt");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Vec3;
    use crate::signal::{DeliveryResult, SignalContext};

    struct Stub(Handle);

    impl SignalReceiver for Stub {
        fn identifier(&self) -> Handle {
            self.0
        }
        fn world_position(&self) -> Vec3 {
            Vec3::ZERO
        }
        fn deliver_signal(&mut self, _ctx: &SignalContext) -> DeliveryResult {
            Ok(())
        }
    }

    fn h(raw: u64) -> Handle {
        Handle::new(raw).unwrap()
    }

    #[test]
    fn swap_remove_repoints_moved_object() {
        let mut reg = Registry::new(4, 7, None);
        for raw in 1..=3 {
            reg.insert(Stub(h(raw))).unwrap();
        }
        assert_eq!(reg.remove(h(1)).map(|p| p.0), Some(h(1)));
        assert_eq!(reg.handles(), &[h(3), h(2)]);
        assert_eq!(reg.resolve(h(3)), Some(0));
        assert_eq!(reg.resolve(h(2)), Some(1));
        assert!(reg.resolve(h(1)).is_none());
        assert!(reg.is_stale());
        reg.rebuild_cache();
        assert!(!reg.is_stale());
        assert_eq!(reg.get(h(2)).map(|p| p.0), Some(h(2)));
    }

    #[test]
    fn duplicate_handles_are_refused() {
        let mut reg = Registry::new(4, 7, None);
        reg.insert(Stub(h(9))).unwrap();
        assert!(matches!(
            reg.insert(Stub(h(9))),
            Err(SignalError::DuplicateHandle(d)) if d == h(9)
        ));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn placements_follow_swap_remove() {
        let mut reg = Registry::new(4, 7, None);
        reg.insert(Stub(h(1))).unwrap();
        reg.insert(Stub(h(2))).unwrap();
        let a = SpatialCellKey::from_cell(0, 0, 0);
        let b = SpatialCellKey::from_cell(1, 0, 0);
        reg.record_placement(1, a);
        reg.record_placement(1, b);
        reg.record_placement(1, a);
        reg.forget_placement(1, a);
        reg.remove(h(1));
        let dense = reg.resolve(h(2)).unwrap();
        assert_eq!(dense, 0);
        let mut cells = reg.take_placements(dense);
        cells.sort();
        assert_eq!(cells, vec![a, b]);
        assert!(!reg.is_placed(dense));
    }
}
