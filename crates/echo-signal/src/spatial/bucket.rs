// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::ident::Handle;

/// Fixed-capacity array of raw handles belonging to one spatial cell.
///
/// Raw `0` marks a free slot. Slots are reused first-free, so a handle
/// removed from slot 0 frees slot 0 for the next placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    slots: Box<[u64]>,
}

impl Bucket {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            slots: vec![0; capacity].into_boxed_slice(),
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|&&raw| raw != 0).count()
    }

    /// `true` when every slot is free.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|&raw| raw == 0)
    }

    /// Occupied handles in slot order.
    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.slots.iter().filter_map(|&raw| Handle::new(raw))
    }

    /// Raw slot contents, free slots included.
    pub fn raw_slots(&self) -> &[u64] {
        &self.slots
    }

    fn find_empty_slot(&self) -> Option<usize> {
        self.slots.iter().position(|&raw| raw == 0)
    }

    /// Stores `handle` in the first free slot; `false` when full.
    pub(crate) fn try_insert(&mut self, handle: Handle) -> bool {
        match self.find_empty_slot() {
            Some(idx) => {
                self.slots[idx] = handle.raw();
                true
            }
            None => false,
        }
    }

    /// Clears the first slot holding `handle`.
    pub(crate) fn remove_entry(&mut self, handle: Handle) -> bool {
        match self.slots.iter().position(|&raw| raw == handle.raw()) {
            Some(idx) => {
                self.slots[idx] = 0;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn h(raw: u64) -> Handle {
        Handle::new(raw).unwrap()
    }

    #[test]
    fn slot_zero_is_reused() {
        let mut b = Bucket::new(2);
        assert!(b.try_insert(h(1)));
        assert!(b.try_insert(h(2)));
        assert!(!b.try_insert(h(3)));
        assert!(b.remove_entry(h(1)));
        assert!(b.try_insert(h(3)));
        assert_eq!(b.raw_slots(), &[3, 2]);
    }

    #[test]
    fn remove_clears_first_match_only() {
        let mut b = Bucket::new(3);
        b.try_insert(h(7));
        b.try_insert(h(7));
        assert!(b.remove_entry(h(7)));
        assert_eq!(b.handles().collect::<Vec<_>>(), vec![h(7)]);
        assert!(!b.remove_entry(h(9)));
    }
}
