// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Open-addressing hash table with linear probing and multi-value keys.
//!
//! Keys map to a raw `u64` through [`TableKey`]; raw `0` is reserved as the
//! empty marker and is rejected on insert. A key may be inserted more than
//! once: every insert lands in its own slot, and the copies are addressed by
//! an *occurrence* index in probe order ([`OpenAddressingHashTable::find_nth`]).
//! The spatial index relies on this to chain several buckets under one cell.
//!
//! Probe sequence: `(raw + attempt) mod capacity` for `attempt in 0..capacity`.
//! Capacities are prime. Removal leaves a tombstone in place (no compaction),
//! so lookups keep walking past vacated slots and stop at the first
//! never-used slot.

use thiserror::Error;
use tracing::warn;

/// Smallest capacity allocated on first insert.
const MIN_CAPACITY: usize = 7;

/// Maximum load (numerator over 10) before the table grows.
const MAX_LOAD_TENTHS: usize = 7;

/// Keys storable in an [`OpenAddressingHashTable`].
pub trait TableKey: Copy + Eq {
    /// Raw probe value. `0` is reserved and never stored.
    fn to_raw(self) -> u64;
}

impl TableKey for u64 {
    fn to_raw(self) -> u64 {
        self
    }
}

impl TableKey for u32 {
    fn to_raw(self) -> u64 {
        u64::from(self)
    }
}

impl TableKey for crate::ident::Handle {
    fn to_raw(self) -> u64 {
        self.raw()
    }
}

/// Errors surfaced by table inserts.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// Key maps to the reserved raw value `0`.
    #[error("key 0 is reserved as the empty marker")]
    ReservedKey,
    /// Growth was refused by the configured limit and no vacant slot remains.
    #[error("hash table exhausted at capacity {capacity}")]
    CapacityExhausted {
        /// Capacity at the time of the failed insert.
        capacity: usize,
    },
}

#[derive(Debug, Clone)]
enum Slot<K, V> {
    /// Never used since the last clear/rehash; terminates lookups.
    Empty,
    /// Previously occupied; lookups continue past it, inserts may reuse it.
    Vacated,
    Occupied(K, V),
}

/// Fixed-slot hash table; see the module docs for probing and occurrence
/// semantics.
#[derive(Debug, Clone)]
pub struct OpenAddressingHashTable<K, V> {
    slots: Vec<Slot<K, V>>,
    len: usize,
    vacated: usize,
    limit: Option<usize>,
}

impl<K: TableKey, V> Default for OpenAddressingHashTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: TableKey, V> OpenAddressingHashTable<K, V> {
    /// Creates an empty table; storage is allocated on first insert.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
            vacated: 0,
            limit: None,
        }
    }

    /// Creates an empty table with room for at least `amount` slots.
    pub fn with_capacity(amount: usize) -> Self {
        let mut table = Self::new();
        table.reserve(amount);
        table
    }

    /// Caps growth: the table never rehashes to more than `limit` slots.
    ///
    /// Once the cap is reached, inserts keep filling vacant slots past the
    /// usual load threshold and fail with [`TableError::CapacityExhausted`]
    /// when none remain.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Number of stored values (occurrences included).
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` when no values are stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Grows to the next prime `>= amount` slots if currently smaller.
    ///
    /// Requests beyond the configured limit are ignored.
    pub fn reserve(&mut self, amount: usize) {
        if amount <= self.capacity() {
            return;
        }
        let target = next_prime(amount.max(MIN_CAPACITY));
        if self.limit.is_some_and(|limit| target > limit) {
            return;
        }
        self.rehash(target);
    }

    /// Drops every value, keeping the allocated slots.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot::Empty;
        }
        self.len = 0;
        self.vacated = 0;
    }

    /// Stores `value` under `key` in the first vacant slot of its probe
    /// sequence.
    ///
    /// An existing key is not replaced; the value becomes an additional
    /// occurrence. Use [`Self::upsert`] for map semantics.
    ///
    /// # Errors
    /// [`TableError::ReservedKey`] for raw key `0`;
    /// [`TableError::CapacityExhausted`] when the table is full and may not grow.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), TableError> {
        if key.to_raw() == 0 {
            return Err(TableError::ReservedKey);
        }
        self.grow_for_insert();
        let Some(idx) = self.probe_vacant(key) else {
            let capacity = self.capacity();
            warn!(capacity, limit = ?self.limit, "hash table exhausted");
            return Err(TableError::CapacityExhausted { capacity });
        };
        if matches!(self.slots[idx], Slot::Vacated) {
            self.vacated -= 1;
        }
        self.slots[idx] = Slot::Occupied(key, value);
        self.len += 1;
        Ok(())
    }

    /// Replaces occurrence 0 of `key` if present, otherwise inserts.
    /// Returns the replaced value.
    ///
    /// # Errors
    /// Same as [`Self::insert`].
    pub fn upsert(&mut self, key: K, value: V) -> Result<Option<V>, TableError> {
        if let Some(slot) = self.find_nth_mut(key, 0) {
            return Ok(Some(std::mem::replace(slot, value)));
        }
        self.insert(key, value).map(|()| None)
    }

    /// Returns occurrence 0 of `key`.
    pub fn find(&self, key: K) -> Option<&V> {
        self.find_nth(key, 0)
    }

    /// Mutable occurrence 0 of `key`.
    pub fn find_mut(&mut self, key: K) -> Option<&mut V> {
        self.find_nth_mut(key, 0)
    }

    /// Returns the `occurrence`-th value stored under `key`, in probe order.
    pub fn find_nth(&self, key: K, occurrence: usize) -> Option<&V> {
        let idx = self.find_index(key, occurrence)?;
        match &self.slots[idx] {
            Slot::Occupied(_, v) => Some(v),
            Slot::Empty | Slot::Vacated => None,
        }
    }

    /// Mutable `occurrence`-th value stored under `key`.
    pub fn find_nth_mut(&mut self, key: K, occurrence: usize) -> Option<&mut V> {
        let idx = self.find_index(key, occurrence)?;
        match &mut self.slots[idx] {
            Slot::Occupied(_, v) => Some(v),
            Slot::Empty | Slot::Vacated => None,
        }
    }

    /// `true` if at least one value is stored under `key`.
    pub fn exists(&self, key: K) -> bool {
        self.find_index(key, 0).is_some()
    }

    /// Number of values stored under `key`.
    pub fn occurrences(&self, key: K) -> usize {
        self.probe(key)
            .filter(|&idx| matches!(&self.slots[idx], Slot::Occupied(k, _) if *k == key))
            .count()
    }

    /// Vacates the first slot holding `key` and returns its value.
    ///
    /// Later occurrences shift down by one index; each must be removed
    /// individually.
    pub fn remove(&mut self, key: K) -> Option<V> {
        let idx = self.find_index(key, 0)?;
        let old = std::mem::replace(&mut self.slots[idx], Slot::Vacated);
        self.len -= 1;
        self.vacated += 1;
        match old {
            Slot::Occupied(_, v) => Some(v),
            Slot::Empty | Slot::Vacated => None,
        }
    }

    /// Iterates stored `(key, value)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> + '_ {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Occupied(k, v) => Some((*k, v)),
            Slot::Empty | Slot::Vacated => None,
        })
    }

    /// Slot indices along the probe sequence of `key`, stopping at the first
    /// never-used slot.
    fn probe(&self, key: K) -> impl Iterator<Item = usize> + '_ {
        let cap = self.capacity();
        let home = home_slot(key.to_raw(), cap);
        (0..cap)
            .map(move |attempt| (home + attempt) % cap)
            .take_while(|&idx| !matches!(self.slots[idx], Slot::Empty))
    }

    fn find_index(&self, key: K, occurrence: usize) -> Option<usize> {
        if key.to_raw() == 0 {
            return None;
        }
        self.probe(key)
            .filter(|&idx| matches!(&self.slots[idx], Slot::Occupied(k, _) if *k == key))
            .nth(occurrence)
    }

    fn probe_vacant(&self, key: K) -> Option<usize> {
        let cap = self.capacity();
        let home = home_slot(key.to_raw(), cap);
        (0..cap)
            .map(|attempt| (home + attempt) % cap)
            .find(|&idx| !matches!(self.slots[idx], Slot::Occupied(..)))
    }

    fn grow_for_insert(&mut self) {
        let cap = self.capacity();
        if cap > 0 && (self.len + self.vacated + 1) * 10 <= cap * MAX_LOAD_TENTHS {
            return;
        }
        // Mostly tombstones: purge at the current size instead of doubling.
        let wanted = if cap > 0 && self.vacated >= self.len {
            cap
        } else {
            next_prime((cap * 2).max(MIN_CAPACITY))
        };
        let target = match self.limit {
            Some(limit) if wanted > limit => {
                if cap == 0 {
                    limit
                } else if self.vacated > 0 {
                    cap
                } else {
                    // At the cap: keep filling past the load threshold.
                    return;
                }
            }
            _ => wanted,
        };
        self.rehash(target);
    }

    /// Moves every stored value into a fresh slot array of `new_cap` slots.
    ///
    /// The walk starts just past a never-used slot so each probe run is
    /// visited front to back; occurrences of one key therefore keep their
    /// relative order.
    fn rehash(&mut self, new_cap: usize) {
        let mut old = std::mem::take(&mut self.slots);
        if let Some(empty) = old.iter().position(|s| matches!(s, Slot::Empty)) {
            old.rotate_left(empty + 1);
        }
        self.slots = (0..new_cap).map(|_| Slot::Empty).collect();
        self.len = 0;
        self.vacated = 0;

        for slot in old {
            if let Slot::Occupied(k, v) = slot {
                if let Some(dst) = self.probe_vacant(k) {
                    self.slots[dst] = Slot::Occupied(k, v);
                    self.len += 1;
                }
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn home_slot(raw: u64, cap: usize) -> usize {
    if cap == 0 {
        return 0;
    }
    // The modulo result is below `cap`, so it always fits in usize.
    (raw % cap as u64) as usize
}

fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// Smallest prime `>= n`.
fn next_prime(n: usize) -> usize {
    let mut candidate = n.max(2);
    while !is_prime(candidate) {
        candidate += 1;
    }
    candidate
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn next_prime_matches_known_values() {
        assert_eq!(next_prime(0), 2);
        assert_eq!(next_prime(7), 7);
        assert_eq!(next_prime(14), 17);
        assert_eq!(next_prime(1024), 1031);
    }

    #[test]
    fn zero_key_is_rejected() {
        let mut t: OpenAddressingHashTable<u64, u8> = OpenAddressingHashTable::new();
        assert_eq!(t.insert(0, 1), Err(TableError::ReservedKey));
        assert!(t.is_empty());
        assert!(t.find(0).is_none());
    }

    #[test]
    fn growth_keeps_load_under_seventy_percent() {
        let mut t: OpenAddressingHashTable<u64, u64> = OpenAddressingHashTable::new();
        for k in 1..=100u64 {
            t.insert(k, k * 10).unwrap();
            assert!(t.len() * 10 <= t.capacity() * MAX_LOAD_TENTHS);
            assert!(is_prime(t.capacity()));
        }
        assert!((1..=100u64).all(|k| t.find(k) == Some(&(k * 10))));
    }

    #[test]
    fn occurrences_are_addressed_in_insert_order() {
        let mut t: OpenAddressingHashTable<u64, &str> = OpenAddressingHashTable::new();
        t.insert(5, "a").unwrap();
        t.insert(12, "x").unwrap(); // 12 % 7 == 5: collides with key 5
        t.insert(5, "b").unwrap();
        t.insert(5, "c").unwrap();
        assert_eq!(t.occurrences(5), 3);
        assert_eq!(t.find_nth(5, 0), Some(&"a"));
        assert_eq!(t.find_nth(5, 1), Some(&"b"));
        assert_eq!(t.find_nth(5, 2), Some(&"c"));
        assert_eq!(t.find_nth(5, 3), None);
        assert_eq!(t.find(12), Some(&"x"));
    }

    #[test]
    fn occurrence_order_survives_rehash() {
        let mut t: OpenAddressingHashTable<u64, u32> = OpenAddressingHashTable::new();
        for i in 0..64u32 {
            t.insert(3, i).unwrap();
            t.insert(u64::from(i) + 100, i).unwrap();
        }
        assert!(t.capacity() > MIN_CAPACITY);
        for i in 0..64u32 {
            assert_eq!(t.find_nth(3, i as usize), Some(&i));
        }
    }

    #[test]
    fn remove_vacates_only_first_occurrence() {
        let mut t: OpenAddressingHashTable<u64, u8> = OpenAddressingHashTable::new();
        t.insert(9, 1).unwrap();
        t.insert(9, 2).unwrap();
        assert_eq!(t.remove(9), Some(1));
        assert!(t.exists(9));
        assert_eq!(t.find(9), Some(&2));
        assert_eq!(t.remove(9), Some(2));
        assert!(!t.exists(9));
        assert_eq!(t.remove(9), None);
    }

    #[test]
    fn lookups_walk_past_tombstones() {
        let mut t: OpenAddressingHashTable<u64, u8> = OpenAddressingHashTable::with_capacity(7);
        t.insert(1, 1).unwrap();
        t.insert(8, 8).unwrap(); // same home slot as 1
        t.remove(1);
        assert_eq!(t.find(8), Some(&8));
    }

    #[test]
    fn upsert_replaces_first_occurrence() {
        let mut t: OpenAddressingHashTable<u64, u8> = OpenAddressingHashTable::new();
        assert_eq!(t.upsert(4, 1).unwrap(), None);
        assert_eq!(t.upsert(4, 2).unwrap(), Some(1));
        assert_eq!(t.len(), 1);
        assert_eq!(t.find(4), Some(&2));
    }

    #[test]
    fn limit_surfaces_exhaustion() {
        let mut t: OpenAddressingHashTable<u64, u8> = OpenAddressingHashTable::new().with_limit(7);
        for k in 1..=7u64 {
            t.insert(k, 0).unwrap();
        }
        assert_eq!(t.capacity(), 7);
        assert_eq!(
            t.insert(99, 0).err(),
            Some(TableError::CapacityExhausted { capacity: 7 })
        );
        // Freeing a slot makes room again.
        t.remove(3);
        assert!(t.insert(99, 0).is_ok());
    }

    #[test]
    fn iter_skips_vacant_slots() {
        let mut t: OpenAddressingHashTable<u64, u8> = OpenAddressingHashTable::new();
        t.insert(1, 1).unwrap();
        t.insert(2, 2).unwrap();
        t.insert(3, 3).unwrap();
        t.remove(2);
        let mut keys: Vec<u64> = t.iter().map(|(k, _)| k).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec![1, 3]);
    }
}
