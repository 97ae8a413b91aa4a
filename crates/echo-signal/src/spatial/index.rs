// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use tracing::trace;

use super::bucket::Bucket;
use super::cell_key::SpatialCellKey;
use crate::bloom::BloomFilter;
use crate::config::DispatcherConfig;
use crate::ident::Handle;
use crate::table::{OpenAddressingHashTable, TableError};

/// Pre-filter over occupied cell keys (8096 bytes, 4 hashes).
pub type SpatialBloom = BloomFilter<SpatialCellKey, 8096, 4>;

/// Cell key → chain of handle buckets.
///
/// A cell's buckets are the occurrences `0..bucket_count(key)` of its key in
/// the bucket table. Counts only grow until [`SpatialIndex::reset`]: removal
/// zeroes a slot but never releases a bucket.
#[derive(Debug)]
pub struct SpatialIndex {
    bloom: SpatialBloom,
    counts: OpenAddressingHashTable<SpatialCellKey, usize>,
    buckets: OpenAddressingHashTable<SpatialCellKey, Bucket>,
    bucket_capacity: usize,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::from_config(&DispatcherConfig::default())
    }
}

impl SpatialIndex {
    /// Creates an empty index whose buckets hold `bucket_capacity` handles.
    ///
    /// # Panics
    /// If `bucket_capacity` is zero.
    pub fn new(bucket_capacity: usize) -> Self {
        assert!(bucket_capacity > 0, "bucket capacity must be non-zero");
        Self {
            bloom: SpatialBloom::new(),
            counts: OpenAddressingHashTable::new(),
            buckets: OpenAddressingHashTable::new(),
            bucket_capacity,
        }
    }

    /// Creates an index sized and limited by `config`.
    pub fn from_config(config: &DispatcherConfig) -> Self {
        let mut index = Self::new(config.bucket_capacity.max(1));
        if let Some(limit) = config.table_limit {
            index.counts = index.counts.with_limit(limit);
            index.buckets = index.buckets.with_limit(limit);
        }
        index.counts.reserve(config.table_reserve);
        index.buckets.reserve(config.table_reserve);
        index
    }

    /// Handles per bucket.
    pub fn bucket_capacity(&self) -> usize {
        self.bucket_capacity
    }

    /// Number of cells that have ever been occupied since the last reset.
    pub fn cell_count(&self) -> usize {
        self.counts.len()
    }

    /// Places `handle` in the first free slot of cell `key`, appending a new
    /// bucket when every existing one is full.
    ///
    /// Adding the same handle twice stores it twice.
    ///
    /// # Errors
    /// [`TableError::CapacityExhausted`] when a limited table cannot take a
    /// new bucket.
    pub fn add(&mut self, handle: Handle, key: SpatialCellKey) -> Result<(), TableError> {
        let known = if self.bloom.might_exist(&key) {
            self.counts.find(key).copied()
        } else {
            None
        };
        let Some(count) = known else {
            // A failed bucket insert must leave neither count nor bucket.
            self.counts.upsert(key, 1)?;
            let bucket = self.filled_bucket(handle);
            if let Err(err) = self.buckets.insert(key, bucket) {
                self.counts.remove(key);
                return Err(err);
            }
            self.bloom.insert(&key);
            trace!(?key, %handle, "spatial cell opened");
            return Ok(());
        };
        for occurrence in 0..count {
            if let Some(bucket) = self.buckets.find_nth_mut(key, occurrence) {
                if bucket.try_insert(handle) {
                    return Ok(());
                }
            }
        }
        let bucket = self.filled_bucket(handle);
        self.buckets.insert(key, bucket)?;
        if let Some(count) = self.counts.find_mut(key) {
            *count += 1;
        }
        Ok(())
    }

    /// Clears the first slot holding `handle` in cell `key`.
    ///
    /// Returns `false` when the cell is unknown or does not hold the handle.
    pub fn remove(&mut self, handle: Handle, key: SpatialCellKey) -> bool {
        let count = self.bucket_count(key);
        (0..count).any(|occurrence| {
            self.buckets
                .find_nth_mut(key, occurrence)
                .is_some_and(|bucket| bucket.remove_entry(handle))
        })
    }

    /// Number of buckets owned by cell `key` (`0` when unknown).
    pub fn bucket_count(&self, key: SpatialCellKey) -> usize {
        if !self.bloom.might_exist(&key) {
            return 0;
        }
        self.counts.find(key).copied().unwrap_or(0)
    }

    /// The `index`-th bucket of cell `key`.
    pub fn bucket(&self, key: SpatialCellKey, index: usize) -> Option<&Bucket> {
        if index >= self.bucket_count(key) {
            return None;
        }
        self.buckets.find_nth(key, index)
    }

    /// Every handle placed in cell `key`, bucket by bucket, slot order.
    pub fn occupants(&self, key: SpatialCellKey) -> impl Iterator<Item = Handle> + '_ {
        (0..self.bucket_count(key))
            .filter_map(move |i| self.buckets.find_nth(key, i))
            .flat_map(Bucket::handles)
    }

    /// `true` if `handle` is placed in cell `key`.
    pub fn contains(&self, handle: Handle, key: SpatialCellKey) -> bool {
        self.occupants(key).any(|h| h == handle)
    }

    /// Forgets every cell.
    pub fn reset(&mut self) {
        self.bloom.reset();
        self.counts.clear();
        self.buckets.clear();
    }

    fn filled_bucket(&self, handle: Handle) -> Bucket {
        let mut bucket = Bucket::new(self.bucket_capacity);
        bucket.try_insert(handle);
        bucket
    }
}
