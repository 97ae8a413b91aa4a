// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fixed-size Bloom filter used as a fast-reject pre-check in front of the
//! hash tables.
//!
//! There is no removal primitive. Owners that delete elements mark their
//! filter stale and rebuild it with [`BloomFilter::reset`] followed by
//! re-insertion of every surviving element.

use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

use rustc_hash::FxHasher;

/// Bloom filter over `BYTES * 8` bits probed by `HASHES` keyed hashes.
///
/// `might_exist` never returns `false` for a value inserted since the last
/// reset; it may return `true` for values that were never inserted.
pub struct BloomFilter<T: ?Sized, const BYTES: usize, const HASHES: u32> {
    bytes: Box<[u8]>,
    _marker: PhantomData<fn(&T)>,
}

impl<T: Hash + ?Sized, const BYTES: usize, const HASHES: u32> BloomFilter<T, BYTES, HASHES> {
    /// Size of the bit array in bytes.
    pub const BYTE_COUNT: usize = BYTES;
    /// Number of keyed hashes probed per value.
    pub const HASH_COUNT: u32 = HASHES;

    /// Creates an empty filter.
    pub fn new() -> Self {
        assert!(BYTES > 0, "bloom filter needs at least one byte");
        Self {
            bytes: vec![0u8; BYTES].into_boxed_slice(),
            _marker: PhantomData,
        }
    }

    /// Total number of bits.
    pub const fn bit_count(&self) -> usize {
        BYTES * 8
    }

    /// Clears every bit.
    pub fn reset(&mut self) {
        self.bytes.fill(0);
    }

    /// Records `value` in the filter.
    pub fn insert(&mut self, value: &T) {
        for seed in 0..HASHES {
            let pos = Self::bit_position(value, seed);
            self.bytes[pos / 8] |= 1 << (pos % 8);
        }
    }

    /// Returns `false` only if `value` was never inserted since the last reset.
    pub fn might_exist(&self, value: &T) -> bool {
        (0..HASHES).all(|seed| {
            let pos = Self::bit_position(value, seed);
            self.bytes[pos / 8] & (1 << (pos % 8)) != 0
        })
    }

    /// Number of set bits; saturation indicator for owners that size filters.
    pub fn set_bits(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn bit_position(value: &T, seed: u32) -> usize {
        // Truncation is fine: the result is reduced modulo the bit count.
        (keyed_hash(value, seed) % (BYTES as u64 * 8)) as usize
    }
}

impl<T: Hash + ?Sized, const BYTES: usize, const HASHES: u32> Default
    for BloomFilter<T, BYTES, HASHES>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized, const BYTES: usize, const HASHES: u32> core::fmt::Debug
    for BloomFilter<T, BYTES, HASHES>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BloomFilter")
            .field("bytes", &BYTES)
            .field("hashes", &HASHES)
            .finish_non_exhaustive()
    }
}

/// `FxHasher` seeded with `seed`, followed by the murmur3 64-bit finalizer so
/// the low bits used for the modulo depend on every input bit.
fn keyed_hash<T: Hash + ?Sized>(value: &T, seed: u32) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write_u32(seed);
    value.hash(&mut hasher);
    let mut h = hasher.finish();
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^= h >> 33;
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_values_are_reported() {
        let mut bloom: BloomFilter<u64, 64, 4> = BloomFilter::new();
        for v in 1..=40u64 {
            bloom.insert(&v);
        }
        assert!((1..=40u64).all(|v| bloom.might_exist(&v)));
    }

    #[test]
    fn reset_forgets_everything() {
        let mut bloom: BloomFilter<u64, 128, 3> = BloomFilter::new();
        bloom.insert(&99);
        assert!(bloom.might_exist(&99));
        bloom.reset();
        assert_eq!(bloom.set_bits(), 0);
        assert!(!bloom.might_exist(&99));
    }

    #[test]
    fn seeds_produce_distinct_positions() {
        let positions: Vec<usize> = (0..4)
            .map(|seed| BloomFilter::<u64, 1024, 4>::bit_position(&12345, seed))
            .collect();
        let mut dedup = positions.clone();
        dedup.sort_unstable();
        dedup.dedup();
        assert!(dedup.len() > 1, "keyed hashes collapsed: {positions:?}");
    }
}
