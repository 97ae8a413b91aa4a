// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]
use echo_signal::{BloomFilter, Handle};

#[test]
fn no_false_negatives_after_five_hundred_inserts() {
    let mut bloom: BloomFilter<u64, 1024, 4> = BloomFilter::new();
    for v in 1..=500u64 {
        bloom.insert(&v);
    }
    let misses = (1..=500u64).filter(|v| !bloom.might_exist(v)).count();
    assert_eq!(misses, 0);
}

#[test]
fn larger_filters_report_fewer_false_positives() {
    let mut small: BloomFilter<u64, 64, 4> = BloomFilter::new();
    let mut large: BloomFilter<u64, 8096, 4> = BloomFilter::new();
    for v in 0..500u64 {
        small.insert(&v);
        large.insert(&v);
    }
    let probes = 1_000_000..1_000_500u64;
    let small_fp = probes.clone().filter(|v| small.might_exist(v)).count();
    let large_fp = probes.filter(|v| large.might_exist(v)).count();
    assert!(large_fp < small_fp, "large={large_fp} small={small_fp}");
    assert!(large_fp <= 5, "8096-byte filter saturated: {large_fp} false positives");
}

#[test]
fn a_single_insert_sets_at_most_hash_count_bits() {
    type RegistryBloom = BloomFilter<Handle, 1024, 4>;
    let mut bloom = RegistryBloom::new();
    let handle = Handle::new(1).unwrap();
    bloom.insert(&handle);
    assert!(bloom.might_exist(&handle));
    let set = bloom.set_bits();
    assert!((1..=RegistryBloom::HASH_COUNT as usize).contains(&set));
    assert_eq!(bloom.bit_count(), RegistryBloom::BYTE_COUNT * 8);
}
