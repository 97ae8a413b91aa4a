// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier and hashing utilities.
use std::fmt;
use std::num::NonZeroU64;

use blake3::Hasher;

/// Opaque identifier of a signal receiver.
///
/// Raw value `0` is reserved as "empty" by every table and bucket in this
/// crate, so a `Handle` can never hold it. Handles carry no generation: the
/// registry is the only authority on whether a handle is live, and stale
/// handles simply fail to resolve.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(NonZeroU64);

impl Handle {
    /// Wraps a raw handle value; returns `None` for the reserved value `0`.
    #[must_use]
    pub const fn new(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Returns the raw (non-zero) handle value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.0)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 64-bit identifier of a signal type, derived from its hierarchical path.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct SignalTypeId(pub u64);

/// Produces a stable, domain‑separated signal type identifier (prefix
/// `b"signal:"`) using BLAKE3, truncated to the first 8 bytes (LE).
///
/// Receivers compare `SignalContext::type_id` against ids computed once from
/// the same path, e.g. `make_signal_type_id("interact/door/open")`.
pub fn make_signal_type_id(path: &str) -> SignalTypeId {
    let mut hasher = Hasher::new();
    hasher.update(b"signal:");
    hasher.update(path.as_bytes());
    let digest = hasher.finalize();
    let mut short = [0u8; 8];
    short.copy_from_slice(&digest.as_bytes()[0..8]);
    SignalTypeId(u64::from_le_bytes(short))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_handle_is_rejected() {
        assert!(Handle::new(0).is_none());
        assert_eq!(Handle::new(7).map(Handle::raw), Some(7));
    }

    #[test]
    fn signal_type_ids_are_stable_and_distinct() {
        let a = make_signal_type_id("damage/fire");
        let b = make_signal_type_id("damage/fire");
        let c = make_signal_type_id("damage/ice");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
