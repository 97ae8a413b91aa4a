// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! echo-signal: per-tick signal dispatch for Echo scenes.
//!
//! Simulation code broadcasts lightweight signals during a tick; the owning
//! scene drains them once per fixed step through [`SignalDispatcher::dispatch`].
//! Three addressing modes are supported:
//!
//! - **global**: every registered receiver,
//! - **spatial**: receivers placed in the 4-unit cells touched by a sphere,
//! - **targeted**: exactly one [`Handle`].
//!
//! The building blocks ([`BloomFilter`], [`OpenAddressingHashTable`],
//! [`SpatialIndex`]) are public so scenes can reuse them for their own
//! lookups.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

/// Float32 math primitives (Vec3, Quat).
pub mod math;

/// Probabilistic membership filter.
pub mod bloom;
mod config;
/// Bounding volumes and transforms carried by signals.
pub mod geom;
mod ident;
/// Fixed-slot hash table with multi-value occurrences.
pub mod table;
/// Quantized cell index used for spatial broadcasts.
pub mod spatial;
/// Broadcast queues, receiver registry, and the dispatch pipeline.
pub mod signal;

/// Membership pre-filter.
pub use bloom::BloomFilter;
/// Dispatcher configuration.
pub use config::{ConfigError, DispatcherConfig};
/// Geometry carried by signal payloads.
pub use geom::{Aabb, BoundSphere, Transform};
/// Object handles and signal type identifiers.
pub use ident::{make_signal_type_id, Handle, SignalTypeId};
/// Math primitives.
pub use math::{Quat, Vec3};
/// Signal bus surface.
pub use signal::{
    BroadcastBatch, DeliveryError, DeliveryResult, DispatchReport, PendingCounts, SignalContext,
    SignalDesc, SignalDispatcher, SignalError, SignalReceiver,
};
/// Spatial index surface.
pub use spatial::{Bucket, SpatialCellKey, SpatialIndex, CELL_SIZE};
/// Hash table surface.
pub use table::{OpenAddressingHashTable, TableError, TableKey};
