// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Quantized spatial index used to address spatial signals.
//!
//! World space is cut into cubes of [`CELL_SIZE`] units. Each occupied cell
//! owns one or more fixed-capacity [`Bucket`]s of handles stored as
//! occurrences of the cell key in an [`OpenAddressingHashTable`](crate::table::OpenAddressingHashTable).
//! Placement is explicit: the index never reads object positions itself.

mod bucket;
mod cell_key;
mod index;

pub use bucket::Bucket;
pub use cell_key::{cell_coord, cell_span, cells_overlapping, SpatialCellKey, CELL_SIZE};
pub use index::{SpatialBloom, SpatialIndex};
