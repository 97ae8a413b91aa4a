// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::geom::Aabb;
use crate::math::Vec3;
use crate::table::TableKey;

/// Edge length of a spatial cell in world units.
pub const CELL_SIZE: f32 = 4.0;

const COORD_BITS: u32 = 21;
const COORD_OFFSET: i64 = 1_048_575;
const COORD_WRAP: i64 = 1 << COORD_BITS;
const NON_ZERO_BIT: u64 = 1 << 63;

/// Packed cell coordinates.
///
/// Layout: x in bits 42..62, y in bits 21..41, z in bits 0..20, each stored
/// as `(cell + 1_048_575) mod 2_097_152`; bit 63 is always set so the key is
/// never the reserved raw value `0`. Cells more than 2^21 apart along an axis
/// alias onto the same key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpatialCellKey(u64);

impl SpatialCellKey {
    /// Packs integer cell coordinates.
    pub fn from_cell(x: i32, y: i32, z: i32) -> Self {
        Self(NON_ZERO_BIT | (wrap(x) << (2 * COORD_BITS)) | (wrap(y) << COORD_BITS) | wrap(z))
    }

    /// Key of the cell containing `position` (`floor(position / CELL_SIZE)`
    /// per axis).
    pub fn from_position(position: Vec3) -> Self {
        Self::from_cell(
            cell_coord(position.x()),
            cell_coord(position.y()),
            cell_coord(position.z()),
        )
    }

    /// Raw packed value (always non-zero).
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl core::fmt::Debug for SpatialCellKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "SpatialCellKey({:#018x})", self.0)
    }
}

impl TableKey for SpatialCellKey {
    fn to_raw(self) -> u64 {
        self.0
    }
}

#[allow(clippy::cast_sign_loss)]
fn wrap(cell: i32) -> u64 {
    // rem_euclid keeps the result in 0..COORD_WRAP.
    (i64::from(cell) + COORD_OFFSET).rem_euclid(COORD_WRAP) as u64
}

/// Integer cell coordinate of a world-space scalar. NaN maps to cell 0 and
/// out-of-range values saturate.
#[allow(clippy::cast_possible_truncation)]
pub fn cell_coord(value: f32) -> i32 {
    (value / CELL_SIZE).floor() as i32
}

/// Every cell key whose cube intersects `bounds`, walking integer cells from
/// `floor(min / CELL_SIZE)` to `floor(max / CELL_SIZE)` on each axis
/// (x outermost, z innermost).
pub fn cells_overlapping(bounds: &Aabb) -> impl Iterator<Item = SpatialCellKey> {
    let (min, max) = (bounds.min(), bounds.max());
    let xs = cell_coord(min.x())..=cell_coord(max.x());
    let ys = cell_coord(min.y())..=cell_coord(max.y());
    let zs = cell_coord(min.z())..=cell_coord(max.z());
    xs.flat_map(move |x| {
        let zs = zs.clone();
        ys.clone()
            .flat_map(move |y| zs.clone().map(move |z| SpatialCellKey::from_cell(x, y, z)))
    })
}

/// Number of cells [`cells_overlapping`] would visit for `bounds`.
///
/// `None` when a corner is not finite, when an axis spans more than 2^21
/// cells (keys would alias and repeat), or when the product overflows.
pub fn cell_span(bounds: &Aabb) -> Option<usize> {
    let (min, max) = (bounds.min(), bounds.max());
    if !min.is_finite() || !max.is_finite() {
        return None;
    }
    let axis = |lo: f32, hi: f32| {
        let cells = i64::from(cell_coord(hi)) - i64::from(cell_coord(lo)) + 1;
        if cells > COORD_WRAP {
            return None;
        }
        usize::try_from(cells).ok()
    };
    axis(min.x(), max.x())?
        .checked_mul(axis(min.y(), max.y())?)?
        .checked_mul(axis(min.z(), max.z())?)
}
