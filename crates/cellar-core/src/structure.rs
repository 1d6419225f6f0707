//! Barrel structure: which blocks form one barrel, its tag and its clock.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Tag of a freshly created barrel before the host configures it.
pub const DEFAULT_BARREL_TYPE: &str = "void";

/// `last_ticked` value meaning "never ticked".
pub const NEVER_TICKED: i64 = -1;

// ---------------------------------------------------------------------------
// Block positions
// ---------------------------------------------------------------------------

const BITS_X: u32 = 26;
const BITS_Y: u32 = 12;
const BITS_Z: u32 = 26;
const SHIFT_Z: u32 = BITS_Y;
const SHIFT_X: u32 = BITS_Y + BITS_Z;

const fn mask(bits: u32) -> i64 {
    (1i64 << bits) - 1
}

/// A block coordinate. Packs into an `i64` as x:26 | z:26 | y:12 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Whether the position survives a round trip through [`as_long`](Self::as_long).
    pub fn is_packable(&self) -> bool {
        let fits = |v: i32, bits: u32| {
            let half = 1i64 << (bits - 1);
            (-half..half).contains(&(v as i64))
        };
        fits(self.x, BITS_X) && fits(self.y, BITS_Y) && fits(self.z, BITS_Z)
    }

    pub fn as_long(&self) -> i64 {
        ((self.x as i64 & mask(BITS_X)) << SHIFT_X)
            | ((self.z as i64 & mask(BITS_Z)) << SHIFT_Z)
            | (self.y as i64 & mask(BITS_Y))
    }

    /// Inverse of [`as_long`](Self::as_long). Every `i64` decodes.
    pub fn from_long(packed: i64) -> Self {
        Self {
            x: (packed >> SHIFT_X) as i32,
            y: ((packed << (64 - BITS_Y)) >> (64 - BITS_Y)) as i32,
            z: ((packed << (64 - SHIFT_X)) >> (64 - BITS_Z)) as i32,
        }
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructureError {
    #[error("block position {0} is outside the packable range")]
    OutOfRange(BlockPos),
}

// ---------------------------------------------------------------------------
// Barrel structure
// ---------------------------------------------------------------------------

/// The blocks making up one barrel, the tag selecting its aging profiles and
/// the time it was last ticked.
///
/// The dirty flag tells the host the structure needs saving. It is not part
/// of the persisted state and is ignored by equality.
#[derive(Debug, Clone)]
pub struct BarrelStructure {
    parts: BTreeSet<BlockPos>,
    barrel_type: String,
    last_ticked: i64,
    dirty: bool,
}

impl Default for BarrelStructure {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for BarrelStructure {
    fn eq(&self, other: &Self) -> bool {
        self.parts == other.parts
            && self.barrel_type == other.barrel_type
            && self.last_ticked == other.last_ticked
    }
}

impl BarrelStructure {
    pub fn new() -> Self {
        Self {
            parts: BTreeSet::new(),
            barrel_type: DEFAULT_BARREL_TYPE.to_string(),
            last_ticked: NEVER_TICKED,
            dirty: false,
        }
    }

    /// Restore a structure from persisted fields. The result is clean.
    pub fn from_parts(
        parts: impl IntoIterator<Item = BlockPos>,
        barrel_type: impl Into<String>,
        last_ticked: i64,
    ) -> Self {
        Self {
            parts: parts.into_iter().collect(),
            barrel_type: barrel_type.into(),
            last_ticked,
            dirty: false,
        }
    }

    /// Register a block as part of this barrel. Returns `false` if it already
    /// was one.
    pub fn add_part(&mut self, pos: BlockPos) -> Result<bool, StructureError> {
        if !pos.is_packable() {
            return Err(StructureError::OutOfRange(pos));
        }
        let added = self.parts.insert(pos);
        if added {
            self.dirty = true;
        }
        Ok(added)
    }

    pub fn contains_part(&self, pos: &BlockPos) -> bool {
        self.parts.contains(pos)
    }

    /// Parts in ascending (x, y, z) order.
    pub fn parts(&self) -> impl Iterator<Item = BlockPos> + '_ {
        self.parts.iter().copied()
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn barrel_type(&self) -> &str {
        &self.barrel_type
    }

    /// Change the tag. Takes effect on the next tick.
    pub fn set_barrel_type(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if tag != self.barrel_type {
            self.barrel_type = tag;
            self.dirty = true;
        }
    }

    pub fn last_ticked(&self) -> i64 {
        self.last_ticked
    }

    pub fn set_last_ticked(&mut self, time: i64) {
        self.last_ticked = time;
        self.dirty = true;
    }

    /// Whether the barrel has recorded a first time marker.
    pub fn has_ticked(&self) -> bool {
        self.last_ticked != NEVER_TICKED
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Translation key of the container name, e.g.
    /// `container.brewery.oak_barrel`.
    pub fn display_key(&self) -> String {
        format!("container.brewery.{}_barrel", self.barrel_type)
    }
}
