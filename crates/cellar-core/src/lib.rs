//! Cellar Core -- the barrel-aging engine for brewing.
//!
//! A barrel is a fixed block of 27 slots holding finished drinks, unfinished
//! ingredient mixtures, and unrelated items. Time passing in a barrel ages
//! drinks along formula-driven quality curves and eventually turns mixtures
//! into finished drinks.
//!
//! # Update Cycle
//!
//! Each call to [`barrel::Barrel::update`] with the current world time:
//!
//! 1. **First call** -- Records the time marker and does nothing else.
//! 2. **Elapsed** -- Derives elapsed ticks from the marker and the
//!    [`barrel::AgingRules`].
//! 3. **Aging** -- Runs [`aging::tick_contents`] over every slot using the
//!    barrel's current tag.
//! 4. **Bookkeeping** -- Stores the new marker and marks the barrel dirty.
//!
//! # Key Types
//!
//! - [`formula::Formula`] -- Arithmetic expressions over `age` and `quality`.
//! - [`registry::Registry`] -- Immutable drink type registry (frozen at
//!   startup).
//! - [`mixture`] -- Candidate search and selection for ingredient blends.
//! - [`slot::SlotStore`] -- The 27 slots of one barrel.
//! - [`structure::BarrelStructure`] -- Block parts, tag and time marker.
//! - [`cellar::Cellar`] -- Owns many barrels and updates them together.
//! - [`serialize`] -- Persisted record format, JSON and bitcode snapshots.

pub mod aging;
pub mod barrel;
pub mod cellar;
pub mod formula;
pub mod id;
pub mod mixture;
pub mod registry;
pub mod serialize;
pub mod slot;
pub mod structure;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

/// World ticks per second. Formulas see ages in seconds; slots store ticks.
pub const TICKS_PER_SECOND: f64 = 20.0;
