//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::barrel::Barrel;
use crate::registry::{DrinkTypeDef, GENERIC_TAG, Ingredients, Registry, RegistryBuilder};
use crate::slot::{DrinkEntry, MixtureEntry, SlotContent};
use crate::structure::{BarrelStructure, BlockPos};

// ===========================================================================
// Drink type ids
// ===========================================================================

pub const ALE: &str = "brewery:ale";
pub const CIDER: &str = "brewery:cider";
pub const MEAD: &str = "brewery:mead";
pub const WATER: &str = "brewery:water";

// ===========================================================================
// Recipes
// ===========================================================================

pub fn grain_bill() -> Ingredients {
    Ingredients::new().with("minecraft:wheat", 3)
}

/// Shared by cider and mead, so both are candidates for it.
pub fn orchard_blend() -> Ingredients {
    Ingredients::new()
        .with("minecraft:apple", 2)
        .with("minecraft:honey_bottle", 1)
}

fn with_recipe(mut def: DrinkTypeDef, recipe: &Ingredients) -> DrinkTypeDef {
    def.recipe = recipe.clone();
    def
}

// ===========================================================================
// Registry
// ===========================================================================

/// Registry used across tests:
///
/// - ale: base `age / 2`; oak (200, `quality + 1`), spruce (0, `quality - age`),
///   generic (0, `quality`).
/// - cider: base `4`, cooking `age / 2`; oak only (100, `quality`).
/// - mead: base `6`; generic only (50, `quality`).
/// - water: no barrel profiles.
pub fn brewery_registry() -> Registry {
    let mut b = RegistryBuilder::new();
    b.register_drink(with_recipe(
        DrinkTypeDef::new(ALE, "age / 2")
            .barrel("oak", 200.0, "quality + 1")
            .barrel("spruce", 0.0, "quality - age")
            .barrel(GENERIC_TAG, 0.0, "quality"),
        &grain_bill(),
    ));
    b.register_drink(with_recipe(
        DrinkTypeDef::new(CIDER, "4")
            .cooking_quality_mult("age / 2")
            .barrel("oak", 100.0, "quality"),
        &orchard_blend(),
    ));
    b.register_drink(with_recipe(
        DrinkTypeDef::new(MEAD, "6").barrel(GENERIC_TAG, 50.0, "quality"),
        &orchard_blend(),
    ));
    b.register_drink(DrinkTypeDef::new(WATER, "0").ingredient("minecraft:water_bucket", 1));
    match b.build() {
        Ok(reg) => reg,
        Err(e) => panic!("test registry failed to build: {e}"),
    }
}

// ===========================================================================
// Barrels
// ===========================================================================

/// An empty barrel of `tag` made of a 2x2x2 block cube at the origin.
pub fn barrel(tag: &str) -> Barrel {
    let parts = (0..8).map(|i| BlockPos::new(i & 1, (i >> 1) & 1, (i >> 2) & 1));
    Barrel::new(BarrelStructure::from_parts(parts, tag, -1))
}

/// A barrel of `tag` with `contents` placed from slot 0 upwards.
pub fn barrel_with(tag: &str, contents: impl IntoIterator<Item = SlotContent>) -> Barrel {
    let mut b = barrel(tag);
    for (index, content) in contents.into_iter().enumerate() {
        if let Err(e) = b.slots_mut().try_insert(index, content) {
            panic!("barrel_with: {e}");
        }
    }
    b
}

pub fn unaged(id: &str) -> SlotContent {
    DrinkEntry::new(id).into()
}

pub fn mixture(ingredients: Ingredients, age: f64) -> SlotContent {
    MixtureEntry::new(ingredients).with_age(age).into()
}
