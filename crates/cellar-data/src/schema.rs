//! Serde data file structs for drink definitions.
//!
//! These structs define the on-disk format for drink types and aging rules.
//! They are deserialized from RON, JSON, or TOML data files and then turned
//! into registry definitions by the loader.

use cellar_core::registry::DrinkTypeDef;
use serde::Deserialize;

// ===========================================================================
// Drinks
// ===========================================================================

/// An ingredient entry, supporting both short tuple form and full form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IngredientData {
    /// Short form: `("minecraft:wheat", 3)`.
    Short(String, u32),
    /// Full form: `{ item = "minecraft:wheat", count = 3 }`.
    Full {
        item: String,
        #[serde(default = "default_count")]
        count: u32,
    },
}

fn default_count() -> u32 {
    1
}

impl IngredientData {
    pub fn item(&self) -> &str {
        match self {
            IngredientData::Short(item, _) | IngredientData::Full { item, .. } => item,
        }
    }

    pub fn count(&self) -> u32 {
        match self {
            IngredientData::Short(_, count) | IngredientData::Full { count, .. } => *count,
        }
    }
}

/// How a drink ages in barrels of one tag. Tag `"*"` is the fallback.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BarrelData {
    pub tag: String,
    pub base_time: f64,
    pub quality_change: String,
}

/// A drink type definition in a data file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DrinkData {
    pub id: String,
    pub base_quality: String,
    #[serde(default = "default_cooking_quality_mult")]
    pub cooking_quality_mult: String,
    #[serde(default)]
    pub ingredients: Vec<IngredientData>,
    #[serde(default)]
    pub barrels: Vec<BarrelData>,
}

fn default_cooking_quality_mult() -> String {
    "1".to_string()
}

impl DrinkData {
    /// Convert to a registry definition. Formulas stay unparsed.
    pub fn to_def(&self) -> DrinkTypeDef {
        let mut def = DrinkTypeDef::new(self.id.as_str(), self.base_quality.as_str())
            .cooking_quality_mult(self.cooking_quality_mult.as_str());
        for ingredient in &self.ingredients {
            def = def.ingredient(ingredient.item(), ingredient.count());
        }
        for barrel in &self.barrels {
            def = def.barrel(
                barrel.tag.as_str(),
                barrel.base_time,
                barrel.quality_change.as_str(),
            );
        }
        def
    }
}
