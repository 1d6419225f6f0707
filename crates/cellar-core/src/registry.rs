use crate::formula::{Formula, FormulaError};
use crate::id::{DrinkTypeId, IngredientId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Barrel tag of the fallback profile, used when a drink type has no profile
/// for the barrel's own tag.
pub const GENERIC_TAG: &str = "*";

// ---------------------------------------------------------------------------
// Ingredients
// ---------------------------------------------------------------------------

/// A multiset of ingredient identifiers. Zero counts are never stored, so two
/// multisets are equal exactly when every ingredient has the same count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ingredients {
    counts: BTreeMap<IngredientId, u32>,
}

impl Ingredients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` of `id`.
    pub fn add(&mut self, id: IngredientId, count: u32) {
        if count == 0 {
            return;
        }
        *self.counts.entry(id).or_insert(0) += count;
    }

    /// Builder-style [`add`](Self::add).
    pub fn with(mut self, id: impl Into<String>, count: u32) -> Self {
        self.add(IngredientId::new(id), count);
        self
    }

    pub fn count(&self, id: &IngredientId) -> u32 {
        self.counts.get(id).copied().unwrap_or(0)
    }

    /// Total number of ingredient items.
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Distinct ingredients with their counts, in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (&IngredientId, u32)> {
        self.counts.iter().map(|(id, n)| (id, *n))
    }
}

impl FromIterator<(IngredientId, u32)> for Ingredients {
    fn from_iter<I: IntoIterator<Item = (IngredientId, u32)>>(iter: I) -> Self {
        let mut out = Ingredients::new();
        for (id, count) in iter {
            out.add(id, count);
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Definitions (registration input)
// ---------------------------------------------------------------------------

/// An unparsed barrel profile as registered.
#[derive(Debug, Clone, PartialEq)]
pub struct BarrelDef {
    pub tag: String,
    pub base_time: f64,
    pub quality_change: String,
}

/// A drink type as registered. Formulas stay as text until
/// [`RegistryBuilder::build`] parses them.
#[derive(Debug, Clone, PartialEq)]
pub struct DrinkTypeDef {
    pub id: DrinkTypeId,
    pub base_quality: String,
    pub cooking_quality_mult: String,
    pub recipe: Ingredients,
    pub barrels: Vec<BarrelDef>,
}

impl DrinkTypeDef {
    pub fn new(id: impl Into<String>, base_quality: impl Into<String>) -> Self {
        Self {
            id: DrinkTypeId::new(id),
            base_quality: base_quality.into(),
            cooking_quality_mult: "1".to_string(),
            recipe: Ingredients::new(),
            barrels: Vec::new(),
        }
    }

    pub fn cooking_quality_mult(mut self, formula: impl Into<String>) -> Self {
        self.cooking_quality_mult = formula.into();
        self
    }

    pub fn ingredient(mut self, id: impl Into<String>, count: u32) -> Self {
        self.recipe.add(IngredientId::new(id), count);
        self
    }

    pub fn barrel(
        mut self,
        tag: impl Into<String>,
        base_time: f64,
        quality_change: impl Into<String>,
    ) -> Self {
        self.barrels.push(BarrelDef {
            tag: tag.into(),
            base_time,
            quality_change: quality_change.into(),
        });
        self
    }
}

// ---------------------------------------------------------------------------
// Frozen types
// ---------------------------------------------------------------------------

/// How one drink type ages in barrels with a given tag.
#[derive(Debug, Clone, PartialEq)]
pub struct BarrelProfile {
    pub tag: String,
    /// Delay before barrel interaction begins. A drink that never aged starts
    /// at `-base_time` ticks. For a mixture, the minimum age in seconds before
    /// it can become this drink.
    pub base_time: f64,
    /// Evaluated with `quality` (base quality) and `age` (seconds) bound.
    pub quality_change: Formula,
}

impl BarrelProfile {
    pub fn is_generic(&self) -> bool {
        self.tag == GENERIC_TAG
    }
}

/// A finished drink type with its parsed formulas.
#[derive(Debug, Clone, PartialEq)]
pub struct DrinkType {
    pub id: DrinkTypeId,
    /// Evaluated with `age` (seconds) bound.
    pub base_quality: Formula,
    /// Evaluated with `age` bound to the cooking time in seconds.
    pub cooking_quality_mult: Formula,
    pub recipe: Ingredients,
    pub barrels: BTreeMap<String, BarrelProfile>,
}

impl DrinkType {
    /// Profile for `tag`: exact match first, then the generic profile.
    pub fn barrel_profile(&self, tag: &str) -> Option<&BarrelProfile> {
        self.barrels
            .get(tag)
            .or_else(|| self.barrels.get(GENERIC_TAG))
    }

    pub fn has_barrel_profiles(&self) -> bool {
        !self.barrels.is_empty()
    }

    pub fn base_quality_at(&self, age_seconds: f64) -> Result<f64, FormulaError> {
        self.base_quality.evaluate_age(age_seconds)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for constructing an immutable [`Registry`].
/// Three-phase lifecycle: registration -> mutation -> finalization.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    drinks: Vec<DrinkTypeDef>,
    id_to_index: HashMap<DrinkTypeId, usize>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase 1: Register a drink type. Returns its ID.
    pub fn register_drink(&mut self, def: DrinkTypeDef) -> DrinkTypeId {
        let id = def.id.clone();
        // The first registration keeps the name; duplicates fail at build().
        self.id_to_index
            .entry(id.clone())
            .or_insert(self.drinks.len());
        self.drinks.push(def);
        id
    }

    /// Phase 2: Mutate an existing drink type by ID.
    pub fn mutate_drink<F>(&mut self, id: &str, f: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut DrinkTypeDef),
    {
        let index = *self
            .id_to_index
            .get(&DrinkTypeId::from(id))
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        f(&mut self.drinks[index]);
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.id_to_index.contains_key(&DrinkTypeId::from(id))
    }

    pub fn len(&self) -> usize {
        self.drinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drinks.is_empty()
    }

    /// Phase 3: Parse every formula and build the immutable registry.
    pub fn build(self) -> Result<Registry, RegistryError> {
        let mut drinks = BTreeMap::new();

        for def in self.drinks {
            if drinks.contains_key(&def.id) {
                return Err(RegistryError::Duplicate(def.id));
            }

            let parse = |field: &str, src: &str| {
                Formula::parse(src).map_err(|source| RegistryError::Formula {
                    drink: def.id.clone(),
                    field: field.to_string(),
                    source,
                })
            };

            let base_quality = parse("base_quality", &def.base_quality)?;
            let cooking_quality_mult = parse("cooking_quality_mult", &def.cooking_quality_mult)?;

            let mut barrels = BTreeMap::new();
            for barrel in &def.barrels {
                if !barrel.base_time.is_finite() || barrel.base_time < 0.0 {
                    return Err(RegistryError::InvalidBaseTime {
                        drink: def.id.clone(),
                        tag: barrel.tag.clone(),
                    });
                }
                let quality_change =
                    parse(&format!("barrels.{}.quality_change", barrel.tag), &barrel.quality_change)?;
                let profile = BarrelProfile {
                    tag: barrel.tag.clone(),
                    base_time: barrel.base_time,
                    quality_change,
                };
                if barrels.insert(barrel.tag.clone(), profile).is_some() {
                    return Err(RegistryError::DuplicateBarrel {
                        drink: def.id.clone(),
                        tag: barrel.tag.clone(),
                    });
                }
            }

            let drink = DrinkType {
                id: def.id.clone(),
                base_quality,
                cooking_quality_mult,
                recipe: def.recipe,
                barrels,
            };
            drinks.insert(def.id, drink);
        }

        Ok(Registry { drinks })
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Immutable registry of drink types. Frozen after build(). Thread-safe to share.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    drinks: BTreeMap<DrinkTypeId, DrinkType>,
}

impl Registry {
    pub fn get(&self, id: &DrinkTypeId) -> Option<&DrinkType> {
        self.drinks.get(id)
    }

    /// Barrel profile of `id` for `tag`. `None` when the type is unknown or
    /// has neither a profile for `tag` nor a generic one.
    pub fn profile_for(&self, id: &DrinkTypeId, tag: &str) -> Option<&BarrelProfile> {
        self.drinks.get(id)?.barrel_profile(tag)
    }

    /// Evaluate the base quality formula of `id` at `age_seconds`.
    pub fn base_quality(&self, id: &DrinkTypeId, age_seconds: f64) -> Result<f64, RegistryError> {
        let drink = self
            .drinks
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        drink
            .base_quality_at(age_seconds)
            .map_err(|source| RegistryError::Formula {
                drink: id.clone(),
                field: "base_quality".to_string(),
                source,
            })
    }

    pub fn has_barrel_profiles(&self, id: &DrinkTypeId) -> bool {
        self.drinks
            .get(id)
            .map(DrinkType::has_barrel_profiles)
            .unwrap_or(false)
    }

    /// All drink types in ascending id order.
    pub fn drinks(&self) -> impl Iterator<Item = &DrinkType> {
        self.drinks.values()
    }

    pub fn len(&self) -> usize {
        self.drinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drinks.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("duplicate drink type: {0}")]
    Duplicate(DrinkTypeId),
    #[error("duplicate barrel tag '{tag}' on {drink}")]
    DuplicateBarrel { drink: DrinkTypeId, tag: String },
    #[error("invalid base time for barrel '{tag}' on {drink}")]
    InvalidBaseTime { drink: DrinkTypeId, tag: String },
    #[error("{drink}.{field}: {source}")]
    Formula {
        drink: DrinkTypeId,
        field: String,
        #[source]
        source: FormulaError,
    },
}
