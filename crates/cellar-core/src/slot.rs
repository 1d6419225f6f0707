use crate::id::DrinkTypeId;
use crate::registry::{Ingredients, Registry};
use serde::{Deserialize, Serialize};

/// Number of slots in every barrel.
pub const BARREL_SLOTS: usize = 27;

// ---------------------------------------------------------------------------
// Slot content
// ---------------------------------------------------------------------------

/// A finished drink aging in the barrel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrinkEntry {
    pub type_id: DrinkTypeId,
    /// Age in ticks. Negative while the drink waits out the profile's base
    /// time. `None` until the first aging tick, which starts it at
    /// `-base_time`.
    pub age: Option<f64>,
    /// In `[0, 10]` once set.
    pub quality: Option<f64>,
    /// Tag of the barrel the drink last aged in; empty if never barrel-aged.
    pub barrel_type: String,
    /// Multiplier carried over from brewing. Defaults to 1.
    pub ingredient_mult: f64,
}

impl DrinkEntry {
    pub fn new(type_id: impl Into<DrinkTypeId>) -> Self {
        Self {
            type_id: type_id.into(),
            age: None,
            quality: None,
            barrel_type: String::new(),
            ingredient_mult: 1.0,
        }
    }

    pub fn with_age(mut self, age: f64) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_quality(mut self, quality: f64) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_barrel_type(mut self, tag: impl Into<String>) -> Self {
        self.barrel_type = tag.into();
        self
    }

    pub fn with_ingredient_mult(mut self, mult: f64) -> Self {
        self.ingredient_mult = mult;
        self
    }
}

/// An unfinished ingredient blend waiting to become a drink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixtureEntry {
    /// Ticks spent in barrels so far.
    pub age: f64,
    pub ingredients: Ingredients,
    /// Ticks the blend spent cooking before it was barreled.
    pub cook_age: f64,
}

impl MixtureEntry {
    pub fn new(ingredients: Ingredients) -> Self {
        Self {
            age: 0.0,
            ingredients,
            cook_age: 0.0,
        }
    }

    pub fn with_age(mut self, age: f64) -> Self {
        self.age = age;
        self
    }

    pub fn with_cook_age(mut self, cook_age: f64) -> Self {
        self.cook_age = cook_age;
        self
    }
}

/// Any other item. The aging engine never touches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherItem {
    pub item: String,
}

/// What a non-empty slot holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SlotContent {
    Drink(DrinkEntry),
    Mixture(MixtureEntry),
    Other(OtherItem),
    /// A spoiled drink. Terminal; only replacing the slot clears it.
    Failed,
}

impl SlotContent {
    pub fn is_failed(&self) -> bool {
        matches!(self, SlotContent::Failed)
    }

    pub fn as_drink(&self) -> Option<&DrinkEntry> {
        match self {
            SlotContent::Drink(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_mixture(&self) -> Option<&MixtureEntry> {
        match self {
            SlotContent::Mixture(m) => Some(m),
            _ => None,
        }
    }
}

impl From<DrinkEntry> for SlotContent {
    fn from(d: DrinkEntry) -> Self {
        SlotContent::Drink(d)
    }
}

impl From<MixtureEntry> for SlotContent {
    fn from(m: MixtureEntry) -> Self {
        SlotContent::Mixture(m)
    }
}

// ---------------------------------------------------------------------------
// Insertion filter
// ---------------------------------------------------------------------------

/// Whether a barrel tagged `barrel_type` accepts `content`.
///
/// A drink needs a known type with at least one barrel profile, and either no
/// stored barrel tag, the same tag, or an age of at most zero. Mixtures are
/// always accepted. Anything else is refused.
pub fn can_insert(content: &SlotContent, barrel_type: &str, registry: &Registry) -> bool {
    match content {
        SlotContent::Drink(drink) => {
            registry.has_barrel_profiles(&drink.type_id)
                && (drink.barrel_type.is_empty()
                    || drink.barrel_type == barrel_type
                    || drink.age.unwrap_or(0.0) <= 0.0)
        }
        SlotContent::Mixture(_) => true,
        SlotContent::Other(_) | SlotContent::Failed => false,
    }
}

// ---------------------------------------------------------------------------
// Slot store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    #[error("slot {0} out of range (barrels have {BARREL_SLOTS} slots)")]
    OutOfRange(usize),
    #[error("slot {0} is occupied")]
    Occupied(usize),
    #[error("slot {0} does not accept this item")]
    Rejected(usize),
}

/// Fixed-size ordered slots of one barrel. Each slot holds at most one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotStore {
    slots: [Option<SlotContent>; BARREL_SLOTS],
}

impl Default for SlotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotStore {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    pub fn len(&self) -> usize {
        BARREL_SLOTS
    }

    pub fn get(&self, index: usize) -> Option<&SlotContent> {
        self.slots.get(index)?.as_ref()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut SlotContent> {
        self.slots.get_mut(index)?.as_mut()
    }

    /// Replace the slot, returning what was there.
    pub fn set(
        &mut self,
        index: usize,
        content: Option<SlotContent>,
    ) -> Result<Option<SlotContent>, SlotError> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(SlotError::OutOfRange(index))?;
        Ok(std::mem::replace(slot, content))
    }

    /// Remove and return the slot's content.
    pub fn take(&mut self, index: usize) -> Option<SlotContent> {
        self.slots.get_mut(index)?.take()
    }

    /// Put `content` into an empty slot.
    pub fn try_insert(&mut self, index: usize, content: SlotContent) -> Result<(), SlotError> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(SlotError::OutOfRange(index))?;
        if slot.is_some() {
            return Err(SlotError::Occupied(index));
        }
        *slot = Some(content);
        Ok(())
    }

    /// [`try_insert`](Self::try_insert) after checking [`can_insert`].
    pub fn insert_filtered(
        &mut self,
        index: usize,
        content: SlotContent,
        barrel_type: &str,
        registry: &Registry,
    ) -> Result<(), SlotError> {
        if index >= BARREL_SLOTS {
            return Err(SlotError::OutOfRange(index));
        }
        if !can_insert(&content, barrel_type, registry) {
            return Err(SlotError::Rejected(index));
        }
        self.try_insert(index, content)
    }

    /// All slots in order, empty ones included.
    pub fn iter(&self) -> impl Iterator<Item = Option<&SlotContent>> {
        self.slots.iter().map(Option::as_ref)
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Option<SlotContent>; BARREL_SLOTS] {
        &mut self.slots
    }

    /// Non-empty slots with their indices.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, &SlotContent)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|c| (i, c)))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}
