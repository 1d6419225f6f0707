//! Persisted form of a barrel.
//!
//! [`BarrelRecord`] is the stored shape: packed part coordinates, tag, time
//! marker and the 27 slots. Every field defaults when missing, so any
//! well-formed but partial record decodes. Missing numbers become zero and
//! missing strings become empty.
//!
//! Two encodings are provided: a binary snapshot via `bitcode` with a
//! versioned header, and JSON via `serde_json`.

use crate::barrel::Barrel;
use crate::id::{DrinkTypeId, IngredientId};
use crate::registry::Ingredients;
use crate::slot::{BARREL_SLOTS, DrinkEntry, MixtureEntry, OtherItem, SlotContent, SlotStore};
use crate::structure::{BarrelStructure, BlockPos};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a barrel snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0xCE11_A001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
    #[error("json encoding failed: {0}")]
    Json(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("json decoding failed: {0}")]
    Json(String),
    #[error("record has {0} slots, barrels have {BARREL_SLOTS}")]
    TooManySlots(usize),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header prepended to every binary snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
        }
    }
}

impl SnapshotHeader {
    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct BarrelSnapshot {
    header: SnapshotHeader,
    record: BarrelRecord,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotKind {
    #[default]
    Empty,
    Drink,
    Mixture,
    Other,
    Failed,
}

/// One stored slot. Fields that do not apply to `kind` keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SlotRecord {
    pub kind: SlotKind,
    pub type_id: String,
    pub age: Option<f64>,
    pub quality: Option<f64>,
    pub barrel_type: String,
    pub ingredient_mult: f64,
    pub ingredients: Vec<(String, u32)>,
    pub cook_age: f64,
    pub item: String,
}

impl Default for SlotRecord {
    fn default() -> Self {
        Self {
            kind: SlotKind::Empty,
            type_id: String::new(),
            age: None,
            quality: None,
            barrel_type: String::new(),
            ingredient_mult: 1.0,
            ingredients: Vec::new(),
            cook_age: 0.0,
            item: String::new(),
        }
    }
}

impl SlotRecord {
    fn from_content(content: Option<&SlotContent>) -> Self {
        let Some(content) = content else {
            return Self::default();
        };
        match content {
            SlotContent::Drink(d) => Self {
                kind: SlotKind::Drink,
                type_id: d.type_id.as_str().to_string(),
                age: d.age,
                quality: d.quality,
                barrel_type: d.barrel_type.clone(),
                ingredient_mult: d.ingredient_mult,
                ..Self::default()
            },
            SlotContent::Mixture(m) => Self {
                kind: SlotKind::Mixture,
                age: Some(m.age),
                ingredients: m
                    .ingredients
                    .iter()
                    .map(|(id, n)| (id.as_str().to_string(), n))
                    .collect(),
                cook_age: m.cook_age,
                ..Self::default()
            },
            SlotContent::Other(o) => Self {
                kind: SlotKind::Other,
                item: o.item.clone(),
                ..Self::default()
            },
            SlotContent::Failed => Self {
                kind: SlotKind::Failed,
                ..Self::default()
            },
        }
    }

    fn into_content(self) -> Option<SlotContent> {
        let content = match self.kind {
            SlotKind::Empty => return None,
            SlotKind::Drink => SlotContent::Drink(DrinkEntry {
                type_id: DrinkTypeId(self.type_id),
                age: self.age,
                quality: self.quality,
                barrel_type: self.barrel_type,
                ingredient_mult: self.ingredient_mult,
            }),
            SlotKind::Mixture => SlotContent::Mixture(MixtureEntry {
                age: self.age.unwrap_or(0.0),
                ingredients: self
                    .ingredients
                    .into_iter()
                    .map(|(id, n)| (IngredientId(id), n))
                    .collect::<Ingredients>(),
                cook_age: self.cook_age,
            }),
            SlotKind::Other => SlotContent::Other(OtherItem { item: self.item }),
            SlotKind::Failed => SlotContent::Failed,
        };
        Some(content)
    }
}

/// Stored state of one barrel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct BarrelRecord {
    /// Packed coordinates, see [`BlockPos::as_long`]. Order is irrelevant.
    pub parts: Vec<i64>,
    pub barrel_type: String,
    pub last_ticked: i64,
    /// Up to 27 entries. Missing trailing slots are empty.
    pub slots: Vec<SlotRecord>,
}

// ---------------------------------------------------------------------------
// Barrel conversions
// ---------------------------------------------------------------------------

impl Barrel {
    pub fn to_record(&self) -> BarrelRecord {
        let s = self.structure();
        BarrelRecord {
            parts: s.parts().map(|p| p.as_long()).collect(),
            barrel_type: s.barrel_type().to_string(),
            last_ticked: s.last_ticked(),
            slots: self.slots().iter().map(SlotRecord::from_content).collect(),
        }
    }

    /// Rebuild a barrel. The result is clean.
    pub fn from_record(record: BarrelRecord) -> Result<Self, DeserializeError> {
        if record.slots.len() > BARREL_SLOTS {
            return Err(DeserializeError::TooManySlots(record.slots.len()));
        }

        let structure = BarrelStructure::from_parts(
            record.parts.into_iter().map(BlockPos::from_long),
            record.barrel_type,
            record.last_ticked,
        );

        let mut slots = SlotStore::new();
        for (index, slot) in record.slots.into_iter().enumerate() {
            // Length was checked above, so the index is always in range.
            let _ = slots.set(index, slot.into_content());
        }

        Ok(Barrel::from_parts(structure, slots))
    }

    /// Serialize to a binary blob via bitcode.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        let snapshot = BarrelSnapshot {
            header: SnapshotHeader::default(),
            record: self.to_record(),
        };
        bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Deserialize from a binary blob, validating the header first.
    pub fn deserialize(data: &[u8]) -> Result<Self, DeserializeError> {
        let snapshot: BarrelSnapshot =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        snapshot.header.validate()?;
        Self::from_record(snapshot.record)
    }

    pub fn to_json(&self) -> Result<String, SerializeError> {
        serde_json::to_string(&self.to_record()).map_err(|e| SerializeError::Json(e.to_string()))
    }

    /// Parse a JSON record. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, DeserializeError> {
        let record: BarrelRecord =
            serde_json::from_str(json).map_err(|e| DeserializeError::Json(e.to_string()))?;
        Self::from_record(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn mixed_barrel() -> Barrel {
        let mut b = barrel("oak");
        b.structure_mut().set_last_ticked(123_456);
        b.structure_mut()
            .add_part(BlockPos::new(-29_999_000, -64, 31))
            .unwrap();
        for i in 0..BARREL_SLOTS {
            let content = match i % 5 {
                0 => DrinkEntry::new(ALE)
                    .with_age(-0.1 * i as f64)
                    .with_barrel_type("oak")
                    .into(),
                1 => DrinkEntry::new(CIDER)
                    .with_age(1e6 / 3.0)
                    .with_quality(7.25)
                    .with_ingredient_mult(0.8)
                    .into(),
                2 => MixtureEntry::new(orchard_blend())
                    .with_age(40.5)
                    .with_cook_age(12.0)
                    .into(),
                3 => SlotContent::Other(OtherItem {
                    item: format!("minecraft:stick#{i}"),
                }),
                _ => SlotContent::Failed,
            };
            b.slots_mut().try_insert(i, content).unwrap();
        }
        b
    }

    #[test]
    fn default_state_round_trip() {
        let b = Barrel::default();
        assert_eq!(b.structure().barrel_type(), "void");
        assert_eq!(b.structure().last_ticked(), -1);

        let bytes = b.serialize().unwrap();
        assert_eq!(Barrel::deserialize(&bytes).unwrap(), b);
        assert_eq!(Barrel::from_json(&b.to_json().unwrap()).unwrap(), b);
    }

    #[test]
    fn full_barrel_round_trip() {
        let b = mixed_barrel();
        let bytes = b.serialize().unwrap();
        assert_eq!(Barrel::deserialize(&bytes).unwrap(), b);
        assert_eq!(Barrel::from_json(&b.to_json().unwrap()).unwrap(), b);
    }

    #[test]
    fn repeated_parts_round_trip_as_one() {
        let mut b = Barrel::default();
        let pos = BlockPos::new(7, 70, 7);
        for _ in 0..3 {
            b.structure_mut().add_part(pos).unwrap();
        }
        assert_eq!(b.to_record().parts, [pos.as_long()]);
        let back = Barrel::deserialize(&b.serialize().unwrap()).unwrap();
        assert_eq!(back.structure().part_count(), 1);
        assert_eq!(back, b);
    }

    #[test]
    fn decoded_barrel_is_clean() {
        let mut b = mixed_barrel();
        assert!(b.structure().is_dirty());
        let back = Barrel::deserialize(&b.serialize().unwrap()).unwrap();
        assert!(!back.structure().is_dirty());
        b.structure_mut().mark_clean();
        assert_eq!(back, b);
    }

    #[test]
    fn record_uses_stored_key_names() {
        let json = barrel("oak").to_json().unwrap();
        for key in ["\"Parts\"", "\"BarrelType\"", "\"LastTicked\"", "\"Slots\""] {
            assert!(json.contains(key), "missing {key} in {json}");
        }
    }

    #[test]
    fn partial_record_takes_defaults() {
        let b = Barrel::from_json("{}").unwrap();
        assert_eq!(b.structure().barrel_type(), "");
        assert_eq!(b.structure().last_ticked(), 0);
        assert_eq!(b.structure().part_count(), 0);
        assert!(b.slots().is_empty());

        let b = Barrel::from_json(
            r#"{"BarrelType":"oak","Slots":[{},{"Kind":"Drink","TypeId":"brewery:ale"},{"Kind":"Mixture"}]}"#,
        )
        .unwrap();
        assert!(b.slots().get(0).is_none());
        let drink = b.slots().get(1).and_then(SlotContent::as_drink).unwrap();
        assert_eq!(drink.age, None);
        assert_eq!(drink.quality, None);
        assert_eq!(drink.barrel_type, "");
        assert_eq!(drink.ingredient_mult, 1.0);
        let mix = b.slots().get(2).and_then(SlotContent::as_mixture).unwrap();
        assert_eq!(mix.age, 0.0);
        assert!(mix.ingredients.is_empty());
        assert!(b.slots().get(3).is_none());
    }

    #[test]
    fn too_many_slots_is_an_error() {
        let record = BarrelRecord {
            slots: vec![SlotRecord::default(); BARREL_SLOTS + 1],
            ..BarrelRecord::default()
        };
        assert!(matches!(
            Barrel::from_record(record),
            Err(DeserializeError::TooManySlots(28))
        ));
    }

    #[test]
    fn header_is_validated() {
        let encode = |magic, version| {
            bitcode::serialize(&BarrelSnapshot {
                header: SnapshotHeader { magic, version },
                record: BarrelRecord::default(),
            })
            .unwrap()
        };
        assert!(matches!(
            Barrel::deserialize(&encode(0xDEAD_BEEF, FORMAT_VERSION)),
            Err(DeserializeError::InvalidMagic(0xDEAD_BEEF))
        ));
        assert!(matches!(
            Barrel::deserialize(&encode(SNAPSHOT_MAGIC, FORMAT_VERSION + 1)),
            Err(DeserializeError::FutureVersion(_))
        ));
        assert!(matches!(
            Barrel::deserialize(&encode(SNAPSHOT_MAGIC, 0)),
            Err(DeserializeError::UnsupportedVersion(0))
        ));
    }

    #[test]
    fn garbage_fails_to_decode() {
        assert!(matches!(
            Barrel::deserialize(&[1, 2, 3]),
            Err(DeserializeError::Decode(_))
        ));
        assert!(matches!(
            Barrel::from_json("[not json"),
            Err(DeserializeError::Json(_))
        ));
    }
}
