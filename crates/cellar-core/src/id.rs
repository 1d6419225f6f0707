use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::fmt;

new_key_type! {
    /// Identifies a barrel owned by a [`Cellar`](crate::cellar::Cellar).
    pub struct BarrelId;
}

/// Identifies a drink type in the registry, e.g. `"brewery:ale"`.
///
/// Ordered lexicographically; that order is the deterministic iteration
/// order of the registry and of mixture candidates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DrinkTypeId(pub String);

impl DrinkTypeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DrinkTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DrinkTypeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DrinkTypeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifies an ingredient item, e.g. `"minecraft:wheat"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IngredientId(pub String);

impl IngredientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IngredientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IngredientId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drink_type_ids_order_lexicographically() {
        let mut ids = vec![
            DrinkTypeId::from("mead"),
            DrinkTypeId::from("ale"),
            DrinkTypeId::from("cider"),
        ];
        ids.sort();
        let names: Vec<&str> = ids.iter().map(DrinkTypeId::as_str).collect();
        assert_eq!(names, ["ale", "cider", "mead"]);
    }

    #[test]
    fn ids_are_hashable() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(IngredientId::from("wheat"), 3);
        map.insert(IngredientId::from("honey"), 1);
        assert_eq!(map[&IngredientId::from("wheat")], 3);
    }

    #[test]
    fn display_is_raw_id() {
        assert_eq!(DrinkTypeId::new("brewery:ale").to_string(), "brewery:ale");
    }
}
