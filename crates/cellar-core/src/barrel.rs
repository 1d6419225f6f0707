use crate::aging::{self, AgingError, TickReport};
use crate::registry::Registry;
use crate::slot::{SlotContent, SlotError, SlotStore};
use crate::structure::BarrelStructure;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Clock policy
// ---------------------------------------------------------------------------

/// How world time turns into aging time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgingRules {
    /// Scales elapsed world ticks.
    pub multiplier: f64,
    /// When true, time passed while the barrel was unloaded counts in full.
    /// When false, every update counts as `multiplier` ticks.
    pub age_unloaded: bool,
}

impl Default for AgingRules {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            age_unloaded: true,
        }
    }
}

/// Rejected clock policy.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RulesError {
    #[error("multiplier must be finite and non-negative, got {0}")]
    InvalidMultiplier(f64),
}

impl AgingRules {
    /// Check that `elapsed` can only produce finite, non-negative values.
    pub fn validate(&self) -> Result<(), RulesError> {
        if !self.multiplier.is_finite() || self.multiplier < 0.0 {
            return Err(RulesError::InvalidMultiplier(self.multiplier));
        }
        Ok(())
    }

    /// Aging ticks between `last_ticked` and `now`. Never negative.
    pub fn elapsed(&self, now: i64, last_ticked: i64) -> f64 {
        let elapsed = if self.age_unloaded {
            now.saturating_sub(last_ticked) as f64 * self.multiplier
        } else {
            self.multiplier
        };
        if elapsed < 0.0 {
            tracing::warn!(
                target: "cellar::barrel",
                now,
                last_ticked,
                elapsed,
                "world time went backwards, clamping elapsed to zero"
            );
            return 0.0;
        }
        elapsed
    }
}

// ---------------------------------------------------------------------------
// Barrel
// ---------------------------------------------------------------------------

/// One barrel: its structure and its 27 slots.
///
/// Changes to either mark the structure dirty so the host knows to save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Barrel {
    structure: BarrelStructure,
    slots: SlotStore,
}

impl Barrel {
    pub fn new(structure: BarrelStructure) -> Self {
        Self {
            structure,
            slots: SlotStore::new(),
        }
    }

    pub fn from_parts(structure: BarrelStructure, slots: SlotStore) -> Self {
        Self { structure, slots }
    }

    pub fn structure(&self) -> &BarrelStructure {
        &self.structure
    }

    pub fn structure_mut(&mut self) -> &mut BarrelStructure {
        &mut self.structure
    }

    pub fn slots(&self) -> &SlotStore {
        &self.slots
    }

    /// Direct slot access. Bypasses the insertion filter and dirty tracking.
    pub fn slots_mut(&mut self) -> &mut SlotStore {
        &mut self.slots
    }

    pub fn barrel_type(&self) -> &str {
        self.structure.barrel_type()
    }

    /// Read-only copy of every slot, for display.
    pub fn contents(&self) -> Vec<Option<SlotContent>> {
        self.slots.iter().map(|s| s.cloned()).collect()
    }

    /// Insert through the filter for this barrel's tag.
    pub fn insert(
        &mut self,
        index: usize,
        content: SlotContent,
        registry: &Registry,
    ) -> Result<(), SlotError> {
        self.slots
            .insert_filtered(index, content, self.structure.barrel_type(), registry)?;
        self.structure.mark_dirty();
        Ok(())
    }

    pub fn take(&mut self, index: usize) -> Option<SlotContent> {
        let taken = self.slots.take(index)?;
        self.structure.mark_dirty();
        Some(taken)
    }

    /// Age every slot by `elapsed` ticks under the current tag.
    pub fn tick(&mut self, elapsed: f64, registry: &Registry) -> Result<TickReport, AgingError> {
        let report =
            aging::tick_contents(&mut self.slots, self.structure.barrel_type(), elapsed, registry)?;
        if report.changed() {
            self.structure.mark_dirty();
        }
        Ok(report)
    }

    /// Advance to world time `now`.
    ///
    /// The first call only records `now` and returns `Ok(None)`. Later calls
    /// age the contents by [`AgingRules::elapsed`] and move the marker to
    /// `now`. On error the marker is left where it was.
    pub fn update(
        &mut self,
        now: i64,
        rules: &AgingRules,
        registry: &Registry,
    ) -> Result<Option<TickReport>, AgingError> {
        if !self.structure.has_ticked() {
            tracing::debug!(target: "cellar::barrel", now, "first update, clock started");
            self.structure.set_last_ticked(now);
            return Ok(None);
        }
        let elapsed = rules.elapsed(now, self.structure.last_ticked());
        let report = self.tick(elapsed, registry)?;
        self.structure.set_last_ticked(now);
        Ok(Some(report))
    }
}

/// Value form of [`Barrel::tick`]: consumes a barrel and returns the aged one.
pub fn aged(
    mut barrel: Barrel,
    elapsed: f64,
    registry: &Registry,
) -> Result<(Barrel, TickReport), AgingError> {
    let report = barrel.tick(elapsed, registry)?;
    Ok((barrel, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::DrinkEntry;
    use crate::test_utils::*;

    #[test]
    fn elapsed_scales_world_time() {
        let rules = AgingRules {
            multiplier: 2.0,
            age_unloaded: true,
        };
        assert_eq!(rules.elapsed(150, 100), 100.0);
        assert_eq!(AgingRules::default().elapsed(150, 100), 50.0);
    }

    #[test]
    fn elapsed_without_unloaded_aging_is_constant() {
        let rules = AgingRules {
            multiplier: 3.0,
            age_unloaded: false,
        };
        assert_eq!(rules.elapsed(10_000, 0), 3.0);
    }

    #[test]
    fn validate_rejects_unusable_multipliers() {
        assert_eq!(AgingRules::default().validate(), Ok(()));
        let zero = AgingRules {
            multiplier: 0.0,
            ..AgingRules::default()
        };
        assert_eq!(zero.validate(), Ok(()));
        for bad in [f64::NAN, f64::INFINITY, -1.0] {
            let rules = AgingRules {
                multiplier: bad,
                ..AgingRules::default()
            };
            assert!(matches!(
                rules.validate(),
                Err(RulesError::InvalidMultiplier(_))
            ));
        }
    }

    #[test]
    fn backwards_time_clamps_to_zero() {
        assert_eq!(AgingRules::default().elapsed(10, 100), 0.0);
    }

    #[test]
    fn first_update_only_records_time() {
        let reg = brewery_registry();
        let mut b = barrel_with("oak", [unaged(ALE)]);
        let before = b.slots().clone();

        assert_eq!(b.update(1000, &AgingRules::default(), &reg), Ok(None));
        assert_eq!(b.structure().last_ticked(), 1000);
        assert!(b.structure().is_dirty());
        assert_eq!(b.slots(), &before);
    }

    #[test]
    fn later_updates_age_by_world_time() {
        let reg = brewery_registry();
        let mut b = barrel_with("oak", [unaged(ALE)]);
        b.update(1000, &AgingRules::default(), &reg).unwrap();
        b.structure_mut().mark_clean();

        let report = b.update(1050, &AgingRules::default(), &reg).unwrap().unwrap();
        assert_eq!(report.aged, [0]);
        assert_eq!(b.structure().last_ticked(), 1050);
        assert!(b.structure().is_dirty());
        let drink = b.slots().get(0).and_then(SlotContent::as_drink).unwrap();
        assert_eq!(drink.age, Some(-150.0));
    }

    #[test]
    fn tick_uses_tag_at_tick_time() {
        let reg = brewery_registry();
        let mut b = barrel_with("oak", [DrinkEntry::new(ALE).with_age(0.0).into()]);
        b.structure_mut().set_barrel_type("spruce");
        let report = b.tick(20.0 * 30.0, &reg).unwrap();
        assert_eq!(report.failed, [0]);
    }

    #[test]
    fn insert_goes_through_filter() {
        let reg = brewery_registry();
        let mut b = barrel("oak");
        assert_eq!(
            b.insert(0, unaged(WATER), &reg),
            Err(SlotError::Rejected(0))
        );
        assert!(!b.structure().is_dirty());
        b.insert(0, unaged(ALE), &reg).unwrap();
        assert!(b.structure().is_dirty());
        assert!(b.take(0).is_some());
        assert!(b.take(0).is_none());
    }

    #[test]
    fn contents_snapshot_has_every_slot() {
        let b = barrel_with("oak", [unaged(ALE), SlotContent::Failed]);
        let contents = b.contents();
        assert_eq!(contents.len(), 27);
        assert_eq!(contents[1], Some(SlotContent::Failed));
        assert!(contents[2].is_none());
    }

    #[test]
    fn aged_returns_new_value() {
        let reg = brewery_registry();
        let b = barrel_with("oak", [unaged(ALE)]);
        let (next, report) = aged(b.clone(), 50.0, &reg).unwrap();
        assert_eq!(report.aged, [0]);
        assert_ne!(next.slots(), b.slots());
    }

    #[test]
    fn idle_tick_does_not_mark_dirty() {
        let reg = brewery_registry();
        let mut b = barrel_with("oak", [unaged(CIDER)]);
        b.structure_mut().set_barrel_type("spruce");
        b.structure_mut().mark_clean();
        let report = b.tick(100.0, &reg).unwrap();
        assert!(!report.changed());
        assert!(!b.structure().is_dirty());
    }
}
