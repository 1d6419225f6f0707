//! The aging pass: advance every slot of a barrel by an elapsed time.
//!
//! Each occupied slot is handled on its own:
//!
//! - **Drink**: looks up the profile for the barrel's *current* tag. Without
//!   one the slot is left alone. Otherwise the drink's age advances, and once
//!   it is non-negative the quality is recomputed from the type's formulas.
//!   A negative quality spoils the drink.
//! - **Mixture**: accumulates age and is matched against recipes. No match
//!   spoils it; a match that is old enough turns it into a drink (see
//!   [`mixture::select_best`]).
//! - **Other** and **Failed** slots are never touched.
//!
//! A slot's next state is computed before anything is written, so a formula
//! error leaves that slot exactly as it was. The error is logged, reported in
//! [`TickReport::skipped`] and the pass moves on to the next slot.

use crate::TICKS_PER_SECOND;
use crate::formula::{AGE, Bindings, FormulaError, QUALITY};
use crate::id::DrinkTypeId;
use crate::mixture::{self, find_candidates};
use crate::registry::Registry;
use crate::slot::{DrinkEntry, MixtureEntry, SlotContent, SlotStore};

/// Highest quality a drink can hold.
pub const MAX_QUALITY: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AgingError {
    #[error("elapsed time must be finite and non-negative, got {0}")]
    InvalidElapsed(f64),
}

/// What one aging pass did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Slots whose drink or mixture advanced and kept its kind.
    pub aged: Vec<usize>,
    /// Mixtures that became drinks, with the chosen type.
    pub resolved: Vec<(usize, DrinkTypeId)>,
    /// Slots that spoiled this pass.
    pub failed: Vec<usize>,
    /// Slots left untouched because a formula failed.
    pub skipped: Vec<(usize, FormulaError)>,
}

impl TickReport {
    /// Whether any slot changed.
    pub fn changed(&self) -> bool {
        !(self.aged.is_empty() && self.resolved.is_empty() && self.failed.is_empty())
    }
}

/// Advance every slot of `slots` by `elapsed` ticks in a barrel tagged
/// `barrel_type`.
pub fn tick_contents(
    slots: &mut SlotStore,
    barrel_type: &str,
    elapsed: f64,
    registry: &Registry,
) -> Result<TickReport, AgingError> {
    if !elapsed.is_finite() || elapsed < 0.0 {
        return Err(AgingError::InvalidElapsed(elapsed));
    }

    let mut report = TickReport::default();

    for (index, slot) in slots.slots_mut().iter_mut().enumerate() {
        let Some(content) = slot.as_ref() else {
            continue;
        };

        let step = match content {
            SlotContent::Drink(drink) => drink_step(drink, barrel_type, elapsed, registry),
            SlotContent::Mixture(mix) => mixture_step(mix, barrel_type, elapsed, registry),
            SlotContent::Other(_) | SlotContent::Failed => continue,
        };

        let next = match step {
            Ok(Some(next)) => next,
            Ok(None) => continue,
            Err(err) => {
                tracing::warn!(
                    target: "cellar::aging",
                    slot = index,
                    barrel_type,
                    error = %err,
                    "formula failed, slot skipped"
                );
                report.skipped.push((index, err));
                continue;
            }
        };

        match (&*content, &next) {
            (_, SlotContent::Failed) => {
                tracing::debug!(target: "cellar::aging", slot = index, "slot spoiled");
                report.failed.push(index);
            }
            (SlotContent::Mixture(_), SlotContent::Drink(drink)) => {
                tracing::debug!(
                    target: "cellar::aging",
                    slot = index,
                    drink = %drink.type_id,
                    "mixture resolved"
                );
                report.resolved.push((index, drink.type_id.clone()));
            }
            _ => report.aged.push(index),
        }

        *slot = Some(next);
    }

    Ok(report)
}

/// Next state of a drink, or `None` when its type cannot age in this barrel.
fn drink_step(
    drink: &DrinkEntry,
    barrel_type: &str,
    elapsed: f64,
    registry: &Registry,
) -> Result<Option<SlotContent>, FormulaError> {
    let Some(drink_type) = registry.get(&drink.type_id) else {
        return Ok(None);
    };
    let Some(profile) = drink_type.barrel_profile(barrel_type) else {
        return Ok(None);
    };

    // A drink that never aged starts base_time ticks below zero.
    let age = drink.age.unwrap_or(-profile.base_time) + elapsed;

    let mut next = drink.clone();
    next.barrel_type = barrel_type.to_string();
    next.age = Some(age);

    if age >= 0.0 {
        let age_seconds = age / TICKS_PER_SECOND;
        let base = drink_type.base_quality_at(age_seconds)?;
        let quality = profile.quality_change.evaluate(
            &Bindings::new()
                .with(QUALITY, base)
                .with(AGE, age_seconds),
        )? * drink.ingredient_mult;
        if !quality.is_finite() {
            return Err(FormulaError::NonFinite);
        }

        if quality < 0.0 {
            return Ok(Some(SlotContent::Failed));
        }
        next.quality = Some(quality.min(MAX_QUALITY));
    }

    Ok(Some(SlotContent::Drink(next)))
}

/// Next state of a mixture. Always `Some`: a mixture either keeps aging,
/// becomes a drink, or spoils.
fn mixture_step(
    mix: &MixtureEntry,
    barrel_type: &str,
    elapsed: f64,
    registry: &Registry,
) -> Result<Option<SlotContent>, FormulaError> {
    let age = mix.age + elapsed;
    let age_seconds = age / TICKS_PER_SECOND;

    let candidates = find_candidates(registry, &mix.ingredients, barrel_type);
    if candidates.is_empty() {
        return Ok(Some(SlotContent::Failed));
    }

    let Some(best) = mixture::select_best(&candidates, age_seconds)? else {
        let mut next = mix.clone();
        next.age = age;
        return Ok(Some(SlotContent::Mixture(next)));
    };

    if best.quality < 0.0 {
        return Ok(Some(SlotContent::Failed));
    }

    let quality = best
        .drink
        .cooking_quality_mult
        .evaluate_age(mix.cook_age / TICKS_PER_SECOND)?;
    if quality < 0.0 {
        return Ok(Some(SlotContent::Failed));
    }

    let drink = DrinkEntry::new(best.drink.id.clone()).with_quality(quality.min(MAX_QUALITY));
    Ok(Some(SlotContent::Drink(drink)))
}
