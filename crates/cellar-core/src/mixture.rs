//! Mixture resolution: which finished drink an ingredient blend becomes.
//!
//! [`find_candidates`] lists every drink type whose recipe matches the blend
//! and that can age in the barrel. [`select_best`] then picks one of them
//! once enough time has passed.
//!
//! Candidates are always visited in ascending [`DrinkTypeId`] order. The
//! selection rules only depend on that order for exact quality ties, where
//! the candidate visited first wins.

use crate::formula::{AGE, Bindings, FormulaError, QUALITY};
use crate::id::DrinkTypeId;
use crate::registry::{BarrelProfile, DrinkType, Ingredients, Registry};

/// A drink type matching a blend, with the profile it would use in the barrel.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'r> {
    pub drink: &'r DrinkType,
    pub profile: &'r BarrelProfile,
    /// Whether `profile` is the `"*"` fallback.
    pub generic: bool,
}

/// The candidate chosen by [`select_best`] and its computed quality.
#[derive(Debug, Clone, Copy)]
pub struct Selection<'r> {
    pub drink: &'r DrinkType,
    pub profile: &'r BarrelProfile,
    pub generic: bool,
    pub quality: f64,
}

impl Selection<'_> {
    pub fn id(&self) -> &DrinkTypeId {
        &self.drink.id
    }
}

/// Drink types whose recipe equals `ingredients` and that have a profile
/// (specific or generic) for `tag`, in ascending id order. An empty result is
/// a normal outcome.
pub fn find_candidates<'r>(
    registry: &'r Registry,
    ingredients: &Ingredients,
    tag: &str,
) -> Vec<Candidate<'r>> {
    registry
        .drinks()
        .filter(|drink| drink.recipe == *ingredients)
        .filter_map(|drink| {
            drink.barrel_profile(tag).map(|profile| Candidate {
                drink,
                profile,
                generic: profile.is_generic(),
            })
        })
        .collect()
}

/// Quality a candidate reaches after `residual_age` seconds past its
/// base time.
pub fn candidate_quality(candidate: &Candidate<'_>, residual_age: f64) -> Result<f64, FormulaError> {
    let base = candidate.drink.base_quality_at(residual_age)?;
    candidate.profile.quality_change.evaluate(
        &Bindings::new()
            .with(QUALITY, base)
            .with(AGE, residual_age),
    )
}

/// Pick the candidate a mixture of `age_seconds` turns into.
///
/// Candidates whose base time exceeds the age are skipped. Among the rest the
/// first is accepted, then replaced by a later one that either has the same
/// genericity and a strictly higher quality, or is specific while the current
/// pick is generic. A generic candidate never replaces a specific one.
///
/// Returns `Ok(None)` when no candidate is old enough yet.
pub fn select_best<'r>(
    candidates: &[Candidate<'r>],
    age_seconds: f64,
) -> Result<Option<Selection<'r>>, FormulaError> {
    let mut best: Option<Selection<'r>> = None;

    for candidate in candidates {
        if candidate.profile.base_time > age_seconds {
            continue;
        }
        if let Some(current) = &best
            && candidate.generic
            && !current.generic
        {
            continue;
        }

        let residual = age_seconds - candidate.profile.base_time;
        let quality = candidate_quality(candidate, residual)?;

        let replace = match &best {
            None => true,
            Some(current) => {
                (candidate.generic == current.generic && quality > current.quality)
                    || (!candidate.generic && current.generic)
            }
        };

        if replace {
            best = Some(Selection {
                drink: candidate.drink,
                profile: candidate.profile,
                generic: candidate.generic,
                quality,
            });
        }
    }

    Ok(best)
}
