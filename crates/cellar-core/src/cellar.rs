//! A collection of independent barrels updated together.
//!
//! Barrels share no mutable state, so with the `parallel` feature they can be
//! updated concurrently with rayon.

use crate::aging::{AgingError, TickReport};
use crate::barrel::{AgingRules, Barrel};
use crate::id::BarrelId;
use crate::registry::Registry;
use crate::structure::BlockPos;
use slotmap::SlotMap;

/// Outcome of updating one barrel.
pub type UpdateResult = Result<Option<TickReport>, AgingError>;

#[derive(Debug, Clone, Default)]
pub struct Cellar {
    barrels: SlotMap<BarrelId, Barrel>,
}

impl Cellar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, barrel: Barrel) -> BarrelId {
        self.barrels.insert(barrel)
    }

    pub fn remove(&mut self, id: BarrelId) -> Option<Barrel> {
        self.barrels.remove(id)
    }

    pub fn get(&self, id: BarrelId) -> Option<&Barrel> {
        self.barrels.get(id)
    }

    pub fn get_mut(&mut self, id: BarrelId) -> Option<&mut Barrel> {
        self.barrels.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.barrels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.barrels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BarrelId, &Barrel)> {
        self.barrels.iter()
    }

    /// The barrel a block belongs to.
    pub fn find_by_part(&self, pos: &BlockPos) -> Option<BarrelId> {
        self.barrels
            .iter()
            .find(|(_, b)| b.structure().contains_part(pos))
            .map(|(id, _)| id)
    }

    /// Update every barrel to world time `now`. A failing barrel does not stop
    /// the others.
    pub fn update_all(
        &mut self,
        now: i64,
        rules: &AgingRules,
        registry: &Registry,
    ) -> Vec<(BarrelId, UpdateResult)> {
        self.barrels
            .iter_mut()
            .map(|(id, barrel)| (id, barrel.update(now, rules, registry)))
            .inspect(log_failure)
            .collect()
    }

    /// [`update_all`](Self::update_all) with one rayon task per barrel.
    #[cfg(feature = "parallel")]
    pub fn update_all_parallel(
        &mut self,
        now: i64,
        rules: &AgingRules,
        registry: &Registry,
    ) -> Vec<(BarrelId, UpdateResult)> {
        use rayon::prelude::*;

        let barrels: Vec<(BarrelId, &mut Barrel)> = self.barrels.iter_mut().collect();
        barrels
            .into_par_iter()
            .map(|(id, barrel)| (id, barrel.update(now, rules, registry)))
            .inspect(log_failure)
            .collect()
    }
}

fn log_failure((id, result): &(BarrelId, UpdateResult)) {
    if let Err(err) = result {
        tracing::error!(target: "cellar::cellar", barrel = ?id, error = %err, "barrel update failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn cellar_of(n: usize) -> (Cellar, Vec<BarrelId>) {
        let mut cellar = Cellar::new();
        let ids = (0..n)
            .map(|_| cellar.insert(barrel_with("oak", [unaged(ALE)])))
            .collect();
        (cellar, ids)
    }

    #[test]
    fn insert_get_remove() {
        let (mut cellar, ids) = cellar_of(2);
        assert_eq!(cellar.len(), 2);
        assert!(cellar.get(ids[0]).is_some());
        assert!(cellar.remove(ids[0]).is_some());
        assert!(cellar.get(ids[0]).is_none());
        assert!(cellar.remove(ids[0]).is_none());
        assert_eq!(cellar.len(), 1);
    }

    #[test]
    fn update_all_ages_every_barrel() {
        let reg = brewery_registry();
        let (mut cellar, _) = cellar_of(3);
        let rules = AgingRules::default();

        let first = cellar.update_all(0, &rules, &reg);
        assert!(first.iter().all(|(_, r)| matches!(r, Ok(None))));

        let second = cellar.update_all(50, &rules, &reg);
        assert_eq!(second.len(), 3);
        for (id, result) in second {
            assert_eq!(result.unwrap().unwrap().aged, [0]);
            assert_eq!(cellar.get(id).unwrap().structure().last_ticked(), 50);
        }
    }

    #[test]
    fn failing_barrel_does_not_stop_others() {
        let reg = brewery_registry();
        let (mut cellar, ids) = cellar_of(2);
        let bad = AgingRules {
            multiplier: f64::NAN,
            age_unloaded: true,
        };
        cellar.update_all(0, &bad, &reg);
        cellar.get_mut(ids[1]).unwrap().structure_mut().set_last_ticked(-1);

        let results = cellar.update_all(10, &bad, &reg);
        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        assert_eq!(failed, 1);
        assert_eq!(cellar.get(ids[0]).unwrap().structure().last_ticked(), 0);
        assert_eq!(cellar.get(ids[1]).unwrap().structure().last_ticked(), 10);
    }

    #[test]
    fn find_by_part() {
        let (cellar, ids) = cellar_of(1);
        assert_eq!(cellar.find_by_part(&BlockPos::new(1, 1, 1)), Some(ids[0]));
        assert_eq!(cellar.find_by_part(&BlockPos::new(5, 5, 5)), None);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_update_matches_sequential() {
        let reg = brewery_registry();
        let rules = AgingRules::default();
        let (mut seq, _) = cellar_of(8);
        let (mut par, _) = cellar_of(8);
        for now in [0, 40, 300] {
            seq.update_all(now, &rules, &reg);
            par.update_all_parallel(now, &rules, &reg);
        }
        let a: Vec<&Barrel> = seq.iter().map(|(_, b)| b).collect();
        let b: Vec<&Barrel> = par.iter().map(|(_, b)| b).collect();
        assert_eq!(a, b);
    }
}
