//! End-to-end aging scenarios through the public API.

use cellar_core::aging::tick_contents;
use cellar_core::barrel::{AgingRules, Barrel, aged};
use cellar_core::registry::{DrinkTypeDef, GENERIC_TAG, Ingredients, RegistryBuilder};
use cellar_core::slot::{DrinkEntry, MixtureEntry, SlotContent, SlotStore};
use cellar_core::structure::BlockPos;
use cellar_core::test_utils::*;

fn drink(barrel: &Barrel, index: usize) -> &DrinkEntry {
    barrel
        .slots()
        .get(index)
        .and_then(SlotContent::as_drink)
        .expect("slot should hold a drink")
}

// ===========================================================================
// Scenarios
// ===========================================================================

#[test]
fn ale_waits_out_base_time_then_gains_quality() {
    let reg = brewery_registry();
    let mut b = barrel_with("oak", [unaged(ALE)]);

    b.tick(50.0, &reg).unwrap();
    assert_eq!(drink(&b, 0).age, Some(-150.0));
    assert_eq!(drink(&b, 0).quality, None);

    b.tick(150.0, &reg).unwrap();
    let ale = drink(&b, 0);
    assert_eq!(ale.age, Some(0.0));
    // base = 0 / 2, oak change = quality + 1
    assert_eq!(ale.quality, Some(1.0));
    assert_eq!(ale.barrel_type, "oak");
}

#[test]
fn specific_cider_beats_generic_mead() {
    let reg = brewery_registry();
    // 120 s of barrel time in ticks.
    let mut b = barrel_with("oak", [mixture(orchard_blend(), 0.0)]);
    let report = b.tick(120.0 * 20.0, &reg).unwrap();
    assert_eq!(report.resolved, [(0, CIDER.into())]);
    assert_eq!(drink(&b, 0).type_id.as_str(), CIDER);
}

#[test]
fn specific_wins_even_with_lower_quality() {
    let mut builder = RegistryBuilder::new();
    let blend = Ingredients::new().with("pear", 3);
    let mut cider = DrinkTypeDef::new("b-cider", "1").barrel("oak", 100.0, "quality");
    cider.recipe = blend.clone();
    let mut mead = DrinkTypeDef::new("a-mead", "9").barrel(GENERIC_TAG, 50.0, "quality");
    mead.recipe = blend.clone();
    builder.register_drink(cider);
    builder.register_drink(mead);
    let reg = builder.build().unwrap();

    let mut b = barrel_with("oak", [mixture(blend, 0.0)]);
    b.tick(120.0 * 20.0, &reg).unwrap();
    assert_eq!(drink(&b, 0).type_id.as_str(), "b-cider");
}

#[test]
fn unmatched_mixture_in_clay_fails_on_zero_tick() {
    let reg = brewery_registry();
    let mut b = barrel_with(
        "clay",
        [mixture(Ingredients::new().with("minecraft:dirt", 4), 0.0)],
    );
    let report = b.tick(0.0, &reg).unwrap();
    assert_eq!(report.failed, [0]);
    assert!(b.slots().get(0).unwrap().is_failed());

    // Failed is terminal.
    b.tick(10_000.0, &reg).unwrap();
    assert!(b.slots().get(0).unwrap().is_failed());
}

#[test]
fn generic_mead_is_picked_in_other_barrels() {
    let reg = brewery_registry();
    let mut b = barrel_with("birch", [mixture(orchard_blend(), 0.0)]);
    b.tick(60.0 * 20.0, &reg).unwrap();
    let mead = drink(&b, 0);
    assert_eq!(mead.type_id.as_str(), MEAD);
    assert_eq!(mead.quality, Some(1.0));
}

#[test]
fn resolved_drink_keeps_aging() {
    let reg = brewery_registry();
    let mut b = barrel_with("oak", [mixture(orchard_blend(), 0.0)]);
    b.tick(120.0 * 20.0, &reg).unwrap();
    assert_eq!(drink(&b, 0).age, None);

    // The new drink starts at -base_time on its next tick.
    b.tick(10.0, &reg).unwrap();
    assert_eq!(drink(&b, 0).age, Some(-90.0));
    assert_eq!(drink(&b, 0).barrel_type, "oak");
}

// ===========================================================================
// Host cycle
// ===========================================================================

#[test]
fn host_cycle_with_save_and_load() {
    let reg = brewery_registry();
    let rules = AgingRules::default();

    let mut b = barrel_with("oak", [unaged(ALE), mixture(orchard_blend(), 0.0)]);
    assert_eq!(b.update(1_000, &rules, &reg).unwrap(), None);
    b.update(1_100, &rules, &reg).unwrap();

    let bytes = b.serialize().unwrap();
    let mut restored = Barrel::deserialize(&bytes).unwrap();
    assert_eq!(restored, b);

    // The restored barrel does not re-run the first-tick path.
    let report = restored.update(1_200, &rules, &reg).unwrap().unwrap();
    assert_eq!(report.aged, [0, 1]);
    assert_eq!(drink(&restored, 0).age, Some(0.0));
}

#[test]
fn time_multiplier_compresses_offline_time() {
    let reg = brewery_registry();
    let rules = AgingRules {
        multiplier: 4.0,
        age_unloaded: true,
    };
    let mut b = barrel_with("oak", [unaged(ALE)]);
    b.update(0, &rules, &reg).unwrap();
    b.update(25, &rules, &reg).unwrap();
    assert_eq!(drink(&b, 0).age, Some(-100.0));
}

#[test]
fn pure_form_matches_in_place_form() {
    let reg = brewery_registry();
    let start = barrel_with(
        "oak",
        [
            unaged(ALE),
            DrinkEntry::new(ALE).with_age(40.0).into(),
            mixture(orchard_blend(), 2000.0),
        ],
    );

    let (via_value, report_a) = aged(start.clone(), 600.0, &reg).unwrap();

    let mut via_ref = start.clone();
    let report_b = via_ref.tick(600.0, &reg).unwrap();

    let mut store: SlotStore = start.slots().clone();
    let report_c = tick_contents(&mut store, "oak", 600.0, &reg).unwrap();

    assert_eq!(via_value, via_ref);
    assert_eq!(via_value.slots(), &store);
    assert_eq!(report_a, report_b);
    assert_eq!(report_b, report_c);
}

#[test]
fn structure_parts_accumulate() {
    let mut b = Barrel::default();
    let c = BlockPos::new(10, 64, 10);
    b.structure_mut().add_part(c).unwrap();
    b.structure_mut().add_part(c).unwrap();
    b.structure_mut().add_part(BlockPos::new(11, 64, 10)).unwrap();
    assert_eq!(b.structure().part_count(), 2);
}

#[test]
fn mixture_insertion_is_always_accepted() {
    let reg = brewery_registry();
    let mut b = barrel("clay");
    let m: SlotContent = MixtureEntry::new(Ingredients::new().with("gravel", 1)).into();
    b.insert(5, m, &reg).unwrap();
    assert!(b.slots().get(5).is_some());
}
