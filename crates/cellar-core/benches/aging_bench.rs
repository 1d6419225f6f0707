//! Criterion benchmarks for the aging engine.
//!
//! - `full_barrel`: one tick over 27 mixed slots.
//! - `cellar_update`: 500 barrels updated sequentially (and with rayon when
//!   the `parallel` feature is on).
//! - `serialization`: bitcode and JSON encode/decode of a full barrel.

use cellar_core::barrel::{AgingRules, Barrel};
use cellar_core::cellar::Cellar;
use cellar_core::slot::{BARREL_SLOTS, DrinkEntry, SlotContent};
use cellar_core::test_utils::*;
use criterion::{Criterion, criterion_group, criterion_main};

// ===========================================================================
// Builders
// ===========================================================================

fn full_barrel() -> Barrel {
    let contents = (0..BARREL_SLOTS).map(|i| -> SlotContent {
        match i % 3 {
            0 => DrinkEntry::new(ALE).with_age(i as f64).into(),
            1 => unaged(CIDER),
            _ => mixture(orchard_blend(), 0.0),
        }
    });
    barrel_with("oak", contents)
}

fn build_cellar(count: usize) -> Cellar {
    let mut cellar = Cellar::new();
    for _ in 0..count {
        cellar.insert(full_barrel());
    }
    cellar
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_full_barrel(c: &mut Criterion) {
    let reg = brewery_registry();
    c.bench_function("full_barrel_tick", |b| {
        b.iter_batched(
            full_barrel,
            |mut barrel| barrel.tick(20.0, &reg).unwrap(),
            criterion::BatchSize::SmallInput,
        );
    });
}

fn bench_cellar_update(c: &mut Criterion) {
    let reg = brewery_registry();
    let rules = AgingRules::default();
    let mut group = c.benchmark_group("cellar_update");

    group.bench_function("sequential_500", |b| {
        let mut cellar = build_cellar(500);
        let mut now = 0;
        b.iter(|| {
            now += 20;
            cellar.update_all(now, &rules, &reg)
        });
    });

    #[cfg(feature = "parallel")]
    group.bench_function("parallel_500", |b| {
        let mut cellar = build_cellar(500);
        let mut now = 0;
        b.iter(|| {
            now += 20;
            cellar.update_all_parallel(now, &rules, &reg)
        });
    });

    group.finish();
}

fn bench_serialization(c: &mut Criterion) {
    let barrel = full_barrel();
    let mut group = c.benchmark_group("serialization");

    group.bench_function("bitcode_encode", |b| b.iter(|| barrel.serialize().unwrap()));
    let bytes = barrel.serialize().unwrap();
    group.bench_function("bitcode_decode", |b| {
        b.iter(|| Barrel::deserialize(&bytes).unwrap())
    });

    group.bench_function("json_encode", |b| b.iter(|| barrel.to_json().unwrap()));
    let json = barrel.to_json().unwrap();
    group.bench_function("json_decode", |b| b.iter(|| Barrel::from_json(&json).unwrap()));

    group.finish();
}

criterion_group!(
    benches,
    bench_full_barrel,
    bench_cellar_update,
    bench_serialization
);
criterion_main!(benches);
