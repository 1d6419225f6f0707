//! Barrel demo: age an ale and resolve a mixture over a few world updates.
//!
//! Run with: `RUST_LOG=cellar=debug cargo run -p cellar-core --example barrel_demo`

use cellar_core::barrel::AgingRules;
use cellar_core::slot::SlotContent;
use cellar_core::test_utils::*;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let registry = brewery_registry();
    let rules = AgingRules {
        multiplier: 20.0,
        age_unloaded: true,
    };

    let mut barrel = barrel_with("oak", [unaged(ALE), mixture(orchard_blend(), 0.0)]);
    println!("{}", barrel.structure().display_key());

    for now in (0..=200).step_by(20) {
        match barrel.update(now, &rules, &registry) {
            Ok(None) => println!("t={now:>3}  first update, clock started"),
            Ok(Some(report)) => println!(
                "t={now:>3}  aged={:?} resolved={:?} failed={:?}",
                report.aged, report.resolved, report.failed
            ),
            Err(e) => {
                eprintln!("update failed: {e}");
                return;
            }
        }
    }

    for (index, content) in barrel.slots().occupied() {
        match content {
            SlotContent::Drink(d) => println!(
                "slot {index}: {} age={:?} quality={:?}",
                d.type_id, d.age, d.quality
            ),
            other => println!("slot {index}: {other:?}"),
        }
    }

    let bytes = match barrel.serialize() {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("serialize failed: {e}");
            return;
        }
    };
    println!("snapshot: {} bytes", bytes.len());
}
