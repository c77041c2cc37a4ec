//! Headless batch run: seed the window, admit MAX_TICKS records without a
//! timer, print the final snapshot and projections as JSON. With RNG_SEED set
//! the run is reproducible (a fixed clock replaces the system clock so the
//! off-hours risk factor cannot drift between runs).

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

use fraudwatch::generator::{FixedClock, Generator, SystemClock};
use fraudwatch::state::{Config, TransactionWindow};
use fraudwatch::view;

fn main() -> Result<()> {
    let cfg = Config::from_env();

    let mut gen = match cfg.rng_seed {
        Some(_) => Generator::new(FixedClock::at_hour(12), &cfg),
        None => Generator::new(SystemClock, &cfg),
    };
    let mut rng = match cfg.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut window = TransactionWindow::new(cfg.window);
    for _ in 0..cfg.seed_records {
        window.admit(gen.generate(&mut rng));
    }

    let ticks = if cfg.max_ticks == 0 { 50 } else { cfg.max_ticks };
    for _ in 0..ticks {
        window.admit(gen.generate(&mut rng));
    }

    let snap = window.snapshot();
    let trend = view::risk_trend(&snap.records, cfg.trend_points);
    let breakdown = view::location_breakdown(&snap.records);

    let report = json!({
        "ticks": ticks,
        "stats": snap.stats,
        "trend": trend,
        "locations": breakdown,
        "records": snap.records,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
