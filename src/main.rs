use anyhow::Result;
use tokio::time::{sleep, Duration};

use fraudwatch::generator::{Generator, SystemClock};
use fraudwatch::logging::{log, log_session_summary, log_snapshot, obj, Domain, Level};
use fraudwatch::session::Session;
use fraudwatch::state::Config;
use fraudwatch::view;
use serde_json::json;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let gen = Generator::new(SystemClock, &cfg);

    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("tick_ms", json!(cfg.tick_ms)),
            ("window", json!(cfg.window)),
            ("seed_records", json!(cfg.seed_records)),
        ]),
    );

    let mut session = Session::start(&cfg, gen);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = sleep(Duration::from_millis(cfg.tick_ms)) => {
                let snap = session.snapshot();
                log_snapshot(&snap.stats);
                let breakdown = view::location_breakdown(&snap.records);
                log(
                    Level::Debug,
                    Domain::View,
                    "locations",
                    obj(&[("breakdown", serde_json::to_value(&breakdown)?)]),
                );
            }
        }
    }

    session.stop();
    log_session_summary(session.ticks(), &session.stats());
    Ok(())
}
