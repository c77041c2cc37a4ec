//! Session scheduling: seed the window, then admit one fresh record per tick
//! until teardown.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::generator::Generator;
use crate::logging::{log_admit, log_seeded, log_teardown};
use crate::state::{Config, Snapshot, Stats, TransactionWindow};

fn lock(window: &Mutex<TransactionWindow>) -> MutexGuard<'_, TransactionWindow> {
    window.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A running simulation session. Owns the record window, the tick task and
/// the teardown guard. Two states: constructed via `start` (running) and
/// stopped. `stop` is idempotent; `Drop` stops as well.
pub struct Session {
    window: Arc<Mutex<TransactionWindow>>,
    active: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl Session {
    /// Synchronously seed `cfg.seed_records` records, then spawn the periodic
    /// tick task. Stats reflect the seed before this returns.
    pub fn start(cfg: &Config, mut gen: Generator) -> Self {
        let window = Arc::new(Mutex::new(TransactionWindow::new(cfg.window)));
        let mut rng = match cfg.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        {
            let mut w = lock(&window);
            for _ in 0..cfg.seed_records {
                w.admit(gen.generate(&mut rng));
            }
            log_seeded(cfg.seed_records, &w.stats());
        }

        let active = Arc::new(AtomicBool::new(true));
        let ticks = Arc::new(AtomicU64::new(0));
        let handle = {
            let window = Arc::clone(&window);
            let active = Arc::clone(&active);
            let ticks = Arc::clone(&ticks);
            let tick_ms = cfg.tick_ms;
            tokio::spawn(async move {
                let mut ticker = interval(Duration::from_millis(tick_ms));
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // an interval's first fire is immediate; the seed covers it
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    // a firing that raced stop() must not mutate
                    if !active.load(Ordering::SeqCst) {
                        break;
                    }
                    let txn = gen.generate(&mut rng);
                    log_admit(txn.id, txn.merchant, txn.amount, txn.risk_score, txn.is_anomaly);
                    lock(&window).admit(txn);
                    ticks.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        Self { window, active, ticks, handle: Some(handle) }
    }

    /// Consistent (records, stats) pair taken under one lock.
    pub fn snapshot(&self) -> Snapshot {
        lock(&self.window).snapshot()
    }

    pub fn stats(&self) -> Stats {
        lock(&self.window).stats()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Cancel the periodic tick exactly once. Later calls are no-ops.
    pub fn stop(&mut self) {
        if self.active.swap(false, Ordering::SeqCst) {
            if let Some(handle) = self.handle.take() {
                handle.abort();
            }
            log_teardown();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::FixedClock;
    use tokio::time::sleep;

    fn test_config() -> Config {
        Config { rng_seed: Some(99), ..Config::default() }
    }

    fn test_session(cfg: &Config) -> Session {
        let gen = Generator::new(FixedClock::at_hour(12), cfg);
        Session::start(cfg, gen)
    }

    #[tokio::test(start_paused = true)]
    async fn test_seed_visible_before_first_tick() {
        let cfg = test_config();
        let session = test_session(&cfg);
        let snap = session.snapshot();
        assert_eq!(snap.records.len(), 10);
        assert_eq!(snap.stats.total, 10, "stats must reflect the seed immediately");
        assert_eq!(session.ticks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_admits_one_record() {
        let cfg = test_config();
        let session = test_session(&cfg);
        sleep(Duration::from_millis(3010)).await;
        assert_eq!(session.snapshot().stats.total, 11);
        sleep(Duration::from_millis(3010)).await;
        assert_eq!(session.snapshot().stats.total, 12);
        assert_eq!(session.ticks(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_saturates_at_capacity() {
        let cfg = test_config();
        let session = test_session(&cfg);
        for _ in 0..45 {
            sleep(Duration::from_millis(3010)).await;
        }
        // min(10 + 45, 50)
        assert_eq!(session.snapshot().stats.total, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_admits() {
        let cfg = test_config();
        let mut session = test_session(&cfg);
        sleep(Duration::from_millis(3010)).await;
        session.stop();
        let before = session.snapshot().stats.total;
        sleep(Duration::from_millis(30_000)).await;
        assert_eq!(session.snapshot().stats.total, before, "no admits after teardown");
        assert!(!session.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let cfg = test_config();
        let mut session = test_session(&cfg);
        session.stop();
        session.stop();
        session.stop();
        assert!(!session.is_running());
        assert_eq!(session.snapshot().stats.total, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_internally_consistent() {
        let cfg = test_config();
        let session = test_session(&cfg);
        for _ in 0..7 {
            sleep(Duration::from_millis(3010)).await;
            let snap = session.snapshot();
            assert_eq!(snap.stats, crate::state::compute_stats(&snap.records));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_recency_ordering_by_id() {
        let cfg = test_config();
        let session = test_session(&cfg);
        for _ in 0..5 {
            sleep(Duration::from_millis(3010)).await;
        }
        let snap = session.snapshot();
        for pair in snap.records.windows(2) {
            assert!(pair[0].id > pair[1].id, "window must stay most-recent-first");
        }
    }
}
