use serde::Serialize;

use crate::generator::Transaction;

#[derive(Clone)]
pub struct Config {
    pub tick_ms: u64,
    pub window: usize,
    pub seed_records: usize,
    pub trend_points: usize,
    pub anomaly_threshold: f64,
    pub whale_odds: f64,
    pub amount_cap: f64,
    pub whale_cap: f64,
    pub max_ticks: u64,
    pub rng_seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            tick_ms: std::env::var("TICK_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(3000),
            window: std::env::var("WINDOW").ok().and_then(|v| v.parse().ok()).unwrap_or(50),
            seed_records: std::env::var("SEED_RECORDS").ok().and_then(|v| v.parse().ok()).unwrap_or(10),
            trend_points: std::env::var("TREND_POINTS").ok().and_then(|v| v.parse().ok()).unwrap_or(20),
            anomaly_threshold: std::env::var("ANOMALY_TH").ok().and_then(|v| v.parse().ok()).unwrap_or(70.0),
            whale_odds: std::env::var("WHALE_ODDS").ok().and_then(|v| v.parse().ok()).unwrap_or(0.1),
            amount_cap: std::env::var("AMOUNT_CAP").ok().and_then(|v| v.parse().ok()).unwrap_or(1000.0),
            whale_cap: std::env::var("WHALE_CAP").ok().and_then(|v| v.parse().ok()).unwrap_or(10_000.0),
            max_ticks: std::env::var("MAX_TICKS").ok().and_then(|v| v.parse().ok()).unwrap_or(0),
            rng_seed: std::env::var("RNG_SEED").ok().and_then(|v| v.parse().ok()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_ms: 3000,
            window: 50,
            seed_records: 10,
            trend_points: 20,
            anomaly_threshold: 70.0,
            whale_odds: 0.1,
            amount_cap: 1000.0,
            whale_cap: 10_000.0,
            max_ticks: 0,
            rng_seed: None,
        }
    }
}

/// Aggregate statistics over the current window. Always recomputed wholesale
/// from the record sequence, never patched incrementally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub flagged: usize,
    pub total_amount: f64,
    pub avg_risk: f64,
}

pub fn compute_stats(records: &[Transaction]) -> Stats {
    let total = records.len();
    let flagged = records.iter().filter(|t| t.is_anomaly).count();
    let total_amount = records.iter().map(|t| t.amount).sum();
    let avg_risk = if total > 0 {
        records.iter().map(|t| t.risk_score).sum::<f64>() / total as f64
    } else {
        0.0
    };
    Stats { total, flagged, total_amount, avg_risk }
}

/// Consistent point-in-time view: the records and the stats derived from
/// exactly those records.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub records: Vec<Transaction>,
    pub stats: Stats,
}

/// Bounded most-recent-first record window with derived statistics.
///
/// `admit` is the single mutation: prepend, truncate to capacity, recompute.
/// Callers that share the window across tasks wrap it in a mutex and take
/// snapshots under the same lock, so readers never pair records with stale
/// stats.
pub struct TransactionWindow {
    cap: usize,
    records: Vec<Transaction>,
    stats: Stats,
}

impl TransactionWindow {
    pub fn new(cap: usize) -> Self {
        Self { cap, records: Vec::with_capacity(cap), stats: Stats::default() }
    }

    pub fn admit(&mut self, txn: Transaction) {
        self.records.insert(0, txn);
        self.records.truncate(self.cap);
        self.stats = compute_stats(&self.records);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn records(&self) -> &[Transaction] {
        &self.records
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot { records: self.records.clone(), stats: self.stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::DeviceType;
    use chrono::Utc;

    fn txn(id: u64, amount: f64, risk: f64) -> Transaction {
        Transaction {
            id,
            ts: Utc::now(),
            amount,
            location: "London",
            merchant: "Amazon",
            device: DeviceType::Desktop,
            risk_score: risk,
            is_anomaly: risk > 70.0,
            ip: [10, 0, 0, 1],
            velocity: 3,
            user_agent: DeviceType::Desktop.user_agent(),
        }
    }

    #[test]
    fn test_admit_prepends() {
        let mut w = TransactionWindow::new(50);
        w.admit(txn(1, 10.0, 5.0));
        w.admit(txn(2, 20.0, 5.0));
        w.admit(txn(3, 30.0, 5.0));
        let ids: Vec<_> = w.records().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 2, 1], "window must be most-recent-first");
    }

    #[test]
    fn test_admit_truncates_to_capacity() {
        let mut w = TransactionWindow::new(50);
        for i in 0..120 {
            w.admit(txn(i, 1.0, 1.0));
        }
        assert_eq!(w.len(), 50);
        // Survivors are exactly the most recent 50
        assert_eq!(w.records()[0].id, 119);
        assert_eq!(w.records()[49].id, 70);
    }

    #[test]
    fn test_stats_track_window() {
        let mut w = TransactionWindow::new(50);
        w.admit(txn(1, 100.0, 80.0));
        w.admit(txn(2, 50.0, 20.0));
        let s = w.stats();
        assert_eq!(s.total, 2);
        assert_eq!(s.flagged, 1);
        assert!((s.total_amount - 150.0).abs() < 1e-9);
        assert!((s.avg_risk - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_stats_recomputed_after_eviction() {
        let mut w = TransactionWindow::new(2);
        w.admit(txn(1, 100.0, 90.0));
        w.admit(txn(2, 10.0, 10.0));
        w.admit(txn(3, 10.0, 10.0));
        // txn 1 evicted; its anomaly and amount must be gone from stats
        let s = w.stats();
        assert_eq!(s.total, 2);
        assert_eq!(s.flagged, 0);
        assert!((s.total_amount - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_window_avg_risk_zero() {
        let s = compute_stats(&[]);
        assert_eq!(s.total, 0);
        assert_eq!(s.avg_risk, 0.0);
    }

    #[test]
    fn test_stats_equal_pure_recompute() {
        let mut w = TransactionWindow::new(5);
        for i in 0..9 {
            w.admit(txn(i, i as f64 * 7.0, (i % 10) as f64 * 9.0));
            assert_eq!(w.stats(), compute_stats(w.records()));
        }
    }

    #[test]
    fn test_config_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.tick_ms, 3000);
        assert_eq!(cfg.window, 50);
        assert_eq!(cfg.seed_records, 10);
        assert_eq!(cfg.trend_points, 20);
        assert_eq!(cfg.anomaly_threshold, 70.0);
    }
}
