//! Structured logging: JSON lines on stdout with level and domain gating.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::state::Stats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("trace") => Level::Trace,
            Ok("debug") => Level::Debug,
            Ok("info") => Level::Info,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Generator, // record synthesis
    Window,    // admits, evictions, stats
    Session,   // seeding, ticks, teardown
    View,      // filter/trend/breakdown queries
    System,    // startup, shutdown
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Generator => "generator",
            Domain::Window => "window",
            Domain::Session => "session",
            Domain::View => "view",
            Domain::System => "system",
        }
    }

    pub fn is_enabled(&self) -> bool {
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Emit one structured log line if the level and domain are enabled.
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    let min_level = Level::from_env();
    if level < min_level || !domain.is_enabled() {
        return;
    }

    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("domain".to_string(), json!(domain.as_str()));
    entry.insert("event".to_string(), json!(event));
    entry.insert("data".to_string(), Value::Object(fields));
    println!("{}", Value::Object(entry));
}

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

pub fn log_seeded(count: usize, stats: &Stats) {
    log(
        Level::Info,
        Domain::Session,
        "seeded",
        obj(&[
            ("count", json!(count)),
            ("total", json!(stats.total)),
            ("avg_risk", v_num(stats.avg_risk)),
        ]),
    );
}

pub fn log_admit(id: u64, merchant: &str, amount: f64, risk: f64, anomaly: bool) {
    log(
        Level::Debug,
        Domain::Window,
        "admit",
        obj(&[
            ("id", json!(id)),
            ("merchant", v_str(merchant)),
            ("amount", v_num(amount)),
            ("risk", v_num(risk)),
            ("anomaly", json!(anomaly)),
        ]),
    );
}

pub fn log_snapshot(stats: &Stats) {
    log(
        Level::Info,
        Domain::Window,
        "snapshot",
        obj(&[
            ("total", json!(stats.total)),
            ("flagged", json!(stats.flagged)),
            ("total_amount", v_num(stats.total_amount)),
            ("avg_risk", v_num(stats.avg_risk)),
        ]),
    );
}

pub fn log_teardown() {
    log(Level::Info, Domain::Session, "teardown", Map::new());
}

pub fn log_session_summary(ticks: u64, stats: &Stats) {
    log(
        Level::Info,
        Domain::System,
        "session_summary",
        obj(&[
            ("ticks", json!(ticks)),
            ("total", json!(stats.total)),
            ("flagged", json!(stats.flagged)),
            ("total_amount", v_num(stats.total_amount)),
            ("avg_risk", v_num(stats.avg_risk)),
        ]),
    );
}
