//! Synthetic transaction generation.
//!
//! One record per call, pure over the supplied rng and the injected clock.
//! Risk is a hand-tuned additive score over categorical and amount factors
//! plus uniform jitter, clamped to 100.

use chrono::{DateTime, TimeZone, Timelike, Utc};
use rand::Rng;
use serde::Serialize;

use crate::state::Config;

pub const UNKNOWN_MERCHANT: &str = "Unknown Merchant";
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

pub const MERCHANTS: [&str; 7] = [
    "Amazon",
    "Walmart",
    "Best Buy",
    "Apple Store",
    "Target",
    "Gas Station",
    UNKNOWN_MERCHANT,
];

pub const LOCATIONS: [&str; 6] = [
    "New York",
    "London",
    "Tokyo",
    "Sydney",
    "Paris",
    UNKNOWN_LOCATION,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Mobile,
    Desktop,
    Tablet,
    Unknown,
}

impl DeviceType {
    pub const ALL: [DeviceType; 4] = [
        DeviceType::Mobile,
        DeviceType::Desktop,
        DeviceType::Tablet,
        DeviceType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "Mobile",
            DeviceType::Desktop => "Desktop",
            DeviceType::Tablet => "Tablet",
            DeviceType::Unknown => "Unknown Device",
        }
    }

    pub fn user_agent(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "Mobile Safari",
            _ => "Chrome Desktop",
        }
    }
}

/// Wall-clock access behind a seam so tests can pin the hour.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed-instant clock for deterministic runs and tests.
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn at_hour(hour: u32) -> Self {
        let ts = Utc
            .with_ymd_and_hms(2025, 6, 1, hour, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        FixedClock(ts)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: u64,
    pub ts: DateTime<Utc>,
    pub amount: f64,
    pub location: &'static str,
    pub merchant: &'static str,
    pub device: DeviceType,
    pub risk_score: f64,
    pub is_anomaly: bool,
    pub ip: [u8; 4],
    pub velocity: u8,
    pub user_agent: &'static str,
}

impl Transaction {
    pub fn ip_string(&self) -> String {
        format!("{}.{}.{}.{}", self.ip[0], self.ip[1], self.ip[2], self.ip[3])
    }
}

/// Un-jittered, un-clamped additive risk base. Kept separate from `generate`
/// so threshold arithmetic stays checkable without an rng.
pub fn risk_base(
    amount: f64,
    location: &str,
    merchant: &str,
    device: DeviceType,
    hour: u32,
) -> f64 {
    let amount_risk = if amount > 5000.0 {
        40.0
    } else if amount > 1000.0 {
        20.0
    } else {
        0.0
    };
    let location_risk = if location == UNKNOWN_LOCATION { 30.0 } else { 0.0 };
    let merchant_risk = if merchant == UNKNOWN_MERCHANT { 25.0 } else { 0.0 };
    let device_risk = if device == DeviceType::Unknown { 20.0 } else { 0.0 };
    let time_risk = if hour < 4 { 15.0 } else { 0.0 };
    amount_risk + location_risk + merchant_risk + device_risk + time_risk
}

pub struct Generator {
    clock: Box<dyn Clock + Send>,
    next_id: u64,
    whale_odds: f64,
    amount_cap: f64,
    whale_cap: f64,
    anomaly_threshold: f64,
}

impl Generator {
    pub fn new(clock: impl Clock + Send + 'static, cfg: &Config) -> Self {
        let next_id = clock.now().timestamp_millis() as u64;
        Self {
            clock: Box::new(clock),
            next_id,
            whale_odds: cfg.whale_odds,
            amount_cap: cfg.amount_cap,
            whale_cap: cfg.whale_cap,
            anomaly_threshold: cfg.anomaly_threshold,
        }
    }

    /// Produce one record. Infallible; consumes randomness and the clock only.
    pub fn generate<R: Rng>(&mut self, rng: &mut R) -> Transaction {
        let now = self.clock.now();
        let id = self.next_id;
        self.next_id += 1;

        let cap = if rng.gen::<f64>() < self.whale_odds {
            self.whale_cap
        } else {
            self.amount_cap
        };
        let amount = rng.gen::<f64>() * cap;

        let location = LOCATIONS[rng.gen_range(0..LOCATIONS.len())];
        let merchant = MERCHANTS[rng.gen_range(0..MERCHANTS.len())];
        let device = DeviceType::ALL[rng.gen_range(0..DeviceType::ALL.len())];

        let jitter = rng.gen::<f64>() * 10.0;
        let risk_score =
            (risk_base(amount, location, merchant, device, now.hour()) + jitter).min(100.0);

        Transaction {
            id,
            ts: now,
            amount,
            location,
            merchant,
            device,
            risk_score,
            is_anomaly: risk_score > self.anomaly_threshold,
            ip: rng.gen(),
            velocity: rng.gen_range(0..10),
            user_agent: device.user_agent(),
        }
    }
}
