//! Read-only projections for dashboard consumers. Pure functions over a
//! snapshot's record slice; no state of their own.

use serde::Serialize;

use crate::generator::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeRange {
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationFilter {
    All,
    Only(String),
}

#[derive(Debug, Clone)]
pub struct FilterQuery {
    pub search: String,
    pub location: LocationFilter,
    /// Carried on the query surface but never consulted; the range control
    /// is cosmetic and no filtering logic reads it.
    pub time_range: TimeRange,
}

impl Default for FilterQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            location: LocationFilter::All,
            time_range: TimeRange::Day,
        }
    }
}

/// Case-insensitive substring match over merchant and location, intersected
/// with the exact-match location filter.
pub fn filter<'a>(records: &'a [Transaction], query: &FilterQuery) -> Vec<&'a Transaction> {
    let needle = query.search.to_lowercase();
    records
        .iter()
        .filter(|t| {
            let matches_search = t.merchant.to_lowercase().contains(&needle)
                || t.location.to_lowercase().contains(&needle);
            let matches_location = match &query.location {
                LocationFilter::All => true,
                LocationFilter::Only(loc) => t.location == loc,
            };
            matches_search && matches_location
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub time: String,
    pub risk: f64,
}

/// Risk scores of the most recent `points` records, oldest-first for charting.
pub fn risk_trend(records: &[Transaction], points: usize) -> Vec<TrendPoint> {
    let mut out: Vec<TrendPoint> = records
        .iter()
        .take(points)
        .map(|t| TrendPoint {
            time: t.ts.format("%H:%M:%S").to_string(),
            risk: t.risk_score,
        })
        .collect();
    out.reverse();
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationCount {
    pub location: &'static str,
    pub count: usize,
}

/// Record count per location, ordered by first appearance in the window.
pub fn location_breakdown(records: &[Transaction]) -> Vec<LocationCount> {
    let mut out: Vec<LocationCount> = Vec::new();
    for t in records {
        match out.iter_mut().find(|c| c.location == t.location) {
            Some(entry) => entry.count += 1,
            None => out.push(LocationCount { location: t.location, count: 1 }),
        }
    }
    out
}
