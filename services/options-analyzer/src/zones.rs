//! Nearest support and resistance bands around spot

use crate::model::{Level, PriceZone, StrikeRow};

/// How many qualifying strikes form a band
const STRIKES_PER_ZONE: usize = 2;

fn zone_from(strikes: &[f64]) -> Option<PriceZone> {
    let low = strikes.iter().copied().reduce(f64::min)?;
    let high = strikes.iter().copied().reduce(f64::max)?;
    Some(PriceZone { low, high })
}

/// Support band from the two highest support strikes at or below spot
pub fn support_zone(rows: &[StrikeRow], spot: f64) -> Option<PriceZone> {
    let mut strikes: Vec<f64> = rows
        .iter()
        .filter(|r| r.level == Level::Support && r.strike <= spot)
        .map(|r| r.strike)
        .collect();
    strikes.sort_by(|a, b| b.total_cmp(a));
    strikes.truncate(STRIKES_PER_ZONE);
    zone_from(&strikes)
}

/// Resistance band from the two lowest resistance strikes at or above spot
pub fn resistance_zone(rows: &[StrikeRow], spot: f64) -> Option<PriceZone> {
    let mut strikes: Vec<f64> = rows
        .iter()
        .filter(|r| r.level == Level::Resistance && r.strike >= spot)
        .map(|r| r.strike)
        .collect();
    strikes.sort_by(f64::total_cmp);
    strikes.truncate(STRIKES_PER_ZONE);
    zone_from(&strikes)
}

/// (support, resistance)
pub fn support_resistance_zones(rows: &[StrikeRow], spot: f64) -> (Option<PriceZone>, Option<PriceZone>) {
    (support_zone(rows, spot), resistance_zone(rows, spot))
}

/// Support reads top-down ("high to low"), `N/A` when absent
pub fn format_support(zone: Option<PriceZone>) -> String {
    zone.map_or_else(|| "N/A".to_string(), |z| format!("{} to {}", z.high, z.low))
}

/// Resistance reads bottom-up ("low to high"), `N/A` when absent
pub fn format_resistance(zone: Option<PriceZone>) -> String {
    zone.map_or_else(|| "N/A".to_string(), |z| format!("{} to {}", z.low, z.high))
}
