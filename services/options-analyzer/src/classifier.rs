//! Strike pairing, moneyness tagging and support/resistance levels

use crate::model::{ContractQuote, Level, Moneyness, StrikeRow};
use rustc_hash::FxHashMap;

/// OI imbalance needed before a strike counts as support or resistance
pub const LEVEL_OI_RATIO: f64 = 1.12;

/// Half-width of the strike table around the ATM strike
pub const TABLE_WINDOW: f64 = 200.0;

/// Support when puts outweigh calls by more than [`LEVEL_OI_RATIO`],
/// resistance for the mirror case
pub fn classify_level(oi_call: f64, oi_put: f64) -> Level {
    if oi_put > LEVEL_OI_RATIO * oi_call {
        Level::Support
    } else if oi_call > LEVEL_OI_RATIO * oi_put {
        Level::Resistance
    } else {
        Level::Neutral
    }
}

/// Strike closest to spot; the lower strike wins an exact tie
pub fn find_atm_strike(strikes: &[f64], spot: f64) -> Option<f64> {
    strikes.iter().copied().fold(None, |best, strike| match best {
        Some(b) if (b - spot).abs() <= (strike - spot).abs() => Some(b),
        _ => Some(strike),
    })
}

/// ATM for the nearest strike, otherwise ITM below spot and OTM above it.
/// The rule is call-centric and applied to the whole row.
pub fn classify_moneyness(strike: f64, atm_strike: f64, spot: f64) -> Moneyness {
    if strike == atm_strike {
        Moneyness::Atm
    } else if strike < spot {
        Moneyness::Itm
    } else {
        Moneyness::Otm
    }
}

/// Fixed-point strike key (2 decimals) for fast lookups
fn strike_key(strike: f64) -> i64 {
    (strike * 100.0).round() as i64
}

/// Join calls and puts on strike. Strikes missing either side are dropped;
/// the result is sorted by ascending strike.
pub fn pair_quotes(calls: Vec<ContractQuote>, puts: Vec<ContractQuote>) -> Vec<(ContractQuote, ContractQuote)> {
    let mut put_by_strike: FxHashMap<i64, ContractQuote> = FxHashMap::default();
    for put in puts {
        put_by_strike.insert(strike_key(put.strike), put);
    }

    let mut pairs: Vec<(ContractQuote, ContractQuote)> = calls
        .into_iter()
        .filter_map(|call| {
            put_by_strike
                .remove(&strike_key(call.strike))
                .map(|put| (call, put))
        })
        .collect();

    pairs.sort_by(|a, b| a.0.strike.total_cmp(&b.0.strike));
    pairs
}

/// Pair, window and classify a snapshot. Returns the ATM strike and the
/// rows within [`TABLE_WINDOW`] of it, or `None` if nothing pairs up.
pub fn build_strike_rows(
    calls: Vec<ContractQuote>,
    puts: Vec<ContractQuote>,
    spot: f64,
) -> Option<(f64, Vec<StrikeRow>)> {
    let pairs = pair_quotes(calls, puts);
    let strikes: Vec<f64> = pairs.iter().map(|(call, _)| call.strike).collect();
    let atm_strike = find_atm_strike(&strikes, spot)?;

    let rows = pairs
        .into_iter()
        .filter(|(call, _)| (call.strike - atm_strike).abs() <= TABLE_WINDOW)
        .map(|(call, put)| StrikeRow {
            strike: call.strike,
            moneyness: classify_moneyness(call.strike, atm_strike, spot),
            level: classify_level(call.open_interest, put.open_interest),
            call,
            put,
        })
        .collect();

    Some((atm_strike, rows))
}
