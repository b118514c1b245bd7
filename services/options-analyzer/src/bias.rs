//! Seven-factor bias scoring near the money
//!
//! Each factor compares a call-side and a put-side quantity and votes
//! Bullish or Bearish (DVP may abstain). Votes are weighted and summed into a
//! per-strike score, and the per-strike scores are summed into the total that
//! drives the signal engine.

use crate::model::{
    Bias, BiasFactors, BiasRow, ContractQuote, LiquiditySpike, Moneyness, StrikeRow, Verdict,
};
use serde::{Deserialize, Serialize};

/// Half-width of the scoring window around the ATM strike
pub const SCORING_WINDOW: f64 = 100.0;

/// Weight of the change-in-OI factor; every other factor weighs 1
pub const CHG_OI_WEIGHT: i32 = 2;
pub const DEFAULT_WEIGHT: i32 = 1;

/// Change in OI must exceed this multiple of standing OI to count as a spike
pub const SPIKE_OI_MULTIPLE: f64 = 1.5;
/// ...and volume must exceed this
pub const SPIKE_MIN_VOLUME: u64 = 1500;

/// Delta / volume / price vote. Rising call premium relative to put on
/// heavier call volume reads Bullish, falling premium reads Bearish; the OI
/// change must be non-zero either way.
pub fn delta_volume_bias(price_delta: f64, volume_delta: i64, oi_change_delta: f64) -> Bias {
    let oi_moved = oi_change_delta > 0.0 || oi_change_delta < 0.0;
    if volume_delta > 0 && oi_moved {
        if price_delta > 0.0 {
            return Bias::Bullish;
        }
        if price_delta < 0.0 {
            return Bias::Bearish;
        }
    }
    Bias::Neutral
}

fn vote(bullish: bool) -> Bias {
    if bullish { Bias::Bullish } else { Bias::Bearish }
}

/// Evaluate the seven factors for one strike
pub fn evaluate_factors(row: &StrikeRow) -> BiasFactors {
    let (call, put) = (&row.call, &row.put);

    let gamma_bullish = match (call.gamma(), put.gamma()) {
        (Some(cg), Some(pg)) => cg < pg,
        _ => false,
    };

    BiasFactors {
        chg_oi: vote(call.change_in_oi < put.change_in_oi),
        volume: vote(call.volume < put.volume),
        gamma: vote(gamma_bullish),
        ask_qty: vote(put.ask_qty > call.ask_qty),
        // Inverted relative to ask_qty: heavier put bids read Bearish
        bid_qty: vote(put.bid_qty <= call.bid_qty),
        iv: vote(call.implied_volatility > put.implied_volatility),
        dvp: delta_volume_bias(
            call.last_price - put.last_price,
            call.volume as i64 - put.volume as i64,
            call.change_in_oi - put.change_in_oi,
        ),
    }
}

/// Weighted sum of the factor votes
pub fn bias_score(factors: &BiasFactors) -> i32 {
    factors.chg_oi.contribution(CHG_OI_WEIGHT)
        + factors.volume.contribution(DEFAULT_WEIGHT)
        + factors.gamma.contribution(DEFAULT_WEIGHT)
        + factors.ask_qty.contribution(DEFAULT_WEIGHT)
        + factors.bid_qty.contribution(DEFAULT_WEIGHT)
        + factors.iv.contribution(DEFAULT_WEIGHT)
        + factors.dvp.contribution(DEFAULT_WEIGHT)
}

/// Map a per-strike or aggregate score to a verdict
pub fn verdict_for(score: i32) -> Verdict {
    if score >= 4 {
        Verdict::StrongBullish
    } else if score >= 2 {
        Verdict::Bullish
    } else if score <= -4 {
        Verdict::StrongBearish
    } else if score <= -2 {
        Verdict::Bearish
    } else {
        Verdict::Neutral
    }
}

pub fn score_row(row: &StrikeRow) -> BiasRow {
    let factors = evaluate_factors(row);
    let score = bias_score(&factors);
    BiasRow {
        strike: row.strike,
        moneyness: row.moneyness,
        level: row.level,
        factors,
        score,
        verdict: verdict_for(score),
    }
}

/// Flag strikes where either side built OI well beyond its standing OI on real volume
pub fn detect_liquidity_spike(row: &StrikeRow) -> Option<LiquiditySpike> {
    let spiked = |q: &ContractQuote| {
        q.change_in_oi > SPIKE_OI_MULTIPLE * q.open_interest && q.volume > SPIKE_MIN_VOLUME
    };

    (spiked(&row.call) || spiked(&row.put)).then(|| LiquiditySpike {
        strike: row.strike,
        call_change_in_oi: row.call.change_in_oi,
        put_change_in_oi: row.put.change_in_oi,
        call_volume: row.call.volume,
        put_volume: row.put.volume,
    })
}

/// Scores for every strike in the scoring window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasSummary {
    pub rows: Vec<BiasRow>,
    pub total_score: i32,
    pub market_view: Verdict,
    pub spikes: Vec<LiquiditySpike>,
}

impl BiasSummary {
    pub fn atm_row(&self) -> Option<&BiasRow> {
        self.rows.iter().find(|r| r.moneyness == Moneyness::Atm)
    }
}

/// Score rows within [`SCORING_WINDOW`] of the ATM strike, preserving order
pub fn score_window(rows: &[StrikeRow], atm_strike: f64) -> BiasSummary {
    let mut scored = Vec::new();
    let mut spikes = Vec::new();

    for row in rows.iter().filter(|r| (r.strike - atm_strike).abs() <= SCORING_WINDOW) {
        scored.push(score_row(row));
        if let Some(spike) = detect_liquidity_spike(row) {
            spikes.push(spike);
        }
    }

    let total_score = scored.iter().map(|r| r.score).sum();
    let market_view = scored
        .iter()
        .find(|r| r.moneyness == Moneyness::Atm)
        .map_or(Verdict::Neutral, |r| r.verdict);

    BiasSummary {
        rows: scored,
        total_score,
        market_view,
        spikes,
    }
}
