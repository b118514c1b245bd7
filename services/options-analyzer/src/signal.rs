//! Signal decision engine
//!
//! Runs once per cycle over the scored strikes in ascending order and stops
//! at the first strike whose level, spot location, total score and market
//! view all agree. Nothing carries over between cycles.

use crate::bias::BiasSummary;
use crate::model::{BiasRow, Level, OptionSide, StrikeRow, TradeSignal};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Spot may sit this far below a support strike...
pub const SUPPORT_BELOW: f64 = 10.0;
/// ...or this far above it
pub const SUPPORT_ABOVE: f64 = 20.0;
/// Spot may sit this far below a resistance strike...
pub const RESISTANCE_BELOW: f64 = 20.0;
/// ...or this far above it
pub const RESISTANCE_ABOVE: f64 = 10.0;

/// Total score needed for a call entry (negated for a put entry)
pub const SIGNAL_SCORE_THRESHOLD: i32 = 4;

pub const STOP_LOSS_FRACTION: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalState {
    Idle,
    Evaluating,
    Signaled,
    NoSignal,
}

/// Outcome of one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SignalDecision {
    Signaled(TradeSignal),
    /// Carries the ATM row, when one was scored, for the informational notice
    NoSignal { atm_row: Option<BiasRow> },
}

impl SignalDecision {
    pub fn signal(&self) -> Option<&TradeSignal> {
        match self {
            SignalDecision::Signaled(signal) => Some(signal),
            SignalDecision::NoSignal { .. } => None,
        }
    }
}

/// Whether spot is close enough to a strike for its level to matter.
/// The windows are deliberately asymmetric.
pub fn in_proximity_window(spot: f64, strike: f64, level: Level) -> bool {
    match level {
        Level::Support => strike - SUPPORT_BELOW <= spot && spot <= strike + SUPPORT_ABOVE,
        Level::Resistance => strike - RESISTANCE_BELOW <= spot && spot <= strike + RESISTANCE_ABOVE,
        Level::Neutral => false,
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Build the proposal for `side` at `row`: target scales the premium by IV,
/// stop gives back a fifth of it
pub fn propose_trade(row: &StrikeRow, side: OptionSide, level: Level, bias: &BiasRow) -> TradeSignal {
    let quote = row.quote(side);
    let entry = quote.last_price;

    TradeSignal {
        side,
        strike: row.strike,
        level,
        entry,
        target: round2(entry * (1.0 + quote.implied_volatility / 100.0)),
        stop_loss: round2(entry * STOP_LOSS_FRACTION),
        rationale: format!("{} Entry (Bias Based at {})", side.label(), level),
        factors: bias.factors,
    }
}

#[derive(Debug)]
pub struct SignalEngine {
    state: SignalState,
}

impl Default for SignalEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalEngine {
    pub fn new() -> Self {
        Self { state: SignalState::Idle }
    }

    pub fn state(&self) -> SignalState {
        self.state
    }

    /// Evaluate one cycle. `rows` must contain every strike in `summary`.
    pub fn evaluate(&mut self, summary: &BiasSummary, rows: &[StrikeRow], spot: f64) -> SignalDecision {
        self.state = SignalState::Evaluating;

        for bias in &summary.rows {
            if !in_proximity_window(spot, bias.strike, bias.level) {
                continue;
            }

            let side = match bias.level {
                Level::Support
                    if summary.total_score >= SIGNAL_SCORE_THRESHOLD && summary.market_view.is_bullish() =>
                {
                    OptionSide::Call
                }
                Level::Resistance
                    if summary.total_score <= -SIGNAL_SCORE_THRESHOLD && summary.market_view.is_bearish() =>
                {
                    OptionSide::Put
                }
                _ => continue,
            };

            let Some(row) = rows.iter().find(|r| r.strike == bias.strike) else {
                debug!("No quotes for scored strike {}, skipping", bias.strike);
                continue;
            };

            let signal = propose_trade(row, side, bias.level, bias);
            debug!("Signal at {}: {}", bias.strike, signal.rationale);
            self.state = SignalState::Signaled;
            return SignalDecision::Signaled(signal);
        }

        self.state = SignalState::NoSignal;
        SignalDecision::NoSignal {
            atm_row: summary.atm_row().cloned(),
        }
    }
}
