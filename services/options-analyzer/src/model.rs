//! Domain types shared by the analytic pipeline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Option side of a contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionSide {
    /// Call option (CE) - right to buy the underlying at strike price
    Call,
    /// Put option (PE) - right to sell the underlying at strike price
    Put,
}

impl OptionSide {
    /// Exchange suffix used in NSE symbols
    pub fn code(self) -> &'static str {
        match self {
            OptionSide::Call => "CE",
            OptionSide::Put => "PE",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OptionSide::Call => "CALL",
            OptionSide::Put => "PUT",
        }
    }
}

impl fmt::Display for OptionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// First-order Greeks, each rounded to 4 decimals
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GreeksResult {
    /// Rate of change of option price with respect to underlying price
    pub delta: f64,
    /// Rate of change of delta with respect to underlying price
    pub gamma: f64,
    /// Sensitivity to a 1% volatility change
    pub vega: f64,
    /// Daily time decay
    pub theta: f64,
    /// Sensitivity to a 1% rate change
    pub rho: f64,
}

/// One side of one strike in a chain snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractQuote {
    pub side: OptionSide,
    pub strike: f64,
    pub last_price: f64,
    /// Implied volatility in percent, as quoted by the exchange
    pub implied_volatility: f64,
    pub open_interest: f64,
    pub change_in_oi: f64,
    pub volume: u64,
    pub bid_qty: u64,
    pub ask_qty: u64,
    pub expiry: NaiveDate,
    /// Absent when implied volatility is not positive
    pub greeks: Option<GreeksResult>,
}

impl ContractQuote {
    pub fn gamma(&self) -> Option<f64> {
        self.greeks.map(|g| g.gamma)
    }
}

/// Strike position relative to spot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Moneyness {
    #[serde(rename = "ITM")]
    Itm,
    #[serde(rename = "ATM")]
    Atm,
    #[serde(rename = "OTM")]
    Otm,
}

impl fmt::Display for Moneyness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Moneyness::Itm => "ITM",
            Moneyness::Atm => "ATM",
            Moneyness::Otm => "OTM",
        })
    }
}

/// Structural level implied by open-interest imbalance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Support,
    Resistance,
    Neutral,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Support => "Support",
            Level::Resistance => "Resistance",
            Level::Neutral => "Neutral",
        })
    }
}

/// Paired call and put quotes at one strike
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikeRow {
    pub strike: f64,
    pub call: ContractQuote,
    pub put: ContractQuote,
    pub moneyness: Moneyness,
    pub level: Level,
}

impl StrikeRow {
    pub fn quote(&self, side: OptionSide) -> &ContractQuote {
        match side {
            OptionSide::Call => &self.call,
            OptionSide::Put => &self.put,
        }
    }
}

/// Directional vote of one factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

impl Bias {
    /// Signed contribution of this vote at the given weight
    pub fn contribution(self, weight: i32) -> i32 {
        match self {
            Bias::Bullish => weight,
            Bias::Bearish => -weight,
            Bias::Neutral => 0,
        }
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Bias::Bullish => "Bullish",
            Bias::Bearish => "Bearish",
            Bias::Neutral => "Neutral",
        })
    }
}

/// The seven factor votes of one strike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiasFactors {
    pub chg_oi: Bias,
    pub volume: Bias,
    pub gamma: Bias,
    pub ask_qty: Bias,
    pub bid_qty: Bias,
    pub iv: Bias,
    pub dvp: Bias,
}

impl fmt::Display for BiasFactors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ChgOI: {}, Volume: {}, Gamma: {},\nAskQty: {}, BidQty: {}, IV: {}, DVP: {}",
            self.chg_oi, self.volume, self.gamma, self.ask_qty, self.bid_qty, self.iv, self.dvp
        )
    }
}

/// Categorical reading of a bias score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    StrongBullish,
    Bullish,
    Neutral,
    Bearish,
    StrongBearish,
}

impl Verdict {
    pub fn is_bullish(self) -> bool {
        matches!(self, Verdict::StrongBullish | Verdict::Bullish)
    }

    pub fn is_bearish(self) -> bool {
        matches!(self, Verdict::StrongBearish | Verdict::Bearish)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::StrongBullish => "Strong Bullish",
            Verdict::Bullish => "Bullish",
            Verdict::Neutral => "Neutral",
            Verdict::Bearish => "Bearish",
            Verdict::StrongBearish => "Strong Bearish",
        })
    }
}

/// Scored summary of one strike near the money
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasRow {
    pub strike: f64,
    pub moneyness: Moneyness,
    pub level: Level,
    pub factors: BiasFactors,
    pub score: i32,
    pub verdict: Verdict,
}

/// Closed price interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceZone {
    pub low: f64,
    pub high: f64,
}

/// Directional trade proposal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub side: OptionSide,
    pub strike: f64,
    pub level: Level,
    pub entry: f64,
    pub target: f64,
    pub stop_loss: f64,
    pub rationale: String,
    pub factors: BiasFactors,
}

/// Open-interest build-up flagged on one strike
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquiditySpike {
    pub strike: f64,
    pub call_change_in_oi: f64,
    pub put_change_in_oi: f64,
    pub call_volume: u64,
    pub put_volume: u64,
}
