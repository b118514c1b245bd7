//! ShrivenQuant Options Analyzer
//! Option chain bias analysis for Indian index options
//!
//! Features:
//! - Black-Scholes Greeks for every quoted contract
//! - Support / resistance classification from open-interest imbalance
//! - Seven-factor weighted bias score around the ATM strike
//! - Trade proposals when bias and spot location agree
//! - Telegram alerts for signals and liquidity spikes

pub mod bias;
pub mod classifier;
pub mod config;
pub mod error;
pub mod greeks;
pub mod market_hours;
pub mod model;
pub mod nse;
pub mod pipeline;
pub mod render;
pub mod signal;
pub mod state;
pub mod zones;

pub use config::AnalyzerConfig;
pub use error::{AnalyzerError, AnalyzerResult};
pub use greeks::{BlackScholes, compute_greeks, time_to_expiry_years};
pub use model::*;
pub use nse::{ChainSnapshot, ChainSource, NseClient, NseConfig, RawChain};
pub use pipeline::{AnalysisReport, PassGuard, PassOutcome, SnapshotPipeline};
pub use render::{ConsoleRenderer, JsonReportWriter, RenderSink};
pub use signal::{SignalDecision, SignalEngine};
pub use state::{AnalyzerState, PriceHistory, TradeLog, TradeLogEntry};
