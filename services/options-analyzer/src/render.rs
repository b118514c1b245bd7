//! Notification text and rendering sinks

use crate::model::{BiasRow, LiquiditySpike, TradeSignal};
use crate::pipeline::AnalysisReport;
use crate::state::{PriceHistory, TradeLog};
use crate::zones::{format_resistance, format_support};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

// ============================================================================
// NOTIFICATION TEXT
// ============================================================================

pub fn spike_message(spike: &LiquiditySpike) -> String {
    format!(
        "⚡ Sudden Liquidity Spike!\nStrike: {}\nCE OI Chg: {} | PE OI Chg: {}\nVol CE: {} | PE: {}",
        spike.strike, spike.call_change_in_oi, spike.put_change_in_oi, spike.call_volume, spike.put_volume
    )
}

/// Entry line, e.g. `Strike: 24000 CE @ ₹100 | 🎯 Target: ₹112 | 🛑 SL: ₹80`
pub fn trade_line(signal: &TradeSignal) -> String {
    format!(
        "Strike: {} {} @ ₹{} | 🎯 Target: ₹{} | 🛑 SL: ₹{}",
        signal.strike,
        signal.side.code(),
        signal.entry,
        signal.target,
        signal.stop_loss
    )
}

pub fn signal_message(report: &AnalysisReport, signal: &TradeSignal) -> String {
    format!(
        "📍 Spot: {}\n🔹 {}\n{}\nBias Score (ATM ±2): {} ({})\nLevel: {}\n📉 Support Zone: {}\n📈 Resistance Zone: {}\nBiases:\nStrike: {}\n{}",
        report.spot,
        signal.rationale,
        trade_line(signal),
        report.total_score,
        report.market_view,
        signal.level,
        format_support(report.support_zone),
        format_resistance(report.resistance_zone),
        signal.strike,
        signal.factors
    )
}

pub fn no_signal_message(report: &AnalysisReport, atm: &BiasRow) -> String {
    format!(
        "📍 Spot: {}\n{} — No Signal 🚫 (Spot not in valid zone or direction mismatch)\nBias Score: {} ({})\nLevel: {}\n📉 Support Zone: {}\n📈 Resistance Zone: {}\nBiases:\nStrike: {}\n{}",
        report.spot,
        report.market_view,
        report.total_score,
        report.market_view,
        atm.level,
        format_support(report.support_zone),
        format_resistance(report.resistance_zone),
        atm.strike,
        atm.factors
    )
}

pub fn error_message(error: &dyn std::fmt::Display) -> String {
    format!("❌ Error: {error}")
}

// ============================================================================
// RENDERING SINKS
// ============================================================================

/// Consumer of each published pass
pub trait RenderSink: Send + Sync {
    fn render(&self, report: &AnalysisReport, trade_log: &TradeLog, history: &PriceHistory) -> Result<()>;
}

/// Logs the pass summary and bias table
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleRenderer;

impl RenderSink for ConsoleRenderer {
    fn render(&self, report: &AnalysisReport, trade_log: &TradeLog, history: &PriceHistory) -> Result<()> {
        info!("📍 Spot Price: {} ({} expiry {})", report.spot, report.symbol, report.expiry);
        info!("🧠 Market View: {} | Bias Score: {}", report.market_view, report.total_score);
        info!("🛡️ Support Zone: {}", format_support(report.support_zone));
        info!("🚧 Resistance Zone: {}", format_resistance(report.resistance_zone));

        if let Some(signal) = report.decision.signal() {
            info!("🔹 {} | {}", signal.rationale, trade_line(signal));
        }

        info!(
            "{:>8} {:>4} {:>10} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>6} {:>14}",
            "Strike", "Zone", "Level", "ChgOI", "Volume", "Gamma", "AskQty", "BidQty", "IV", "DVP", "Score", "Verdict"
        );
        for row in &report.bias_rows {
            let f = &row.factors;
            info!(
                "{:>8} {:>4} {:>10} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>6} {:>14}",
                row.strike,
                row.moneyness.to_string(),
                row.level.to_string(),
                f.chg_oi.to_string(),
                f.volume.to_string(),
                f.gamma.to_string(),
                f.ask_qty.to_string(),
                f.bid_qty.to_string(),
                f.iv.to_string(),
                f.dvp.to_string(),
                row.score,
                row.verdict.to_string()
            );
        }

        if !trade_log.is_empty() {
            info!("📜 Trade Log ({} entries)", trade_log.len());
            for entry in trade_log.entries() {
                info!(
                    "  {} {} {} LTP={} Target={} SL={}",
                    entry.time, entry.strike, entry.side, entry.ltp, entry.target, entry.stop_loss
                );
            }
        }

        info!("Price history: {} samples", history.len());
        Ok(())
    }
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    report: &'a AnalysisReport,
    trade_log: &'a [crate::state::TradeLogEntry],
    price_history: &'a [crate::state::PriceSample],
}

/// Overwrites a JSON file with the latest pass, trade log and price series
/// for an external chart
#[derive(Debug, Clone)]
pub struct JsonReportWriter {
    path: PathBuf,
}

impl JsonReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RenderSink for JsonReportWriter {
    fn render(&self, report: &AnalysisReport, trade_log: &TradeLog, history: &PriceHistory) -> Result<()> {
        let document = ReportDocument {
            report,
            trade_log: trade_log.entries(),
            price_history: history.samples(),
        };
        let json = serde_json::to_string_pretty(&document).context("Failed to serialize report")?;

        // Write-then-rename so readers never see a half-written file
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to move report into {}", self.path.display()))?;
        Ok(())
    }
}
