//! Process-lifetime state carried between passes
//!
//! Created once at startup and handed to the pipeline, which appends to it
//! only after a pass has fully succeeded. Nothing here is ever rolled back.

use crate::market_hours::ClosedNoticeGate;
use crate::model::{OptionSide, TradeSignal};
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// One spot observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub timestamp: DateTime<FixedOffset>,
    pub spot: f64,
}

/// Append-only spot series for charting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceHistory {
    samples: Vec<PriceSample>,
}

impl PriceHistory {
    pub fn append(&mut self, timestamp: DateTime<FixedOffset>, spot: f64) {
        self.samples.push(PriceSample { timestamp, spot });
    }

    pub fn samples(&self) -> &[PriceSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Record of an emitted signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLogEntry {
    /// Local wall-clock time, `HH:MM:SS`
    pub time: String,
    pub strike: f64,
    pub side: OptionSide,
    pub ltp: f64,
    pub target: f64,
    pub stop_loss: f64,
}

impl TradeLogEntry {
    pub fn from_signal(signal: &TradeSignal, at: DateTime<FixedOffset>) -> Self {
        Self {
            time: at.format("%H:%M:%S").to_string(),
            strike: signal.strike,
            side: signal.side,
            ltp: signal.entry,
            target: signal.target,
            stop_loss: signal.stop_loss,
        }
    }
}

/// Append-only trade log, optionally mirrored to a CSV file
#[derive(Debug, Default)]
pub struct TradeLog {
    entries: Vec<TradeLogEntry>,
    csv_path: Option<PathBuf>,
}

impl TradeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_csv(path: impl Into<PathBuf>) -> Self {
        Self {
            entries: Vec::new(),
            csv_path: Some(path.into()),
        }
    }

    /// Append in memory, then mirror to CSV if configured. The in-memory
    /// append always happens; a CSV failure is returned for the caller to log.
    pub fn append(&mut self, entry: TradeLogEntry) -> Result<()> {
        self.entries.push(entry.clone());
        if let Some(path) = &self.csv_path {
            append_csv(path, &entry)?;
        }
        Ok(())
    }

    pub fn entries(&self) -> &[TradeLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn append_csv(path: &Path, entry: &TradeLogEntry) -> Result<()> {
    let write_header = !path.exists();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open trade log {}", path.display()))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(write_header)
        .from_writer(file);
    writer.serialize(entry).context("Failed to write trade log row")?;
    writer.flush().context("Failed to flush trade log")?;
    Ok(())
}

/// Everything the orchestrator keeps across passes
#[derive(Debug)]
pub struct AnalyzerState {
    pub price_history: PriceHistory,
    pub trade_log: TradeLog,
    pub closed_notice: ClosedNoticeGate,
}

impl AnalyzerState {
    pub fn new(trade_log: TradeLog, closed_notice_interval_secs: u64) -> Self {
        Self {
            price_history: PriceHistory::default(),
            trade_log,
            closed_notice: ClosedNoticeGate::new(closed_notice_interval_secs),
        }
    }
}
