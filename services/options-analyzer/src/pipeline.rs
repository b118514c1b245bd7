//! Snapshot pipeline
//!
//! One pass: gate on market hours, fetch and parse the chain, enrich with
//! Greeks, classify, score, derive zones and decide. Nothing reaches the
//! history, trade log, notifier or renderers until every step succeeded.

use crate::bias::score_window;
use crate::classifier::build_strike_rows;
use crate::error::{AnalyzerError, AnalyzerResult};
use crate::greeks::{compute_greeks, time_to_expiry_years};
use crate::market_hours::{CLOSED_MARKET_NOTICE, TradingWindow};
use crate::model::{BiasRow, ContractQuote, LiquiditySpike, PriceZone, StrikeRow, Verdict};
use crate::nse::{ChainSnapshot, ChainSource};
use crate::render::{RenderSink, error_message, no_signal_message, signal_message, spike_message};
use crate::signal::{SignalDecision, SignalEngine};
use crate::state::{AnalyzerState, TradeLogEntry};
use crate::zones::support_resistance_zones;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use services_common::{NotificationSink, notify_best_effort};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Everything one successful pass produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub timestamp: DateTime<FixedOffset>,
    pub symbol: String,
    pub expiry: NaiveDate,
    pub spot: f64,
    pub atm_strike: f64,
    /// Strikes within the table window, ascending
    pub strike_rows: Vec<StrikeRow>,
    /// Strikes within the scoring window, ascending
    pub bias_rows: Vec<BiasRow>,
    pub total_score: i32,
    pub market_view: Verdict,
    pub support_zone: Option<PriceZone>,
    pub resistance_zone: Option<PriceZone>,
    pub decision: SignalDecision,
    pub spikes: Vec<LiquiditySpike>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    /// Outside the trading window; nothing was fetched
    MarketClosed { notice_sent: bool },
    Published(Box<AnalysisReport>),
    /// Another pass was already in flight
    Skipped,
}

pub struct SnapshotPipeline {
    symbol: String,
    risk_free_rate: f64,
    window: TradingWindow,
    source: Arc<dyn ChainSource>,
    notifier: Arc<dyn NotificationSink>,
    renderers: Vec<Box<dyn RenderSink>>,
    state: AnalyzerState,
}

impl SnapshotPipeline {
    pub fn new(
        symbol: impl Into<String>,
        risk_free_rate: f64,
        window: TradingWindow,
        source: Arc<dyn ChainSource>,
        notifier: Arc<dyn NotificationSink>,
        state: AnalyzerState,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            risk_free_rate,
            window,
            source,
            notifier,
            renderers: Vec::new(),
            state,
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn RenderSink>) -> Self {
        self.renderers.push(renderer);
        self
    }

    pub fn state(&self) -> &AnalyzerState {
        &self.state
    }

    /// Run one pass. A failed pass is logged and reported to the notifier
    /// before the error is returned.
    pub async fn run_pass(&mut self, now: DateTime<Utc>) -> AnalyzerResult<PassOutcome> {
        match self.execute(now).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!("Pass for {} aborted: {}", self.symbol, e);
                notify_best_effort(self.notifier.as_ref(), &error_message(&e)).await;
                Err(e)
            }
        }
    }

    async fn execute(&mut self, now: DateTime<Utc>) -> AnalyzerResult<PassOutcome> {
        let local = self.window.localize(now);

        if !self.window.is_open(now) {
            warn!("Market closed at {}, pausing analysis", local.format("%a %H:%M"));
            let notice_sent = self.state.closed_notice.try_acquire(local);
            if notice_sent {
                notify_best_effort(self.notifier.as_ref(), CLOSED_MARKET_NOTICE).await;
            }
            return Ok(PassOutcome::MarketClosed { notice_sent });
        }

        let report = self.analyze(local).await?;
        self.publish(&report).await;
        Ok(PassOutcome::Published(Box::new(report)))
    }

    /// Every fallible step of a pass. Touches no state.
    async fn analyze(&self, local: DateTime<FixedOffset>) -> AnalyzerResult<AnalysisReport> {
        let raw = self.source.fetch_chain(&self.symbol).await?;
        let snapshot = ChainSnapshot::from_raw(raw)?;
        let spot = snapshot.spot;

        let time_to_expiry = time_to_expiry_years(local, snapshot.expiry);
        let calls = self.enrich(snapshot.calls, spot, time_to_expiry)?;
        let puts = self.enrich(snapshot.puts, spot, time_to_expiry)?;

        let (atm_strike, strike_rows) = build_strike_rows(calls, puts, spot)
            .ok_or_else(|| AnalyzerError::data_shape("no strike has both call and put quotes"))?;
        let summary = score_window(&strike_rows, atm_strike);
        let (support_zone, resistance_zone) = support_resistance_zones(&strike_rows, spot);
        let decision = SignalEngine::new().evaluate(&summary, &strike_rows, spot);

        debug!(
            "Scored {} of {} strikes around ATM {}",
            summary.rows.len(),
            strike_rows.len(),
            atm_strike
        );

        Ok(AnalysisReport {
            timestamp: local,
            symbol: self.symbol.clone(),
            expiry: snapshot.expiry,
            spot,
            atm_strike,
            strike_rows,
            bias_rows: summary.rows,
            total_score: summary.total_score,
            market_view: summary.market_view,
            support_zone,
            resistance_zone,
            decision,
            spikes: summary.spikes,
        })
    }

    /// Attach Greeks to quotes with a positive IV
    fn enrich(&self, quotes: Vec<ContractQuote>, spot: f64, time_to_expiry: f64) -> AnalyzerResult<Vec<ContractQuote>> {
        quotes
            .into_iter()
            .map(|mut quote| {
                if quote.implied_volatility > 0.0 {
                    quote.greeks = Some(compute_greeks(
                        quote.side,
                        spot,
                        quote.strike,
                        time_to_expiry,
                        self.risk_free_rate,
                        quote.implied_volatility / 100.0,
                    )?);
                }
                Ok(quote)
            })
            .collect()
    }

    async fn publish(&mut self, report: &AnalysisReport) {
        self.state.price_history.append(report.timestamp, report.spot);

        if let Some(signal) = report.decision.signal() {
            if let Err(e) = self
                .state
                .trade_log
                .append(TradeLogEntry::from_signal(signal, report.timestamp))
            {
                warn!("Trade log mirror failed: {:#}", e);
            }
        }

        let notifier = self.notifier.as_ref();
        for spike in &report.spikes {
            notify_best_effort(notifier, &spike_message(spike)).await;
        }

        match &report.decision {
            SignalDecision::Signaled(signal) => {
                info!("Signal: {} at {}", signal.rationale, signal.strike);
                notify_best_effort(notifier, &signal_message(report, signal)).await;
            }
            SignalDecision::NoSignal { atm_row: Some(atm) } => {
                info!("No signal ({}, score {})", report.market_view, report.total_score);
                notify_best_effort(notifier, &no_signal_message(report, atm)).await;
            }
            SignalDecision::NoSignal { atm_row: None } => {
                info!("No signal and no ATM row scored");
            }
        }

        for renderer in &self.renderers {
            if let Err(e) = renderer.render(report, &self.state.trade_log, &self.state.price_history) {
                warn!("Renderer failed: {:#}", e);
            }
        }
    }
}

/// Single active-pass guard. A trigger that arrives while a pass is in
/// flight is dropped, not queued.
#[derive(Clone)]
pub struct PassGuard {
    pipeline: Arc<Mutex<SnapshotPipeline>>,
}

impl PassGuard {
    pub fn new(pipeline: SnapshotPipeline) -> Self {
        Self {
            pipeline: Arc::new(Mutex::new(pipeline)),
        }
    }

    pub async fn trigger(&self, now: DateTime<Utc>, reason: &str) -> AnalyzerResult<PassOutcome> {
        let Ok(mut pipeline) = self.pipeline.try_lock() else {
            warn!("Skipping {} trigger, a pass is already running", reason);
            return Ok(PassOutcome::Skipped);
        };
        debug!("Starting pass ({})", reason);
        pipeline.run_pass(now).await
    }

    /// Wait for any in-flight pass, then read the pipeline
    pub async fn inspect<R>(&self, f: impl FnOnce(&SnapshotPipeline) -> R) -> R {
        let pipeline = self.pipeline.lock().await;
        f(&pipeline)
    }
}
