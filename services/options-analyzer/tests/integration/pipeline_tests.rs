use crate::test_utils::{
    GatedChainSource, RecordingNotifier, StaticChainSource, WarnCounter, bullish_chain, config::RISK_FREE_RATE,
    init_test_logging, ist, session_time, weekend_time,
};
use anyhow::anyhow;
use assert_matches::assert_matches;
use chrono::Utc;
use options_analyzer::market_hours::{CLOSED_MARKET_NOTICE, TradingWindow};
use options_analyzer::{
    AnalysisReport, AnalyzerError, AnalyzerState, Bias, ChainSource, JsonReportWriter, OptionSide, PassGuard,
    PassOutcome, PriceHistory, PriceZone, RenderSink, SnapshotPipeline, TradeLog, Verdict,
};
use services_common::NotificationSink;
use std::sync::{Arc, Mutex};
use tracing_subscriber::layer::SubscriberExt;

fn pipeline(source: Arc<dyn ChainSource>, notifier: Arc<dyn NotificationSink>) -> SnapshotPipeline {
    init_test_logging();
    SnapshotPipeline::new(
        "NIFTY",
        RISK_FREE_RATE,
        TradingWindow::nse().unwrap(),
        source,
        notifier,
        AnalyzerState::new(TradeLog::new(), 3600),
    )
}

fn published(outcome: PassOutcome) -> AnalysisReport {
    assert_matches!(outcome, PassOutcome::Published(report) => *report)
}

/// Records (trade log length, history length) at each render
#[derive(Clone, Default)]
struct CapturingRenderer {
    calls: Arc<Mutex<Vec<(usize, usize)>>>,
}

impl RenderSink for CapturingRenderer {
    fn render(&self, _report: &AnalysisReport, trade_log: &TradeLog, history: &PriceHistory) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push((trade_log.len(), history.len()));
        Ok(())
    }
}

struct FailingRenderer;

impl RenderSink for FailingRenderer {
    fn render(&self, _report: &AnalysisReport, _trade_log: &TradeLog, _history: &PriceHistory) -> anyhow::Result<()> {
        Err(anyhow!("disk full"))
    }
}

#[tokio::test]
async fn test_signal_pass_publishes_everything() {
    let source = Arc::new(StaticChainSource::new(bullish_chain(24010.0)));
    let notifier = Arc::new(RecordingNotifier::default());
    let renderer = CapturingRenderer::default();
    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("latest.json");

    let mut pipeline = pipeline(source.clone(), notifier.clone())
        .with_renderer(Box::new(FailingRenderer))
        .with_renderer(Box::new(renderer.clone()))
        .with_renderer(Box::new(JsonReportWriter::new(&report_path)));

    let report = published(pipeline.run_pass(session_time()).await.unwrap());

    assert_eq!(source.fetches(), 1);
    assert_eq!(report.atm_strike, 24000.0);
    assert_eq!(report.strike_rows.len(), 9);
    assert_eq!(report.bias_rows.len(), 5);
    assert!(report.strike_rows.iter().all(|r| r.call.greeks.is_some() && r.put.greeks.is_some()));
    assert_eq!(report.market_view, Verdict::StrongBullish);
    assert!(report.total_score >= 20);
    assert_eq!(report.support_zone, Some(PriceZone { low: 23950.0, high: 24000.0 }));
    assert_eq!(report.resistance_zone, Some(PriceZone { low: 24050.0, high: 24100.0 }));
    assert_eq!(report.spikes.len(), 1);
    assert_eq!(report.spikes[0].strike, 24100.0);

    let signal = report.decision.signal().unwrap();
    assert_eq!(signal.side, OptionSide::Call);
    assert_eq!(signal.strike, 24000.0);
    assert_eq!(signal.entry, 100.0);
    assert_eq!(signal.target, 112.0);
    assert_eq!(signal.stop_loss, 80.0);

    let messages = notifier.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].starts_with("⚡ Sudden Liquidity Spike!\nStrike: 24100"));
    assert!(messages[1].starts_with("📍 Spot: 24010\n🔹 CALL Entry (Bias Based at Support)"));

    let state = pipeline.state();
    assert_eq!(state.price_history.len(), 1);
    assert_eq!(state.trade_log.len(), 1);
    assert_eq!(state.trade_log.entries()[0].time, "10:30:00");

    // A failing renderer does not stop the ones after it
    assert_eq!(*renderer.calls.lock().unwrap(), vec![(1, 1)]);
    assert!(report_path.exists());
}

#[tokio::test]
async fn test_no_signal_pass_sends_notice() {
    let source = Arc::new(StaticChainSource::new(bullish_chain(24030.0)));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut pipeline = pipeline(source, notifier.clone());

    let report = published(pipeline.run_pass(session_time()).await.unwrap());

    assert_eq!(report.atm_strike, 24050.0);
    assert!(report.decision.signal().is_none());

    let messages = notifier.messages();
    let notice = messages.last().unwrap();
    assert!(notice.contains("— No Signal 🚫"));
    assert!(notice.contains("Strike: 24050"));
    assert_eq!(pipeline.state().trade_log.len(), 0);
    assert_eq!(pipeline.state().price_history.len(), 1);
}

#[tokio::test]
async fn test_market_closed_skips_fetch_and_throttles_notice() {
    let source = Arc::new(StaticChainSource::new(bullish_chain(24010.0)));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut pipeline = pipeline(source.clone(), notifier.clone());

    let first = pipeline.run_pass(weekend_time()).await.unwrap();
    assert_eq!(first, PassOutcome::MarketClosed { notice_sent: true });

    let ten_minutes_later = ist(2024, 10, 19, 11, 10).with_timezone(&Utc);
    let second = pipeline.run_pass(ten_minutes_later).await.unwrap();
    assert_eq!(second, PassOutcome::MarketClosed { notice_sent: false });

    let next_hour = ist(2024, 10, 19, 12, 1).with_timezone(&Utc);
    let third = pipeline.run_pass(next_hour).await.unwrap();
    assert_eq!(third, PassOutcome::MarketClosed { notice_sent: true });

    assert_eq!(source.fetches(), 0);
    assert_eq!(notifier.messages(), vec![CLOSED_MARKET_NOTICE.to_string(); 2]);
    assert!(pipeline.state().price_history.is_empty());
}

#[tokio::test]
async fn test_every_closed_pass_logs_warning() {
    let warnings = WarnCounter::default();
    let _subscriber = tracing::subscriber::set_default(tracing_subscriber::registry().with(warnings.clone()));

    let notifier = Arc::new(RecordingNotifier::default());
    let mut pipeline = pipeline(
        Arc::new(StaticChainSource::new(bullish_chain(24010.0))),
        notifier.clone(),
    );

    for minute in [0, 5, 10] {
        let now = ist(2024, 10, 19, 11, minute).with_timezone(&Utc);
        pipeline.run_pass(now).await.unwrap();
    }

    assert_eq!(warnings.count(), 3);
    assert_eq!(notifier.messages().len(), 1);
}

#[tokio::test]
async fn test_zero_iv_quote_has_no_greeks() {
    let mut chain = bullish_chain(24010.0);
    if let Some(records) = chain.records.as_mut() {
        if let Some(call) = records.data[5].call.as_mut() {
            call.implied_volatility = Some(0.0);
        }
    }

    let notifier = Arc::new(RecordingNotifier::default());
    let mut pipeline = pipeline(Arc::new(StaticChainSource::new(chain)), notifier);

    let report = published(pipeline.run_pass(session_time()).await.unwrap());

    let row = report.strike_rows.iter().find(|r| r.strike == 24050.0).unwrap();
    assert!(row.call.greeks.is_none());
    assert!(row.put.greeks.is_some());

    let bias = report.bias_rows.iter().find(|r| r.strike == 24050.0).unwrap();
    assert_eq!(bias.factors.gamma, Bias::Bearish);
    assert_eq!(pipeline.state().price_history.len(), 1);
}

#[tokio::test]
async fn test_data_shape_error_publishes_nothing() {
    let mut chain = bullish_chain(24010.0);
    if let Some(records) = chain.records.as_mut() {
        if let Some(call) = records.data[4].call.as_mut() {
            call.last_price = None;
        }
    }

    let notifier = Arc::new(RecordingNotifier::default());
    let mut pipeline = pipeline(Arc::new(StaticChainSource::new(chain)), notifier.clone());

    let err = pipeline.run_pass(session_time()).await.unwrap_err();
    assert_matches!(err, AnalyzerError::DataShape { ref message } if message.contains("lastPrice"));

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("❌ Error: Unexpected data shape"));
    assert!(pipeline.state().price_history.is_empty());
    assert!(pipeline.state().trade_log.is_empty());
}

#[tokio::test]
async fn test_upstream_failure_reported() {
    let notifier = Arc::new(RecordingNotifier::default());
    let mut pipeline = pipeline(
        Arc::new(StaticChainSource::failing("connection reset")),
        notifier.clone(),
    );

    let err = pipeline.run_pass(session_time()).await.unwrap_err();
    assert_matches!(err, AnalyzerError::UpstreamFetch { .. });
    assert_eq!(
        notifier.messages(),
        vec!["❌ Error: Upstream fetch failed: connection reset".to_string()]
    );
    assert!(pipeline.state().price_history.is_empty());
}

#[tokio::test]
async fn test_notifier_failure_does_not_abort_pass() {
    let notifier = Arc::new(RecordingNotifier::rejecting());
    let mut pipeline = pipeline(
        Arc::new(StaticChainSource::new(bullish_chain(24010.0))),
        notifier.clone(),
    );

    let outcome = pipeline.run_pass(session_time()).await.unwrap();
    assert_matches!(outcome, PassOutcome::Published(_));
    assert_eq!(notifier.messages().len(), 2);
    assert_eq!(pipeline.state().trade_log.len(), 1);
}

#[tokio::test]
async fn test_guard_skips_overlapping_trigger() {
    let source = Arc::new(GatedChainSource::new(bullish_chain(24010.0)));
    let entered = source.entered.clone();
    let release = source.release.clone();
    let guard = PassGuard::new(pipeline(source, Arc::new(RecordingNotifier::default())));

    let in_flight = {
        let guard = guard.clone();
        tokio::spawn(async move { guard.trigger(session_time(), "scheduled").await })
    };
    entered.notified().await;

    let overlapping = guard.trigger(session_time(), "manual").await.unwrap();
    assert_eq!(overlapping, PassOutcome::Skipped);

    release.notify_one();
    let first = in_flight.await.unwrap().unwrap();
    assert_matches!(first, PassOutcome::Published(_));

    let history_len = guard.inspect(|p| p.state().price_history.len()).await;
    assert_eq!(history_len, 1);
}
