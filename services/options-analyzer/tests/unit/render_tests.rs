use crate::test_utils::{expiry, ist};
use options_analyzer::render::{error_message, no_signal_message, signal_message, spike_message};
use options_analyzer::signal::SignalDecision;
use options_analyzer::{
    AnalysisReport, AnalyzerError, Bias, BiasFactors, BiasRow, JsonReportWriter, Level, LiquiditySpike, Moneyness,
    OptionSide, PriceHistory, PriceZone, RenderSink, TradeLog, TradeLogEntry, TradeSignal, Verdict,
};
use pretty_assertions::assert_eq;
use rstest::*;

fn factors() -> BiasFactors {
    BiasFactors {
        chg_oi: Bias::Bullish,
        volume: Bias::Bullish,
        gamma: Bias::Bearish,
        ask_qty: Bias::Bullish,
        bid_qty: Bias::Bullish,
        iv: Bias::Bullish,
        dvp: Bias::Neutral,
    }
}

fn signal() -> TradeSignal {
    TradeSignal {
        side: OptionSide::Call,
        strike: 24000.0,
        level: Level::Support,
        entry: 100.0,
        target: 112.0,
        stop_loss: 80.0,
        rationale: "CALL Entry (Bias Based at Support)".to_string(),
        factors: factors(),
    }
}

#[fixture]
fn report() -> AnalysisReport {
    AnalysisReport {
        timestamp: ist(2024, 10, 17, 10, 30),
        symbol: "NIFTY".to_string(),
        expiry: expiry(),
        spot: 24010.0,
        atm_strike: 24000.0,
        strike_rows: Vec::new(),
        bias_rows: Vec::new(),
        total_score: 25,
        market_view: Verdict::StrongBullish,
        support_zone: Some(PriceZone { low: 23950.0, high: 24000.0 }),
        resistance_zone: None,
        decision: SignalDecision::Signaled(signal()),
        spikes: Vec::new(),
    }
}

#[rstest]
fn test_signal_message(report: AnalysisReport) {
    let text = signal_message(&report, &signal());
    assert_eq!(
        text,
        "📍 Spot: 24010\n\
         🔹 CALL Entry (Bias Based at Support)\n\
         Strike: 24000 CE @ ₹100 | 🎯 Target: ₹112 | 🛑 SL: ₹80\n\
         Bias Score (ATM ±2): 25 (Strong Bullish)\n\
         Level: Support\n\
         📉 Support Zone: 24000 to 23950\n\
         📈 Resistance Zone: N/A\n\
         Biases:\n\
         Strike: 24000\n\
         ChgOI: Bullish, Volume: Bullish, Gamma: Bearish,\n\
         AskQty: Bullish, BidQty: Bullish, IV: Bullish, DVP: Neutral"
    );
}

#[rstest]
fn test_no_signal_message(mut report: AnalysisReport) {
    let atm = BiasRow {
        strike: 24000.0,
        moneyness: Moneyness::Atm,
        level: Level::Neutral,
        factors: factors(),
        score: 5,
        verdict: Verdict::StrongBullish,
    };
    report.decision = SignalDecision::NoSignal {
        atm_row: Some(atm.clone()),
    };

    let text = no_signal_message(&report, &atm);
    assert!(text.starts_with("📍 Spot: 24010\nStrong Bullish — No Signal 🚫"));
    assert!(text.contains("Bias Score: 25 (Strong Bullish)\nLevel: Neutral\n"));
    assert!(text.ends_with("DVP: Neutral"));
}

#[test]
fn test_spike_message() {
    let spike = LiquiditySpike {
        strike: 24100.0,
        call_change_in_oi: 100.0,
        put_change_in_oi: 5000.0,
        call_volume: 1000,
        put_volume: 2000,
    };
    assert_eq!(
        spike_message(&spike),
        "⚡ Sudden Liquidity Spike!\nStrike: 24100\nCE OI Chg: 100 | PE OI Chg: 5000\nVol CE: 1000 | PE: 2000"
    );
}

#[test]
fn test_error_message() {
    let err = AnalyzerError::upstream("timeout");
    assert_eq!(error_message(&err), "❌ Error: Upstream fetch failed: timeout");
}

#[rstest]
fn test_json_report_writer(report: AnalysisReport) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");

    let mut trade_log = TradeLog::new();
    trade_log
        .append(TradeLogEntry::from_signal(&signal(), report.timestamp))
        .unwrap();
    let mut history = PriceHistory::default();
    history.append(report.timestamp, report.spot);

    let writer = JsonReportWriter::new(&path);
    writer.render(&report, &trade_log, &history).unwrap();
    // Second render replaces the file
    writer.render(&report, &trade_log, &history).unwrap();

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["report"]["spot"], 24010.0);
    assert_eq!(json["report"]["market_view"], "StrongBullish");
    assert_eq!(json["trade_log"][0]["time"], "10:30:00");
    assert_eq!(json["price_history"].as_array().map(Vec::len), Some(1));
    assert!(!dir.path().join("report.json.tmp").exists());
}
