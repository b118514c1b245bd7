//! Options Analyzer Service
//!
//! Polls the NSE option chain on a fixed cadence during market hours and
//! publishes bias analysis, zones and trade signals

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use options_analyzer::{
    AnalyzerConfig, AnalyzerState, ConsoleRenderer, JsonReportWriter, NseClient, PassGuard, PassOutcome,
    SnapshotPipeline, TradeLog,
};
use services_common::logging::init_tracing;
use services_common::{LogNotifier, NotificationSink, TelegramConfig, TelegramNotifier};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Command-line interface
#[derive(Debug, Parser)]
#[command(name = "options-analyzer", about = "Option chain bias analyzer for Indian index options")]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long)]
    config: Option<String>,
    /// Override the configured underlying
    #[arg(long)]
    symbol: Option<String>,
    /// Run a single pass and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("options_analyzer=info,services_common=info");

    let cli = Cli::parse();
    let mut config = AnalyzerConfig::load(cli.config.as_deref())?;
    if let Some(symbol) = cli.symbol {
        config.symbol = symbol;
    }
    config.validate()?;

    info!("🚀 Options Analyzer starting for {}", config.symbol);
    info!(
        "Session {}-{} (UTC offset {} min), refresh every {}s",
        config.market.open, config.market.close, config.market.utc_offset_minutes, config.refresh_interval_secs
    );

    let guard = PassGuard::new(build_pipeline(&config)?);

    if cli.once {
        let outcome = guard.trigger(Utc::now(), "one-shot").await?;
        log_outcome(&outcome);
        return Ok(());
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(config.refresh_interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    info!("Press Enter to refresh now, Ctrl-C to stop");

    loop {
        tokio::select! {
            _ = ticker.tick() => spawn_pass(&guard, "scheduled"),
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(_)) => spawn_pass(&guard, "manual"),
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!("Stopped reading refresh requests: {}", e);
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}

fn build_pipeline(config: &AnalyzerConfig) -> Result<SnapshotPipeline> {
    let source = Arc::new(NseClient::new(config.nse.clone())?);

    let notifier: Arc<dyn NotificationSink> = match &config.telegram {
        Some(telegram) => Arc::new(TelegramNotifier::new(TelegramConfig::new(
            telegram.bot_token.clone(),
            telegram.chat_id.clone(),
        ))?),
        None => {
            warn!("Telegram not configured, alerts will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let trade_log = match &config.trade_log_path {
        Some(path) => TradeLog::with_csv(path),
        None => TradeLog::new(),
    };
    let state = AnalyzerState::new(trade_log, config.market.closed_notice_interval_secs);

    let mut pipeline = SnapshotPipeline::new(
        config.symbol.clone(),
        config.risk_free_rate,
        config.trading_window()?,
        source,
        notifier,
        state,
    )
    .with_renderer(Box::new(ConsoleRenderer));

    if let Some(path) = &config.report_path {
        info!("Writing reports to {}", path.display());
        pipeline = pipeline.with_renderer(Box::new(JsonReportWriter::new(path.clone())));
    }

    Ok(pipeline)
}

fn spawn_pass(guard: &PassGuard, reason: &'static str) {
    let guard = guard.clone();
    tokio::spawn(async move {
        // Failed passes are already logged and reported by the pipeline
        if let Ok(outcome) = guard.trigger(Utc::now(), reason).await {
            log_outcome(&outcome);
        }
    });
}

fn log_outcome(outcome: &PassOutcome) {
    match outcome {
        PassOutcome::MarketClosed { .. } => info!("Market closed, waiting for the session"),
        PassOutcome::Published(report) => info!(
            "Published {} @ {}: {} ({})",
            report.symbol, report.spot, report.market_view, report.total_score
        ),
        PassOutcome::Skipped => {}
    }
}
