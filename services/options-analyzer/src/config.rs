//! Configuration for the options analyzer

use crate::error::{AnalyzerError, AnalyzerResult};
use crate::market_hours::TradingWindow;
use crate::nse::NseConfig;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use services_common::{IST_OFFSET_MINUTES, market};
use std::path::PathBuf;

/// Environment variable prefix, e.g. `ANALYZER__SYMBOL=BANKNIFTY`
pub const ENV_PREFIX: &str = "ANALYZER";
pub const ENV_SEPARATOR: &str = "__";

/// Options analyzer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Index underlying to analyze
    pub symbol: String,
    /// Seconds between scheduled passes
    pub refresh_interval_secs: u64,
    /// Annualized risk-free rate used for Greeks
    pub risk_free_rate: f64,
    /// Trading session
    pub market: MarketConfig,
    /// Upstream option chain endpoint
    pub nse: NseConfig,
    /// Telegram delivery; alerts go to the log when absent
    pub telegram: Option<TelegramSettings>,
    /// Latest report as JSON for an external chart
    pub report_path: Option<PathBuf>,
    /// CSV mirror of the trade log
    pub trade_log_path: Option<PathBuf>,
}

/// Trading session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Session open, `HH:MM` local time
    pub open: String,
    /// Session close, `HH:MM` local time (inclusive)
    pub close: String,
    /// Exchange offset east of UTC
    pub utc_offset_minutes: i32,
    /// Minimum spacing of closed-market notices
    pub closed_notice_interval_secs: u64,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramSettings {
    pub bot_token: String,
    pub chat_id: String,
}

impl std::fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            open: market::SESSION_OPEN.to_string(),
            close: market::SESSION_CLOSE.to_string(),
            utc_offset_minutes: IST_OFFSET_MINUTES,
            closed_notice_interval_secs: market::CLOSED_NOTICE_INTERVAL_SECS,
        }
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            symbol: market::DEFAULT_SYMBOL.to_string(),
            refresh_interval_secs: market::DEFAULT_REFRESH_INTERVAL_SECS,
            risk_free_rate: market::DEFAULT_RISK_FREE_RATE,
            market: MarketConfig::default(),
            nse: NseConfig::default(),
            telegram: None,
            report_path: None,
            trade_log_path: None,
        }
    }
}

impl AnalyzerConfig {
    /// Layer defaults, an optional file and `ANALYZER__*` environment
    /// variables. A `.env` file in the working directory is honored.
    pub fn load(path: Option<&str>) -> Result<Self> {
        dotenv::dotenv().ok();

        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?);
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn validate(&self) -> AnalyzerResult<()> {
        if self.symbol.trim().is_empty() {
            return Err(invalid("symbol must not be empty"));
        }
        if self.refresh_interval_secs == 0 {
            return Err(invalid("refresh_interval_secs must be positive"));
        }
        if self.market.closed_notice_interval_secs == 0 {
            return Err(invalid("market.closed_notice_interval_secs must be positive"));
        }
        if self.nse.warmup_timeout_secs == 0 || self.nse.request_timeout_secs == 0 {
            return Err(invalid("nse timeouts must be positive"));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(invalid("risk_free_rate must be finite"));
        }
        if let Some(telegram) = &self.telegram {
            if telegram.bot_token.is_empty() || telegram.chat_id.is_empty() {
                return Err(invalid("telegram.bot_token and telegram.chat_id are both required"));
            }
        }
        self.trading_window().map(|_| ())
    }

    pub fn trading_window(&self) -> AnalyzerResult<TradingWindow> {
        TradingWindow::parse(&self.market.open, &self.market.close, self.market.utc_offset_minutes)
    }
}

fn invalid(message: &str) -> AnalyzerError {
    AnalyzerError::Configuration {
        message: message.to_string(),
    }
}
