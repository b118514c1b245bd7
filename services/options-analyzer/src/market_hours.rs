//! Trading-session gate and closed-market notice throttling

use crate::error::{AnalyzerError, AnalyzerResult};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveTime, TimeZone, Weekday};
use services_common::{IST_OFFSET_MINUTES, market};

pub const CLOSED_MARKET_NOTICE: &str =
    "⏳ Market is closed. Script will resume during trading hours (Mon–Fri 9:00–15:40).";

/// Weekday session in a fixed UTC offset; both bounds inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingWindow {
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub offset: FixedOffset,
}

impl TradingWindow {
    pub fn new(open: NaiveTime, close: NaiveTime, offset: FixedOffset) -> AnalyzerResult<Self> {
        if open >= close {
            return Err(AnalyzerError::Configuration {
                message: format!("session open {open} must be before close {close}"),
            });
        }
        Ok(Self { open, close, offset })
    }

    /// Parse `HH:MM` bounds with an offset in minutes east of UTC
    pub fn parse(open: &str, close: &str, utc_offset_minutes: i32) -> AnalyzerResult<Self> {
        let parse_time = |value: &str| {
            NaiveTime::parse_from_str(value, "%H:%M").map_err(|e| AnalyzerError::Configuration {
                message: format!("invalid session time '{value}': {e}"),
            })
        };
        let offset = FixedOffset::east_opt(utc_offset_minutes * 60).ok_or_else(|| {
            AnalyzerError::Configuration {
                message: format!("invalid UTC offset {utc_offset_minutes} minutes"),
            }
        })?;
        Self::new(parse_time(open)?, parse_time(close)?, offset)
    }

    /// Mon–Fri 09:00–15:40 IST
    pub fn nse() -> AnalyzerResult<Self> {
        Self::parse(market::SESSION_OPEN, market::SESSION_CLOSE, IST_OFFSET_MINUTES)
    }

    /// Local wall-clock time in the session's offset
    pub fn localize<Tz: TimeZone>(&self, now: DateTime<Tz>) -> DateTime<FixedOffset> {
        now.with_timezone(&self.offset)
    }

    pub fn is_open<Tz: TimeZone>(&self, now: DateTime<Tz>) -> bool {
        let local = self.localize(now);
        let weekday_ok = !matches!(local.weekday(), Weekday::Sat | Weekday::Sun);
        let time = local.time();
        weekday_ok && self.open <= time && time <= self.close
    }
}

/// Rate-limits the closed-market notice to one per interval
#[derive(Debug, Clone)]
pub struct ClosedNoticeGate {
    interval: Duration,
    last_sent: Option<DateTime<FixedOffset>>,
}

impl ClosedNoticeGate {
    pub fn new(interval_secs: u64) -> Self {
        Self {
            interval: Duration::seconds(interval_secs as i64),
            last_sent: None,
        }
    }

    /// Returns true and records `now` when a notice is due
    pub fn try_acquire(&mut self, now: DateTime<FixedOffset>) -> bool {
        let due = match self.last_sent {
            None => true,
            Some(last) => now - last > self.interval,
        };
        if due {
            self.last_sent = Some(now);
        }
        due
    }
}
