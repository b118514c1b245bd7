//! Common constants used across all services
//!
//! COMPLIANCE: Single source of truth for all magic numbers

// Time constants
pub const SECS_PER_MIN: u64 = 60;
pub const MINS_PER_HOUR: u64 = 60;
pub const SECS_PER_HOUR: u64 = SECS_PER_MIN * MINS_PER_HOUR;
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Indian Standard Time offset from UTC in minutes (+05:30)
pub const IST_OFFSET_MINUTES: i32 = 330;

/// Market hours and session constants
pub mod market {
    /// Session gate opens (9:00 AM IST)
    pub const SESSION_OPEN: &str = "09:00";

    /// Session gate closes (3:40 PM IST)
    pub const SESSION_CLOSE: &str = "15:40";

    /// Minimum spacing between closed-market notices
    pub const CLOSED_NOTICE_INTERVAL_SECS: u64 = super::SECS_PER_HOUR;

    /// Default underlying symbol
    pub const DEFAULT_SYMBOL: &str = "NIFTY";

    /// Default refresh cadence (5 minutes)
    pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;

    /// Indian T-bill proxy used as the risk-free rate
    pub const DEFAULT_RISK_FREE_RATE: f64 = 0.06;
}

/// Upstream HTTP constants
pub mod http {
    /// NSE public site root
    pub const NSE_BASE_URL: &str = "https://www.nseindia.com";

    /// NSE rejects requests without a browser user agent
    pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

    /// Timeout for the cookie warm-up request
    pub const WARMUP_TIMEOUT_SECS: u64 = 5;

    /// Timeout for the option chain request
    pub const REQUEST_TIMEOUT_SECS: u64 = 10;

    /// Telegram Bot API root
    pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

    /// Upper bound on error bodies kept in errors and logs
    pub const MAX_ERROR_BODY_LEN: usize = 256;
}
