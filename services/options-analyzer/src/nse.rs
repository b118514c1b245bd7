//! NSE option chain source
//!
//! The upstream payload is loosely shaped JSON. It is deserialized into
//! `Raw*` structs with every field optional, then validated into typed
//! [`ContractQuote`]s by [`ChainSnapshot::from_raw`]. Anything missing fails
//! the pass with [`AnalyzerError::DataShape`].

use crate::error::{AnalyzerError, AnalyzerResult};
use crate::model::{ContractQuote, OptionSide};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use services_common::constants::http;
use std::time::Duration;
use tracing::{debug, info};

/// Date format used by NSE, e.g. `17-Oct-2024`
pub const NSE_DATE_FORMAT: &str = "%d-%b-%Y";

// ============================================================================
// RAW WIRE FORMAT
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawChain {
    pub records: Option<RawRecords>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecords {
    #[serde(default)]
    pub data: Vec<RawStrikeRecord>,
    #[serde(default)]
    pub expiry_dates: Vec<String>,
    pub underlying_value: Option<f64>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawStrikeRecord {
    #[serde(rename = "strikePrice")]
    pub strike_price: Option<f64>,
    #[serde(rename = "expiryDate")]
    pub expiry_date: Option<String>,
    #[serde(rename = "CE")]
    pub call: Option<RawContract>,
    #[serde(rename = "PE")]
    pub put: Option<RawContract>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawContract {
    pub strike_price: Option<f64>,
    pub expiry_date: Option<String>,
    pub last_price: Option<f64>,
    pub implied_volatility: Option<f64>,
    pub open_interest: Option<f64>,
    #[serde(rename = "changeinOpenInterest")]
    pub change_in_open_interest: Option<f64>,
    pub total_traded_volume: Option<f64>,
    pub bid_qty: Option<f64>,
    pub ask_qty: Option<f64>,
}

// ============================================================================
// VALIDATED SNAPSHOT
// ============================================================================

/// Typed snapshot restricted to the nearest expiry
#[derive(Debug, Clone, PartialEq)]
pub struct ChainSnapshot {
    pub expiry: NaiveDate,
    pub spot: f64,
    pub calls: Vec<ContractQuote>,
    pub puts: Vec<ContractQuote>,
}

pub fn parse_nse_date(value: &str) -> AnalyzerResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), NSE_DATE_FORMAT)
        .map_err(|e| AnalyzerError::data_shape(format!("invalid expiry date '{value}': {e}")))
}

fn required(value: Option<f64>, field: &str, side: OptionSide, strike: f64) -> AnalyzerResult<f64> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(v) => Err(AnalyzerError::data_shape(format!(
            "{side} {strike}: field '{field}' is not finite ({v})"
        ))),
        None => Err(AnalyzerError::data_shape(format!(
            "{side} {strike}: missing field '{field}'"
        ))),
    }
}

fn required_count(value: Option<f64>, field: &str, side: OptionSide, strike: f64) -> AnalyzerResult<u64> {
    let v = required(value, field, side, strike)?;
    if v < 0.0 {
        return Err(AnalyzerError::data_shape(format!(
            "{side} {strike}: field '{field}' is negative ({v})"
        )));
    }
    if v.fract() != 0.0 {
        return Err(AnalyzerError::data_shape(format!(
            "{side} {strike}: field '{field}' is not a whole count ({v})"
        )));
    }
    Ok(v as u64)
}

impl ContractQuote {
    /// Validate one raw side. Greeks are attached later by the pipeline.
    pub fn from_raw(raw: &RawContract, side: OptionSide, expiry: NaiveDate) -> AnalyzerResult<Self> {
        let strike = raw
            .strike_price
            .filter(|s| s.is_finite() && *s > 0.0)
            .ok_or_else(|| AnalyzerError::data_shape(format!("{side}: missing or invalid 'strikePrice'")))?;

        Ok(Self {
            side,
            strike,
            last_price: required(raw.last_price, "lastPrice", side, strike)?,
            implied_volatility: required(raw.implied_volatility, "impliedVolatility", side, strike)?,
            open_interest: required(raw.open_interest, "openInterest", side, strike)?,
            change_in_oi: required(raw.change_in_open_interest, "changeinOpenInterest", side, strike)?,
            volume: required_count(raw.total_traded_volume, "totalTradedVolume", side, strike)?,
            bid_qty: required_count(raw.bid_qty, "bidQty", side, strike)?,
            ask_qty: required_count(raw.ask_qty, "askQty", side, strike)?,
            expiry,
            greeks: None,
        })
    }
}

impl ChainSnapshot {
    /// Keep only contracts on the first listed expiry and validate them
    pub fn from_raw(raw: RawChain) -> AnalyzerResult<Self> {
        let records = raw
            .records
            .ok_or_else(|| AnalyzerError::data_shape("payload has no 'records'"))?;

        let expiry_label = records
            .expiry_dates
            .first()
            .ok_or_else(|| AnalyzerError::data_shape("no expiry dates listed"))?
            .clone();
        let expiry = parse_nse_date(&expiry_label)?;

        let spot = records
            .underlying_value
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or_else(|| AnalyzerError::data_shape("missing or invalid 'underlyingValue'"))?;

        let mut calls = Vec::new();
        let mut puts = Vec::new();

        for record in &records.data {
            for (side, contract) in [(OptionSide::Call, &record.call), (OptionSide::Put, &record.put)] {
                let Some(contract) = contract else { continue };
                let contract_expiry = contract
                    .expiry_date
                    .as_deref()
                    .ok_or_else(|| AnalyzerError::data_shape(format!("{side}: missing 'expiryDate'")))?;
                if contract_expiry != expiry_label {
                    continue;
                }

                let quote = ContractQuote::from_raw(contract, side, expiry)?;
                match side {
                    OptionSide::Call => calls.push(quote),
                    OptionSide::Put => puts.push(quote),
                }
            }
        }

        if calls.is_empty() || puts.is_empty() {
            return Err(AnalyzerError::data_shape(format!(
                "no contracts found for expiry {expiry_label} ({} calls, {} puts)",
                calls.len(),
                puts.len()
            )));
        }

        debug!(
            "Parsed chain for {}: spot={} calls={} puts={}",
            expiry_label,
            spot,
            calls.len(),
            puts.len()
        );

        Ok(Self { expiry, spot, calls, puts })
    }
}

// ============================================================================
// SOURCE
// ============================================================================

/// Anything that can produce a raw chain for an underlying
#[async_trait]
pub trait ChainSource: Send + Sync {
    async fn fetch_chain(&self, symbol: &str) -> AnalyzerResult<RawChain>;
}

/// Connection settings for [`NseClient`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NseConfig {
    pub base_url: String,
    pub user_agent: String,
    pub warmup_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for NseConfig {
    fn default() -> Self {
        Self {
            base_url: http::NSE_BASE_URL.to_string(),
            user_agent: http::BROWSER_USER_AGENT.to_string(),
            warmup_timeout_secs: http::WARMUP_TIMEOUT_SECS,
            request_timeout_secs: http::REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Public NSE option chain endpoint. The site only serves the API to
/// clients holding cookies from a prior page load, so every fetch first
/// warms the cookie store with a request to the site root.
pub struct NseClient {
    config: NseConfig,
    client: Client,
}

impl NseClient {
    pub fn new(config: NseConfig) -> AnalyzerResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .map_err(|e| AnalyzerError::Configuration {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self { config, client })
    }

    fn chain_url(&self, symbol: &str) -> String {
        format!(
            "{}/api/option-chain-indices?symbol={}",
            self.config.base_url.trim_end_matches('/'),
            symbol
        )
    }
}

#[async_trait]
impl ChainSource for NseClient {
    async fn fetch_chain(&self, symbol: &str) -> AnalyzerResult<RawChain> {
        self.client
            .get(&self.config.base_url)
            .timeout(Duration::from_secs(self.config.warmup_timeout_secs))
            .send()
            .await?;

        let response = self
            .client
            .get(self.chain_url(symbol))
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalyzerError::upstream(format!(
                "option chain request for {symbol} returned {status}"
            )));
        }

        let body = response.text().await?;
        let chain: RawChain = serde_json::from_str(&body)
            .map_err(|e| AnalyzerError::upstream(format!("malformed option chain JSON: {e}")))?;

        info!("Fetched option chain for {} ({} bytes)", symbol, body.len());
        Ok(chain)
    }
}
