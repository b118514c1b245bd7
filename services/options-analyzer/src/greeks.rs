//! Black-Scholes Greeks for European options without dividends

use crate::error::{AnalyzerError, AnalyzerResult};
use crate::model::{GreeksResult, OptionSide};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use services_common::DAYS_PER_YEAR;

const SQRT_2PI: f64 = 2.5066282746310007;

/// Black-Scholes building blocks
#[derive(Debug)]
pub struct BlackScholes;

impl BlackScholes {
    /// Standard normal cumulative distribution function
    pub fn norm_cdf(x: f64) -> f64 {
        0.5 * (1.0 + libm::erf(x / std::f64::consts::SQRT_2))
    }

    /// Standard normal probability density function
    pub fn norm_pdf(x: f64) -> f64 {
        (-0.5 * x * x).exp() / SQRT_2PI
    }

    /// Calculate d1 parameter
    pub fn d1(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
        ((s / k).ln() + (r + 0.5 * sigma * sigma) * t) / (sigma * t.sqrt())
    }

    /// Calculate d2 parameter
    pub fn d2(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
        Self::d1(s, k, r, sigma, t) - sigma * t.sqrt()
    }
}

/// Round to 4 decimal places
fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Compute delta, gamma, vega, theta (per day) and rho, rounded to 4 decimals.
///
/// `volatility` is a fraction (0.20 for 20%). Spot, strike, time and
/// volatility must all be finite and positive; callers skip contracts whose
/// quoted IV is zero instead of calling this.
pub fn compute_greeks(
    side: OptionSide,
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    rate: f64,
    volatility: f64,
) -> AnalyzerResult<GreeksResult> {
    let inputs = [spot, strike, time_to_expiry, volatility];
    if inputs.iter().any(|v| !v.is_finite() || *v <= 0.0) || !rate.is_finite() {
        return Err(AnalyzerError::math_domain(format!(
            "greeks require positive inputs: S={spot} K={strike} T={time_to_expiry} r={rate} sigma={volatility}"
        )));
    }

    let sqrt_t = time_to_expiry.sqrt();
    let d1 = BlackScholes::d1(spot, strike, rate, volatility, time_to_expiry);
    let d2 = d1 - volatility * sqrt_t;
    let npd1 = BlackScholes::norm_pdf(d1);
    let discount = (-rate * time_to_expiry).exp();
    let decay = -(spot * npd1 * volatility) / (2.0 * sqrt_t);

    let (delta, theta, rho) = match side {
        OptionSide::Call => {
            let nd2 = BlackScholes::norm_cdf(d2);
            (
                BlackScholes::norm_cdf(d1),
                decay - rate * strike * discount * nd2,
                strike * time_to_expiry * discount * nd2,
            )
        }
        OptionSide::Put => {
            let n_neg_d2 = BlackScholes::norm_cdf(-d2);
            (
                -BlackScholes::norm_cdf(-d1),
                decay + rate * strike * discount * n_neg_d2,
                -strike * time_to_expiry * discount * n_neg_d2,
            )
        }
    };

    Ok(GreeksResult {
        delta: round4(delta),
        gamma: round4(npd1 / (spot * volatility * sqrt_t)),
        vega: round4(spot * npd1 * sqrt_t / 100.0),
        theta: round4(theta / DAYS_PER_YEAR),
        rho: round4(rho / 100.0),
    })
}

/// Year fraction to expiry: whole days from `now` until expiry midnight in
/// the same offset, floored at one day
pub fn time_to_expiry_years(now: DateTime<FixedOffset>, expiry: NaiveDate) -> f64 {
    let expiry_start = expiry
        .and_hms_opt(0, 0, 0)
        .and_then(|dt| now.offset().from_local_datetime(&dt).single());

    let days = match expiry_start {
        Some(start) => (start - now).num_days().max(1),
        None => 1,
    };
    days as f64 / DAYS_PER_YEAR
}
