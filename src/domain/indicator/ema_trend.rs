//! Volatility-normalized exponential trend signal.
//!
//! Over newest-first closes C, with eta = 1/n:
//!   r[i]    = (C[i] - C[i+1]) / C[i+1]
//!   sigma2  = r[0]^2, then sigma2 = (1-eta)*sigma2 + eta*r[i]^2 for every later return
//!   phi     = sqrt(eta) * r[0] / sqrt(sigma2)
//!   phi     = (1-eta)*phi + sqrt(eta) * r[i] / sigma_prev, then sigma2 updated again
//!
//! The variance pass runs to completion before phi is seeded, and the second
//! pass keeps updating the same sigma2. Values from other implementations
//! of this oscillator only match when that order is kept.

use crate::domain::error::TrendfolioError;
use crate::domain::indicator::{IndicatorType, require_len};
use crate::domain::price::PriceSeries;

pub fn compute_ema_trend(series: &PriceSeries, period: usize) -> Result<f64, TrendfolioError> {
    require_len(series, IndicatorType::EmaTrend(period))?;

    let returns = daily_returns(&series.closes_newest_first());
    let Some(&first) = returns.first() else {
        return Ok(0.0);
    };

    let eta = 1.0 / period as f64;
    let sqrt_eta = eta.sqrt();

    let mut sigma2 = first * first;
    for r in &returns[1..] {
        sigma2 = (1.0 - eta) * sigma2 + eta * r * r;
    }

    let mut phi = if sigma2 > 0.0 {
        sqrt_eta * (first / sigma2.sqrt())
    } else {
        0.0
    };

    for r in &returns[1..] {
        let sigma = sigma2.sqrt();
        if sigma > 0.0 {
            phi = (1.0 - eta) * phi + sqrt_eta * (r / sigma);
        }
        sigma2 = (1.0 - eta) * sigma2 + eta * r * r;
    }

    Ok(phi)
}

/// Single-step returns, newest-first. A non-positive previous close yields 0.
fn daily_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .map(|pair| {
            let (today, yesterday) = (pair[0], pair[1]);
            if yesterday > 0.0 {
                (today - yesterday) / yesterday
            } else {
                0.0
            }
        })
        .collect()
}
