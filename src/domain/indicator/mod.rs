//! Technical indicators computed from a holding's price history.
//!
//! - `IndicatorType`: indicator identity + parameters, used in errors and reports
//! - [`sma::compute_sma`]: simple moving average of the most recent closes
//! - [`ema_trend::compute_ema_trend`]: volatility-normalized momentum oscillator
//!
//! Both functions work on the newest-first view of a [`PriceSeries`]
//! and fail with `InsufficientData` when the period is zero or the series is
//! shorter than the period.

pub mod ema_trend;
pub mod sma;

pub use ema_trend::compute_ema_trend;
pub use sma::compute_sma;

use crate::domain::error::TrendfolioError;
use crate::domain::price::PriceSeries;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    EmaTrend(usize),
}

impl IndicatorType {
    pub fn period(&self) -> usize {
        match self {
            IndicatorType::Sma(period) | IndicatorType::EmaTrend(period) => *period,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::EmaTrend(period) => write!(f, "EMA_TREND({})", period),
        }
    }
}

fn require_len(
    series: &PriceSeries,
    indicator: IndicatorType,
) -> Result<(), TrendfolioError> {
    let minimum = indicator.period().max(1);
    if indicator.period() == 0 || series.len() < minimum {
        return Err(TrendfolioError::InsufficientData {
            indicator: indicator.to_string(),
            points: series.len(),
            minimum,
        });
    }
    Ok(())
}
