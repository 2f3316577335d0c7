//! Engine settings read from configuration, validated before any run.

use crate::domain::budget::DEFAULT_BUDGET_AMOUNT;
use crate::domain::error::TrendfolioError;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_SMA_PERIOD: usize = 200;
pub const DEFAULT_EMA_TREND_PERIOD: usize = 112;
pub const DEFAULT_HISTORY_WINDOW: usize = 250;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub sma_period: usize,
    pub ema_trend_period: usize,
    pub history_window: usize,
    /// Budget restored after every allocation run that invested.
    pub replenish_amount: f64,
    /// Budget used when no budget has been stored yet.
    pub initial_budget: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            sma_period: DEFAULT_SMA_PERIOD,
            ema_trend_period: DEFAULT_EMA_TREND_PERIOD,
            history_window: DEFAULT_HISTORY_WINDOW,
            replenish_amount: DEFAULT_BUDGET_AMOUNT,
            initial_budget: DEFAULT_BUDGET_AMOUNT,
        }
    }
}

impl EngineSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TrendfolioError> {
        let sma_period = positive_int(config, "indicators", "sma_period", DEFAULT_SMA_PERIOD)?;
        let ema_trend_period = positive_int(
            config,
            "indicators",
            "ema_trend_period",
            DEFAULT_EMA_TREND_PERIOD,
        )?;
        let history_window =
            positive_int(config, "quotes", "history_window", DEFAULT_HISTORY_WINDOW)?;

        let longest = sma_period.max(ema_trend_period);
        if history_window < longest {
            return Err(invalid(
                "quotes",
                "history_window",
                format!("history_window must cover the longest indicator period ({longest})"),
            ));
        }

        let replenish_amount =
            non_negative(config, "allocation", "replenish_amount", DEFAULT_BUDGET_AMOUNT)?;
        let initial_budget =
            non_negative(config, "allocation", "initial_budget", DEFAULT_BUDGET_AMOUNT)?;

        Ok(Self {
            sma_period,
            ema_trend_period,
            history_window,
            replenish_amount,
            initial_budget,
        })
    }
}

/// Reads a required string key.
pub fn require_string(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, TrendfolioError> {
    config
        .get_string(section, key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| TrendfolioError::ConfigMissing {
            section: section.into(),
            key: key.into(),
        })
}

fn positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, TrendfolioError> {
    let value = config.get_int(section, key, default as i64);
    if value <= 0 {
        return Err(invalid(section, key, format!("{key} must be positive")));
    }
    Ok(value as usize)
}

fn non_negative(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, TrendfolioError> {
    let value = config.get_double(section, key, default);
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(section, key, format!("{key} must be non-negative")));
    }
    Ok(value)
}

fn invalid(section: &str, key: &str, reason: String) -> TrendfolioError {
    TrendfolioError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}
