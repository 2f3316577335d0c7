//! Allocation strategies that turn indicator values into buy/sell decisions.
//!
//! Three independent strategies read the same ticker-sorted holdings snapshot
//! and budget, and each writes its own decision log:
//! - [`ma_undervalued`]: buys holdings trading below their SMA200 and mutates them
//! - [`naive_proportional`]: logging-only baseline weighted by market value
//! - [`ema_trend_pair`]: logging-only sell/buy pair picked by EMA-trend

pub mod ema_trend_pair;
pub mod ma_undervalued;
pub mod naive_proportional;

use crate::domain::budget::BudgetState;
use crate::domain::holding::{Holding, sort_by_ticker};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyTag {
    MaUndervalued,
    NaiveProportional,
    EmaTrendPair,
}

impl StrategyTag {
    pub const ALL: [StrategyTag; 3] = [
        StrategyTag::MaUndervalued,
        StrategyTag::NaiveProportional,
        StrategyTag::EmaTrendPair,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyTag::MaUndervalued => "ma-undervalued",
            StrategyTag::NaiveProportional => "naive-proportional",
            StrategyTag::EmaTrendPair => "ema-trend-pair",
        }
    }
}

impl fmt::Display for StrategyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown strategy tag: {0}")]
pub struct UnknownStrategyTag(pub String);

impl FromStr for StrategyTag {
    type Err = UnknownStrategyTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| UnknownStrategyTag(s.to_string()))
    }
}

/// One buy (or symbolic sell) produced by an allocation run. Immutable once logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationDecision {
    pub ticker: String,
    pub name: String,
    pub batch_id: u64,
    pub invested_amount: f64,
    pub price_per_share: f64,
    pub quantity_delta: f64,
    pub strategy: StrategyTag,
    pub timestamp: DateTime<Utc>,
}

/// A decision as persisted by a log store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub decision: AllocationDecision,
}

/// Shared read-only view handed to every strategy.
#[derive(Debug, Clone)]
pub struct AllocationInput<'a> {
    pub holdings: &'a [Holding],
    pub budget: f64,
    pub batch_id: u64,
    pub timestamp: DateTime<Utc>,
}

impl AllocationInput<'_> {
    fn decision(
        &self,
        holding: &Holding,
        invested_amount: f64,
        quantity_delta: f64,
        strategy: StrategyTag,
    ) -> AllocationDecision {
        AllocationDecision {
            ticker: holding.ticker.clone(),
            name: holding.name.clone(),
            batch_id: self.batch_id,
            invested_amount,
            price_per_share: holding.current_price,
            quantity_delta,
            strategy,
            timestamp: self.timestamp,
        }
    }
}

/// Shares bought for `invested` at `price`; 0 when the price is unusable.
fn quantity_for(invested: f64, price: f64) -> f64 {
    if price > 0.0 { invested / price } else { 0.0 }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationPlan {
    pub batch_id: u64,
    pub ma_undervalued: Vec<AllocationDecision>,
    pub naive_proportional: Vec<AllocationDecision>,
    pub ema_trend_pair: Vec<AllocationDecision>,
    /// Ticker-sorted holdings after the MA-undervalued strategy ran.
    pub holdings: Vec<Holding>,
    pub budget_after: BudgetState,
    pub rolled_over: bool,
}

impl AllocationPlan {
    pub fn decisions(&self, strategy: StrategyTag) -> &[AllocationDecision] {
        match strategy {
            StrategyTag::MaUndervalued => &self.ma_undervalued,
            StrategyTag::NaiveProportional => &self.naive_proportional,
            StrategyTag::EmaTrendPair => &self.ema_trend_pair,
        }
    }

    pub fn all_decisions(&self) -> impl Iterator<Item = &AllocationDecision> {
        self.ma_undervalued
            .iter()
            .chain(&self.naive_proportional)
            .chain(&self.ema_trend_pair)
    }

    pub fn total_invested(&self, strategy: StrategyTag) -> f64 {
        self.decisions(strategy)
            .iter()
            .map(|d| d.invested_amount)
            .sum()
    }

    /// Holdings whose stored state differs from `before` (matched by ticker).
    pub fn changed_holdings<'a>(&'a self, before: &[Holding]) -> Vec<&'a Holding> {
        self.holdings
            .iter()
            .filter(|after| {
                before
                    .iter()
                    .find(|b| b.ticker == after.ticker)
                    .is_none_or(|b| b != *after)
            })
            .collect()
    }
}

/// Runs all three strategies for one batch.
///
/// `budget.amount` is the cash to distribute and `budget.next_batch_id` the
/// batch id stamped on every decision. The budget is only replenished when the
/// MA-undervalued strategy actually invested; otherwise it rolls over.
pub fn allocate(
    holdings: &[Holding],
    budget: &BudgetState,
    replenish_amount: f64,
    timestamp: DateTime<Utc>,
) -> AllocationPlan {
    let mut snapshot = holdings.to_vec();
    sort_by_ticker(&mut snapshot);

    let input = AllocationInput {
        holdings: &snapshot,
        budget: budget.amount,
        batch_id: budget.next_batch_id,
        timestamp,
    };

    let ma = ma_undervalued::run(&input);
    let naive = naive_proportional::run(&input);
    let ema = ema_trend_pair::run(&input);

    let budget_after = if ma.rolled_over {
        tracing::info!(
            batch = budget.next_batch_id,
            amount = budget.amount,
            "no holding eligible below its moving average, budget rolls over"
        );
        *budget
    } else {
        budget.replenished(replenish_amount)
    };

    AllocationPlan {
        batch_id: budget.next_batch_id,
        ma_undervalued: ma.decisions,
        naive_proportional: naive,
        ema_trend_pair: ema,
        holdings: ma.holdings,
        budget_after,
        rolled_over: ma.rolled_over,
    }
}
