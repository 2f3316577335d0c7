//! Portfolio history reconstruction from the allocation log.
//!
//! Replays logged quantities day by day from the first logged decision
//! through `today` and samples every Friday, valuing each strategy's
//! accumulated holdings at the last known close on or before that day.

use crate::domain::allocation::{AllocationDecision, StrategyTag};
use crate::domain::price::{PricePoint, PriceSeries};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Strategies whose logs are replayed; the EMA-trend pair log is symbolic only.
pub const SIMULATED_STRATEGIES: [StrategyTag; 2] =
    [StrategyTag::MaUndervalued, StrategyTag::NaiveProportional];

pub const SAMPLE_WEEKDAY: Weekday = Weekday::Fri;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioHistoryPoint {
    pub date: NaiveDate,
    pub value_per_strategy: BTreeMap<StrategyTag, f64>,
}

impl PortfolioHistoryPoint {
    pub fn value(&self, strategy: StrategyTag) -> f64 {
        self.value_per_strategy
            .get(&strategy)
            .copied()
            .unwrap_or(0.0)
    }
}

/// Oldest-first close history per ticker.
#[derive(Debug, Clone, Default)]
pub struct PriceHistory {
    series: HashMap<String, Vec<PricePoint>>,
}

impl PriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, series: PriceSeries) {
        let series = series.oldest_first();
        self.series.insert(series.ticker, series.points);
    }

    /// Close of the latest point dated on or before `date`, or 0 when there is none.
    pub fn price_on_date(&self, ticker: &str, date: NaiveDate) -> f64 {
        let Some(points) = self.series.get(ticker) else {
            return 0.0;
        };
        let mut last_known = 0.0;
        for point in points {
            if point.date > date {
                break;
            }
            last_known = point.close;
        }
        last_known
    }
}

impl FromIterator<PriceSeries> for PriceHistory {
    fn from_iter<I: IntoIterator<Item = PriceSeries>>(iter: I) -> Self {
        let mut history = PriceHistory::new();
        for series in iter {
            history.insert(series);
        }
        history
    }
}

/// Running per-strategy share counts.
#[derive(Debug, Clone, Default)]
struct ReplayedHoldings {
    quantities: BTreeMap<StrategyTag, BTreeMap<String, f64>>,
}

impl ReplayedHoldings {
    fn apply(&mut self, decision: &AllocationDecision) {
        *self
            .quantities
            .entry(decision.strategy)
            .or_default()
            .entry(decision.ticker.clone())
            .or_insert(0.0) += decision.quantity_delta;
    }

    fn value(&self, strategy: StrategyTag, prices: &PriceHistory, date: NaiveDate) -> f64 {
        self.quantities
            .get(&strategy)
            .map(|held| {
                held.iter()
                    .map(|(ticker, qty)| qty * prices.price_on_date(ticker, date))
                    .sum::<f64>()
            })
            .unwrap_or(0.0)
    }
}

/// Rebuilds weekly equity curves for the replayed strategies.
///
/// `decisions` may come from several collections in any order; entries are
/// stably sorted by timestamp and entries of other strategies are ignored.
pub fn simulate(
    decisions: &[AllocationDecision],
    prices: &PriceHistory,
    today: NaiveDate,
) -> Vec<PortfolioHistoryPoint> {
    let mut log: Vec<&AllocationDecision> = decisions
        .iter()
        .filter(|d| SIMULATED_STRATEGIES.contains(&d.strategy))
        .collect();
    log.sort_by_key(|d| d.timestamp);

    let Some(first) = log.first() else {
        return Vec::new();
    };

    let mut holdings = ReplayedHoldings::default();
    let mut history = Vec::new();
    let mut next_entry = 0;

    let mut day = first.timestamp.date_naive();
    while day <= today {
        while next_entry < log.len() && log[next_entry].timestamp.date_naive() <= day {
            holdings.apply(log[next_entry]);
            next_entry += 1;
        }

        if day.weekday() == SAMPLE_WEEKDAY {
            let value_per_strategy = SIMULATED_STRATEGIES
                .iter()
                .map(|&strategy| (strategy, holdings.value(strategy, prices, day)))
                .collect();
            history.push(PortfolioHistoryPoint {
                date: day,
                value_per_strategy,
            });
        }

        let Some(next_day) = day.succ_opt() else {
            break;
        };
        day = next_day;
    }

    history
}
