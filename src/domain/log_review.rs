//! Summaries over the allocation log for review screens.

use super::allocation::{LogEntry, StrategyTag};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct LogSummary {
    pub total_investments: usize,
    pub total_amount: f64,
    /// Ticker with the most log entries and its entry count.
    pub most_frequent: Option<(String, usize)>,
    /// Ticker with the largest positive summed investment and that sum.
    pub highest_invested: Option<(String, f64)>,
}

impl LogSummary {
    /// Ties are resolved in ticker order: the alphabetically first ticker wins.
    pub fn compute(entries: &[LogEntry]) -> Self {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        let mut amounts: BTreeMap<&str, f64> = BTreeMap::new();
        let mut total_amount = 0.0;

        for entry in entries {
            let d = &entry.decision;
            total_amount += d.invested_amount;
            *counts.entry(d.ticker.as_str()).or_insert(0) += 1;
            *amounts.entry(d.ticker.as_str()).or_insert(0.0) += d.invested_amount;
        }

        let mut most_frequent: Option<(String, usize)> = None;
        for (ticker, count) in counts {
            if most_frequent.as_ref().is_none_or(|(_, best)| count > *best) {
                most_frequent = Some((ticker.to_string(), count));
            }
        }

        let mut highest_invested: Option<(String, f64)> = None;
        for (ticker, amount) in amounts {
            let best = highest_invested.as_ref().map_or(0.0, |(_, v)| *v);
            if amount > best {
                highest_invested = Some((ticker.to_string(), amount));
            }
        }

        LogSummary {
            total_investments: entries.len(),
            total_amount,
            most_frequent,
            highest_invested,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerSummary {
    pub ticker: String,
    pub entries: usize,
    pub invested: f64,
    pub quantity: f64,
}

impl TickerSummary {
    /// Per-ticker totals for one strategy, sorted by ticker.
    pub fn compute_per_ticker(entries: &[LogEntry], strategy: StrategyTag) -> Vec<TickerSummary> {
        let mut by_ticker: BTreeMap<&str, TickerSummary> = BTreeMap::new();
        for entry in entries.iter().filter(|e| e.decision.strategy == strategy) {
            let d = &entry.decision;
            let summary = by_ticker
                .entry(d.ticker.as_str())
                .or_insert_with(|| TickerSummary {
                    ticker: d.ticker.clone(),
                    entries: 0,
                    invested: 0.0,
                    quantity: 0.0,
                });
            summary.entries += 1;
            summary.invested += d.invested_amount;
            summary.quantity += d.quantity_delta;
        }
        by_ticker.into_values().collect()
    }
}

/// Groups entries by batch id, keeping each batch's entries in input order.
pub fn group_by_batch(entries: &[LogEntry]) -> BTreeMap<u64, Vec<LogEntry>> {
    let mut batches: BTreeMap<u64, Vec<LogEntry>> = BTreeMap::new();
    for entry in entries {
        batches
            .entry(entry.decision.batch_id)
            .or_default()
            .push(entry.clone());
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::allocation::AllocationDecision;
    use chrono::{TimeZone, Utc};

    fn entry(id: i64, ticker: &str, batch: u64, amount: f64, strategy: StrategyTag) -> LogEntry {
        LogEntry {
            id,
            decision: AllocationDecision {
                ticker: ticker.to_string(),
                name: ticker.to_string(),
                batch_id: batch,
                invested_amount: amount,
                price_per_share: 10.0,
                quantity_delta: amount / 10.0,
                strategy,
                timestamp: Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap(),
            },
        }
    }

    fn sample_log() -> Vec<LogEntry> {
        vec![
            entry(1, "SAP", 1, 60.0, StrategyTag::MaUndervalued),
            entry(2, "ASML", 1, 40.0, StrategyTag::MaUndervalued),
            entry(3, "SAP", 2, 30.0, StrategyTag::NaiveProportional),
            entry(4, "ASML", 2, 70.0, StrategyTag::NaiveProportional),
            entry(5, "MC", 2, -10.0, StrategyTag::EmaTrendPair),
        ]
    }

    #[test]
    fn summary_totals() {
        let summary = LogSummary::compute(&sample_log());
        assert_eq!(summary.total_investments, 5);
        assert!((summary.total_amount - 190.0).abs() < 1e-9);
    }

    #[test]
    fn most_frequent_tie_goes_to_first_ticker() {
        let summary = LogSummary::compute(&sample_log());
        assert_eq!(summary.most_frequent, Some(("ASML".to_string(), 2)));
    }

    #[test]
    fn highest_invested() {
        let summary = LogSummary::compute(&sample_log());
        let (ticker, amount) = summary.highest_invested.unwrap();
        assert_eq!(ticker, "ASML");
        assert!((amount - 110.0).abs() < 1e-9);
    }

    #[test]
    fn empty_log_summary() {
        let summary = LogSummary::compute(&[]);
        assert_eq!(summary.total_investments, 0);
        assert_eq!(summary.total_amount, 0.0);
        assert!(summary.most_frequent.is_none());
        assert!(summary.highest_invested.is_none());
    }

    #[test]
    fn only_sells_have_no_highest_invested() {
        let log = vec![entry(1, "MC", 1, -10.0, StrategyTag::EmaTrendPair)];
        let summary = LogSummary::compute(&log);
        assert!(summary.highest_invested.is_none());
        assert_eq!(summary.most_frequent, Some(("MC".to_string(), 1)));
    }

    #[test]
    fn per_ticker_filters_strategy() {
        let per_ticker =
            TickerSummary::compute_per_ticker(&sample_log(), StrategyTag::NaiveProportional);
        assert_eq!(per_ticker.len(), 2);
        assert_eq!(per_ticker[0].ticker, "ASML");
        assert_eq!(per_ticker[0].entries, 1);
        assert!((per_ticker[0].invested - 70.0).abs() < 1e-9);
        assert!((per_ticker[1].quantity - 3.0).abs() < 1e-9);
    }

    #[test]
    fn batches_are_grouped() {
        let batches = group_by_batch(&sample_log());
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[&1].len(), 2);
        let ids: Vec<_> = batches[&2].iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 4, 5]);
    }
}
