//! Request-scoped runs that wire the engines to their ports.
//!
//! Each run loads what it needs, calls the pure engine, and writes results
//! back item by item. A failure on one ticker or one log entry is recorded in
//! the returned report and the loop moves on, so callers must not assume
//! all-or-nothing persistence.

use crate::domain::allocation::{self, AllocationPlan, StrategyTag};
use crate::domain::budget::{BudgetState, FIRST_BATCH_ID, is_zero_amount, parse_amount};
use crate::domain::error::TrendfolioError;
use crate::domain::history::{self, PortfolioHistoryPoint, PriceHistory, SIMULATED_STRATEGIES};
use crate::domain::holding::sort_by_ticker;
use crate::domain::indicator::{IndicatorType, compute_ema_trend, compute_sma};
use crate::domain::settings::EngineSettings;
use crate::ports::budget_port::BudgetStore;
use crate::ports::holding_port::HoldingStore;
use crate::ports::log_port::LogStore;
use crate::ports::quote_port::QuotePort;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub struct ItemResult<T> {
    pub key: String,
    pub outcome: T,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Analyzed {
        current_price: f64,
        sma200: f64,
        ema_trend: f64,
    },
    /// Price stored; the listed indicators kept their previous values.
    PartiallyAnalyzed {
        current_price: f64,
        missing: Vec<IndicatorType>,
    },
    Skipped { reason: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalysisReport {
    pub outcomes: Vec<ItemResult<AnalysisOutcome>>,
}

impl AnalysisReport {
    pub fn analyzed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|r| matches!(r.outcome, AnalysisOutcome::Analyzed { .. }))
            .count()
    }

    /// Tickers that were skipped or could not be saved.
    pub fn problem_tickers(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|r| {
                matches!(
                    r.outcome,
                    AnalysisOutcome::Skipped { .. } | AnalysisOutcome::Failed { .. }
                )
            })
            .map(|r| r.key.as_str())
            .collect()
    }
}

/// Refreshes price and indicators for every stored holding.
pub fn run_analysis(
    quotes: &dyn QuotePort,
    holdings: &dyn HoldingStore,
    settings: &EngineSettings,
) -> Result<AnalysisReport, TrendfolioError> {
    let mut current = holdings.load_all()?;
    sort_by_ticker(&mut current);
    tracing::info!(holdings = current.len(), "analyzing portfolio");

    let mut report = AnalysisReport::default();
    for mut holding in current {
        let series = match quotes.fetch_series(&holding.ticker) {
            Ok(series) if !series.is_empty() => series,
            Ok(_) => {
                tracing::warn!(ticker = %holding.ticker, "skipping: empty price history");
                report.outcomes.push(ItemResult {
                    key: holding.ticker,
                    outcome: AnalysisOutcome::Skipped {
                        reason: "empty price history".into(),
                    },
                });
                continue;
            }
            Err(e) if e.is_quote_error() => {
                tracing::warn!(ticker = %holding.ticker, error = %e, "skipping analysis");
                report.outcomes.push(ItemResult {
                    key: holding.ticker,
                    outcome: AnalysisOutcome::Skipped {
                        reason: e.to_string(),
                    },
                });
                continue;
            }
            Err(e) => {
                tracing::error!(ticker = %holding.ticker, error = %e, "quote lookup failed");
                report.outcomes.push(ItemResult {
                    key: holding.ticker,
                    outcome: AnalysisOutcome::Failed {
                        reason: e.to_string(),
                    },
                });
                continue;
            }
        };

        let mut missing = Vec::new();
        if let Some(price) = series.latest_close() {
            holding.current_price = price;
        }
        match compute_sma(&series, settings.sma_period) {
            Ok(sma) => holding.sma200 = sma,
            Err(e) => {
                tracing::warn!(ticker = %holding.ticker, error = %e, "indicator not updated");
                missing.push(IndicatorType::Sma(settings.sma_period));
            }
        }
        match compute_ema_trend(&series, settings.ema_trend_period) {
            Ok(ema) => holding.ema_trend = ema,
            Err(e) => {
                tracing::warn!(ticker = %holding.ticker, error = %e, "indicator not updated");
                missing.push(IndicatorType::EmaTrend(settings.ema_trend_period));
            }
        }

        let outcome = match holdings.save(&holding) {
            Err(e) => {
                tracing::error!(ticker = %holding.ticker, error = %e, "failed to store analysis");
                AnalysisOutcome::Failed {
                    reason: e.to_string(),
                }
            }
            Ok(()) if missing.is_empty() => {
                tracing::debug!(
                    ticker = %holding.ticker,
                    price = holding.current_price,
                    sma = holding.sma200,
                    ema_trend = holding.ema_trend,
                    "analyzed"
                );
                AnalysisOutcome::Analyzed {
                    current_price: holding.current_price,
                    sma200: holding.sma200,
                    ema_trend: holding.ema_trend,
                }
            }
            Ok(()) => AnalysisOutcome::PartiallyAnalyzed {
                current_price: holding.current_price,
                missing,
            },
        };
        report.outcomes.push(ItemResult {
            key: holding.ticker,
            outcome,
        });
    }

    Ok(report)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteTarget {
    Holding(String),
    LogEntry { strategy: StrategyTag, ticker: String },
    Budget,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteResult {
    pub target: WriteTarget,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationReport {
    pub plan: AllocationPlan,
    pub writes: Vec<WriteResult>,
}

impl AllocationReport {
    pub fn failures(&self) -> impl Iterator<Item = &WriteResult> {
        self.writes.iter().filter(|w| w.error.is_some())
    }

    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }
}

fn record<T>(
    writes: &mut Vec<WriteResult>,
    target: WriteTarget,
    result: Result<T, TrendfolioError>,
) {
    let error = result.err().map(|e| {
        tracing::error!(target = ?target, error = %e, "write failed, continuing");
        e.to_string()
    });
    writes.push(WriteResult { target, error });
}

fn default_budget(settings: &EngineSettings) -> BudgetState {
    let state = BudgetState {
        amount: settings.initial_budget,
        next_batch_id: FIRST_BATCH_ID,
    };
    tracing::info!(amount = state.amount, "no budget stored, creating default");
    state
}

/// Stored budget, or a fresh one seeded from the settings when none exists yet.
pub fn load_or_init_budget(
    budget: &dyn BudgetStore,
    settings: &EngineSettings,
) -> Result<BudgetState, TrendfolioError> {
    if let Some(state) = budget.load()? {
        return Ok(state);
    }
    let state = default_budget(settings);
    budget.save(&state)?;
    Ok(state)
}

/// Runs one allocation batch and persists its holdings, log entries and budget.
pub fn run_allocation(
    holdings: &dyn HoldingStore,
    logs: &dyn LogStore,
    budget: &dyn BudgetStore,
    settings: &EngineSettings,
    now: DateTime<Utc>,
) -> Result<AllocationReport, TrendfolioError> {
    let mut writes = Vec::new();
    let state = match budget.load()? {
        Some(state) => state,
        None => {
            let state = default_budget(settings);
            record(&mut writes, WriteTarget::Budget, budget.save(&state));
            state
        }
    };
    let before = holdings.load_all()?;
    tracing::info!(
        batch = state.next_batch_id,
        budget = state.amount,
        holdings = before.len(),
        "running allocation"
    );

    let plan = allocation::allocate(&before, &state, settings.replenish_amount, now);

    for holding in plan.changed_holdings(&before) {
        record(
            &mut writes,
            WriteTarget::Holding(holding.ticker.clone()),
            holdings.save(holding),
        );
    }

    for decision in plan.all_decisions() {
        record(
            &mut writes,
            WriteTarget::LogEntry {
                strategy: decision.strategy,
                ticker: decision.ticker.clone(),
            },
            logs.append(decision),
        );
    }

    if !plan.rolled_over {
        record(&mut writes, WriteTarget::Budget, budget.save(&plan.budget_after));
    }

    Ok(AllocationReport { plan, writes })
}

/// Replaces the budget amount from user input, keeping the batch counter.
pub fn set_budget(
    budget: &dyn BudgetStore,
    settings: &EngineSettings,
    raw_amount: &str,
) -> Result<BudgetState, TrendfolioError> {
    let current = load_or_init_budget(budget, settings)?;
    let amount = parse_amount(raw_amount);
    if amount == 0.0 && !is_zero_amount(raw_amount) {
        tracing::warn!(input = raw_amount, "invalid budget amount, using 0");
    }
    let updated = current.with_amount(amount);
    budget.save(&updated)?;
    Ok(updated)
}

/// Rebuilds the weekly equity curves of the replayed strategies up to `today`.
pub fn run_history(
    logs: &dyn LogStore,
    quotes: &dyn QuotePort,
    today: NaiveDate,
) -> Result<Vec<PortfolioHistoryPoint>, TrendfolioError> {
    let mut decisions = Vec::new();
    for strategy in SIMULATED_STRATEGIES {
        decisions.extend(logs.list(strategy)?.into_iter().map(|e| e.decision));
    }
    if decisions.is_empty() {
        return Ok(Vec::new());
    }

    let tickers: BTreeSet<&str> = decisions.iter().map(|d| d.ticker.as_str()).collect();
    let mut prices = PriceHistory::new();
    for ticker in tickers {
        match quotes.fetch_series(ticker) {
            Ok(series) => prices.insert(series),
            Err(e) => tracing::warn!(ticker, error = %e, "no price history, valued at 0"),
        }
    }

    Ok(history::simulate(&decisions, &prices, today))
}
