#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::cell::RefCell;
use std::collections::HashMap;
use trendfolio::domain::allocation::{AllocationDecision, LogEntry, StrategyTag};
use trendfolio::domain::budget::BudgetState;
use trendfolio::domain::error::TrendfolioError;
use trendfolio::domain::holding::Holding;
use trendfolio::domain::price::{PricePoint, PriceSeries};
use trendfolio::ports::budget_port::BudgetStore;
use trendfolio::ports::holding_port::HoldingStore;
use trendfolio::ports::log_port::LogStore;
use trendfolio::ports::quote_port::{QuotePort, SearchResult};

pub struct MockQuotePort {
    pub series: HashMap<String, PriceSeries>,
    pub errors: HashMap<String, String>,
    pub io_errors: Vec<String>,
}

impl MockQuotePort {
    pub fn new() -> Self {
        Self {
            series: HashMap::new(),
            errors: HashMap::new(),
            io_errors: Vec::new(),
        }
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.series.insert(series.ticker.clone(), series);
        self
    }

    /// Daily closes ending on `last`, given oldest-first.
    pub fn with_closes(self, ticker: &str, last: NaiveDate, oldest_first: &[f64]) -> Self {
        self.with_series(series_ending(ticker, last, oldest_first))
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }

    /// Fails with an I/O error, which is not a quote-provider error.
    pub fn with_io_error(mut self, ticker: &str) -> Self {
        self.io_errors.push(ticker.to_string());
        self
    }
}

impl QuotePort for MockQuotePort {
    fn fetch_series(&self, ticker: &str) -> Result<PriceSeries, TrendfolioError> {
        if self.io_errors.iter().any(|t| t == ticker) {
            return Err(TrendfolioError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "permission denied",
            )));
        }
        if let Some(reason) = self.errors.get(ticker) {
            return Err(TrendfolioError::Transient {
                ticker: ticker.to_string(),
                reason: reason.clone(),
            });
        }
        self.series
            .get(ticker)
            .cloned()
            .ok_or_else(|| TrendfolioError::NotFound {
                ticker: ticker.to_string(),
            })
    }

    fn search(&self, query: &str) -> Result<Vec<SearchResult>, TrendfolioError> {
        let query = query.to_lowercase();
        let mut tickers: Vec<&String> = self
            .series
            .keys()
            .filter(|t| t.to_lowercase().contains(&query))
            .collect();
        tickers.sort();
        Ok(tickers
            .into_iter()
            .map(|t| SearchResult {
                ticker: t.clone(),
                name: t.clone(),
                currency: "EUR".into(),
                exchange: "TEST".into(),
            })
            .collect())
    }
}

/// In-memory implementation of all three stores with write-failure injection.
#[derive(Default)]
pub struct MemoryStore {
    pub holdings: RefCell<Vec<Holding>>,
    pub log: RefCell<Vec<LogEntry>>,
    pub budget: RefCell<Option<BudgetState>>,
    pub next_id: RefCell<i64>,
    pub failing_holdings: Vec<String>,
    pub failing_log_tickers: Vec<String>,
    pub fail_budget_save: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_holdings(self, holdings: Vec<Holding>) -> Self {
        *self.holdings.borrow_mut() = holdings;
        self
    }

    pub fn with_budget(self, state: BudgetState) -> Self {
        *self.budget.borrow_mut() = Some(state);
        self
    }

    pub fn failing_holding(mut self, ticker: &str) -> Self {
        self.failing_holdings.push(ticker.to_string());
        self
    }

    pub fn failing_log_for(mut self, ticker: &str) -> Self {
        self.failing_log_tickers.push(ticker.to_string());
        self
    }

    pub fn failing_budget(mut self) -> Self {
        self.fail_budget_save = true;
        self
    }

    pub fn holding(&self, ticker: &str) -> Option<Holding> {
        self.holdings
            .borrow()
            .iter()
            .find(|h| h.ticker == ticker)
            .cloned()
    }

    pub fn stored_budget(&self) -> Option<BudgetState> {
        *self.budget.borrow()
    }

    fn write_error(what: &str) -> TrendfolioError {
        TrendfolioError::DatabaseQuery {
            reason: format!("injected failure writing {what}"),
        }
    }
}

impl HoldingStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<Holding>, TrendfolioError> {
        Ok(self.holdings.borrow().clone())
    }

    fn save(&self, holding: &Holding) -> Result<(), TrendfolioError> {
        if self.failing_holdings.contains(&holding.ticker) {
            return Err(Self::write_error(&holding.ticker));
        }
        let mut holdings = self.holdings.borrow_mut();
        match holdings.iter_mut().find(|h| h.ticker == holding.ticker) {
            Some(existing) => *existing = holding.clone(),
            None => holdings.push(holding.clone()),
        }
        Ok(())
    }

    fn delete(&self, ticker: &str) -> Result<bool, TrendfolioError> {
        let mut holdings = self.holdings.borrow_mut();
        let before = holdings.len();
        holdings.retain(|h| h.ticker != ticker);
        Ok(holdings.len() != before)
    }
}

impl LogStore for MemoryStore {
    fn append(&self, decision: &AllocationDecision) -> Result<i64, TrendfolioError> {
        if self.failing_log_tickers.contains(&decision.ticker) {
            return Err(Self::write_error(&decision.ticker));
        }
        let mut next_id = self.next_id.borrow_mut();
        *next_id += 1;
        self.log.borrow_mut().push(LogEntry {
            id: *next_id,
            decision: decision.clone(),
        });
        Ok(*next_id)
    }

    fn list(&self, strategy: StrategyTag) -> Result<Vec<LogEntry>, TrendfolioError> {
        let mut entries: Vec<LogEntry> = self
            .log
            .borrow()
            .iter()
            .filter(|e| e.decision.strategy == strategy)
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.decision.batch_id, e.decision.timestamp, e.id));
        Ok(entries)
    }

    fn delete(&self, id: i64) -> Result<bool, TrendfolioError> {
        let mut log = self.log.borrow_mut();
        let before = log.len();
        log.retain(|e| e.id != id);
        Ok(log.len() != before)
    }

    fn delete_batch(&self, batch_id: u64) -> Result<usize, TrendfolioError> {
        let mut log = self.log.borrow_mut();
        let before = log.len();
        log.retain(|e| e.decision.batch_id != batch_id);
        Ok(before - log.len())
    }
}

impl BudgetStore for MemoryStore {
    fn load(&self) -> Result<Option<BudgetState>, TrendfolioError> {
        Ok(*self.budget.borrow())
    }

    fn save(&self, state: &BudgetState) -> Result<(), TrendfolioError> {
        if self.fail_budget_save {
            return Err(Self::write_error("budget"));
        }
        *self.budget.borrow_mut() = Some(*state);
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, hour, 0, 0).unwrap()
}

/// One close per calendar day ending on `last`.
pub fn series_ending(ticker: &str, last: NaiveDate, oldest_first: &[f64]) -> PriceSeries {
    let n = oldest_first.len() as i64;
    let points = oldest_first
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint {
            date: last - Duration::days(n - 1 - i as i64),
            close,
        })
        .collect();
    PriceSeries::from_unordered(ticker, points)
}

pub fn flat(close: f64, n: usize) -> Vec<f64> {
    vec![close; n]
}

pub fn ramp(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

pub fn holding(ticker: &str, quantity: f64, average_cost: f64) -> Holding {
    let mut h = Holding::new(ticker, format!("{ticker} Corp"));
    h.quantity = quantity;
    h.average_cost = average_cost;
    h
}

/// A holding with analysis results already filled in.
pub fn analyzed(ticker: &str, price: f64, sma200: f64, ema_trend: f64, quantity: f64) -> Holding {
    let mut h = holding(ticker, quantity, price);
    h.current_price = price;
    h.sma200 = sma200;
    h.ema_trend = ema_trend;
    h
}
