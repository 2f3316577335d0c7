//! Quote/history provider port.

use crate::domain::error::TrendfolioError;
use crate::domain::price::PriceSeries;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub ticker: String,
    pub name: String,
    pub currency: String,
    pub exchange: String,
}

pub trait QuotePort {
    /// Daily closes for `ticker`, newest-first, bounded to the provider's window.
    /// Fails with `NotFound` for unknown tickers and `Transient` for outages.
    fn fetch_series(&self, ticker: &str) -> Result<PriceSeries, TrendfolioError>;

    fn search(&self, query: &str) -> Result<Vec<SearchResult>, TrendfolioError>;
}
