//! CSV file quote adapter.
//!
//! Each ticker lives in `<data_dir>/<TICKER>.csv` with a `date,close` header.
//! An optional `symbols.csv` (`ticker,name,currency,exchange`) backs search.

use crate::domain::error::TrendfolioError;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::quote_port::{QuotePort, SearchResult};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

pub const SYMBOLS_FILE: &str = "symbols.csv";
pub const MAX_SEARCH_RESULTS: usize = 10;

#[derive(Debug, Deserialize)]
struct CloseRecord {
    date: NaiveDate,
    close: f64,
}

pub struct CsvQuoteAdapter {
    data_dir: PathBuf,
    history_window: usize,
}

impl CsvQuoteAdapter {
    pub fn new(data_dir: PathBuf, history_window: usize) -> Self {
        Self {
            data_dir,
            history_window,
        }
    }

    fn read_file(&self, file_name: &str, ticker: &str) -> Result<String, TrendfolioError> {
        let path = self.data_dir.join(file_name);
        fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TrendfolioError::NotFound {
                ticker: ticker.to_string(),
            },
            _ => TrendfolioError::Transient {
                ticker: ticker.to_string(),
                reason: format!("failed to read {}: {}", path.display(), e),
            },
        })
    }
}

fn is_plain_ticker(ticker: &str) -> bool {
    !ticker.is_empty()
        && ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '^'))
        && !ticker.starts_with('.')
}

impl QuotePort for CsvQuoteAdapter {
    fn fetch_series(&self, ticker: &str) -> Result<PriceSeries, TrendfolioError> {
        if !is_plain_ticker(ticker) {
            return Err(TrendfolioError::NotFound {
                ticker: ticker.to_string(),
            });
        }

        let content = self.read_file(&format!("{ticker}.csv"), ticker)?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut points = Vec::new();

        for (line, result) in rdr.deserialize::<CloseRecord>().enumerate() {
            match result {
                Ok(record) if record.close.is_finite() && record.close > 0.0 => {
                    points.push(PricePoint {
                        date: record.date,
                        close: record.close,
                    })
                }
                Ok(record) => {
                    tracing::warn!(
                        ticker,
                        date = %record.date,
                        close = record.close,
                        "skipping non-positive or non-finite close"
                    );
                }
                Err(e) => {
                    tracing::warn!(ticker, row = line + 1, error = %e, "skipping malformed row");
                }
            }
        }

        if points.is_empty() {
            return Err(TrendfolioError::NotFound {
                ticker: ticker.to_string(),
            });
        }

        let mut series = PriceSeries::from_unordered(ticker, points);
        series.truncate_to_window(self.history_window);
        tracing::debug!(ticker, points = series.len(), "loaded price history");
        Ok(series)
    }

    fn search(&self, query: &str) -> Result<Vec<SearchResult>, TrendfolioError> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let content = match self.read_file(SYMBOLS_FILE, SYMBOLS_FILE) {
            Ok(content) => content,
            Err(TrendfolioError::NotFound { .. }) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut results = Vec::new();
        for result in rdr.deserialize::<SearchResult>() {
            let symbol = result.map_err(|e| TrendfolioError::Transient {
                ticker: SYMBOLS_FILE.to_string(),
                reason: format!("CSV parse error: {e}"),
            })?;
            if symbol.ticker.to_lowercase().contains(&query)
                || symbol.name.to_lowercase().contains(&query)
            {
                results.push(symbol);
                if results.len() == MAX_SEARCH_RESULTS {
                    break;
                }
            }
        }
        Ok(results)
    }
}
