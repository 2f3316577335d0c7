//! SQLite persistence for holdings, the allocation log and the budget.

use crate::domain::allocation::{AllocationDecision, LogEntry, StrategyTag};
use crate::domain::budget::BudgetState;
use crate::domain::error::TrendfolioError;
use crate::domain::holding::Holding;
use crate::domain::settings::require_string;
use crate::ports::budget_port::BudgetStore;
use crate::ports::config_port::ConfigPort;
use crate::ports::holding_port::HoldingStore;
use crate::ports::log_port::LogStore;
use chrono::{DateTime, SecondsFormat, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, params};

pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

fn query_err(e: rusqlite::Error) -> TrendfolioError {
    TrendfolioError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn conversion_err(column: usize, reason: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        reason.into(),
    )
}

/// Fixed-width UTC timestamps so lexical order matches chronological order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(column: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| conversion_err(column, e.to_string()))
}

const LOG_COLUMNS: &str = "id, strategy, ticker, name, batch_id, invested_amount, \
                           price_per_share, quantity_delta, timestamp";

fn log_entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LogEntry> {
    let strategy: String = row.get(1)?;
    let strategy = strategy
        .parse::<StrategyTag>()
        .map_err(|e| conversion_err(1, e.to_string()))?;
    let batch_id: i64 = row.get(4)?;
    let timestamp: String = row.get(8)?;
    Ok(LogEntry {
        id: row.get(0)?,
        decision: AllocationDecision {
            ticker: row.get(2)?,
            name: row.get(3)?,
            batch_id: batch_id.max(0) as u64,
            invested_amount: row.get(5)?,
            price_per_share: row.get(6)?,
            quantity_delta: row.get(7)?,
            strategy,
            timestamp: parse_timestamp(8, &timestamp)?,
        },
    })
}

impl SqliteStore {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TrendfolioError> {
        let db_path = require_string(config, "sqlite", "path")?;
        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| TrendfolioError::Database {
                    reason: e.to_string(),
                })?;

        tracing::debug!(path = %db_path, pool_size, "opened sqlite store");
        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, TrendfolioError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| TrendfolioError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, TrendfolioError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| TrendfolioError::Database {
                reason: e.to_string(),
            })
    }

    pub fn initialize_schema(&self) -> Result<(), TrendfolioError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS holdings (
                ticker TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                quantity REAL NOT NULL DEFAULT 0,
                average_cost REAL NOT NULL DEFAULT 0,
                current_price REAL NOT NULL DEFAULT 0,
                sma200 REAL NOT NULL DEFAULT 0,
                ema_trend REAL NOT NULL DEFAULT 0,
                recommendation TEXT NOT NULL DEFAULT ''
            );
            CREATE TABLE IF NOT EXISTS allocation_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                strategy TEXT NOT NULL,
                ticker TEXT NOT NULL,
                name TEXT NOT NULL,
                batch_id INTEGER NOT NULL,
                invested_amount REAL NOT NULL,
                price_per_share REAL NOT NULL,
                quantity_delta REAL NOT NULL,
                timestamp TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_allocation_log_strategy ON allocation_log(strategy);
            CREATE INDEX IF NOT EXISTS idx_allocation_log_batch ON allocation_log(batch_id);
            CREATE TABLE IF NOT EXISTS budget (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                amount REAL NOT NULL,
                next_batch_id INTEGER NOT NULL
            );",
        )
        .map_err(query_err)?;

        Ok(())
    }
}

impl HoldingStore for SqliteStore {
    fn load_all(&self) -> Result<Vec<Holding>, TrendfolioError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT ticker, name, quantity, average_cost, current_price, sma200,
                        ema_trend, recommendation
                 FROM holdings ORDER BY ticker",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(Holding {
                    ticker: row.get(0)?,
                    name: row.get(1)?,
                    quantity: row.get(2)?,
                    average_cost: row.get(3)?,
                    current_price: row.get(4)?,
                    sma200: row.get(5)?,
                    ema_trend: row.get(6)?,
                    recommendation: row.get(7)?,
                })
            })
            .map_err(query_err)?;

        let mut holdings = Vec::new();
        for row in rows {
            holdings.push(row.map_err(query_err)?);
        }
        Ok(holdings)
    }

    fn save(&self, holding: &Holding) -> Result<(), TrendfolioError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO holdings
                (ticker, name, quantity, average_cost, current_price, sma200, ema_trend, recommendation)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                holding.ticker,
                holding.name,
                holding.quantity,
                holding.average_cost,
                holding.current_price,
                holding.sma200,
                holding.ema_trend,
                holding.recommendation
            ],
        )
        .map_err(query_err)?;
        Ok(())
    }

    fn delete(&self, ticker: &str) -> Result<bool, TrendfolioError> {
        let conn = self.conn()?;
        let removed = conn
            .execute("DELETE FROM holdings WHERE ticker = ?1", params![ticker])
            .map_err(query_err)?;
        Ok(removed > 0)
    }
}

impl LogStore for SqliteStore {
    fn append(&self, decision: &AllocationDecision) -> Result<i64, TrendfolioError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO allocation_log
                (strategy, ticker, name, batch_id, invested_amount, price_per_share,
                 quantity_delta, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                decision.strategy.as_str(),
                decision.ticker,
                decision.name,
                decision.batch_id as i64,
                decision.invested_amount,
                decision.price_per_share,
                decision.quantity_delta,
                format_timestamp(&decision.timestamp)
            ],
        )
        .map_err(query_err)?;
        Ok(conn.last_insert_rowid())
    }

    fn list(&self, strategy: StrategyTag) -> Result<Vec<LogEntry>, TrendfolioError> {
        let conn = self.conn()?;
        let query = format!(
            "SELECT {LOG_COLUMNS} FROM allocation_log
             WHERE strategy = ?1
             ORDER BY batch_id ASC, timestamp ASC, id ASC"
        );
        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let rows = stmt
            .query_map(params![strategy.as_str()], log_entry_from_row)
            .map_err(query_err)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(query_err)?);
        }
        Ok(entries)
    }

    fn delete(&self, id: i64) -> Result<bool, TrendfolioError> {
        let conn = self.conn()?;
        let removed = conn
            .execute("DELETE FROM allocation_log WHERE id = ?1", params![id])
            .map_err(query_err)?;
        Ok(removed > 0)
    }

    fn delete_batch(&self, batch_id: u64) -> Result<usize, TrendfolioError> {
        let conn = self.conn()?;
        let removed = conn
            .execute(
                "DELETE FROM allocation_log WHERE batch_id = ?1",
                params![batch_id as i64],
            )
            .map_err(query_err)?;
        tracing::info!(batch_id, removed, "deleted allocation batch");
        Ok(removed)
    }
}

impl BudgetStore for SqliteStore {
    fn load(&self) -> Result<Option<BudgetState>, TrendfolioError> {
        let conn = self.conn()?;
        let row: Option<(f64, i64)> = conn
            .query_row(
                "SELECT amount, next_batch_id FROM budget WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(query_err)?;

        Ok(row.map(|(amount, next_batch_id)| BudgetState {
            amount,
            next_batch_id: next_batch_id.max(0) as u64,
        }))
    }

    fn save(&self, state: &BudgetState) -> Result<(), TrendfolioError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO budget (id, amount, next_batch_id) VALUES (1, ?1, ?2)",
            params![state.amount, state.next_batch_id as i64],
        )
        .map_err(query_err)?;
        Ok(())
    }
}
