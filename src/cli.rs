//! CLI definition and dispatch.

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvQuoteAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::sqlite_adapter::SqliteStore;
use crate::domain::allocation::{AllocationPlan, LogEntry, StrategyTag};
use crate::domain::error::TrendfolioError;
use crate::domain::history::{PortfolioHistoryPoint, SIMULATED_STRATEGIES};
use crate::domain::holding::{Holding, sort_by_ticker};
use crate::domain::log_review::{LogSummary, TickerSummary, group_by_batch};
use crate::domain::settings::{EngineSettings, require_string};
use crate::domain::workflow::{
    self, AllocationReport, AnalysisOutcome, AnalysisReport, WriteTarget,
};
use crate::logging::{LoggingConfig, init_logging};
use crate::ports::config_port::ConfigPort;
use crate::ports::holding_port::HoldingStore;
use crate::ports::log_port::LogStore;
use crate::ports::quote_port::QuotePort;

#[derive(Parser, Debug)]
#[command(name = "trendfolio", about = "Indicator-driven portfolio allocation")]
pub struct Cli {
    /// INI configuration file
    #[arg(short, long, global = true, default_value = "trendfolio.ini")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Refresh prices, SMA and EMA-trend for every holding
    Analyze,
    /// List holdings with value, P&L and the latest recommendation
    Holdings,
    /// Run one allocation batch over the current budget
    Allocate,
    /// Weekly portfolio value per replayed strategy
    History {
        #[arg(long)]
        json: bool,
        /// Last day to simulate (defaults to today, UTC)
        #[arg(long)]
        until: Option<NaiveDate>,
    },
    /// Show or set the recurring budget
    Budget {
        /// New amount; a decimal comma is accepted
        #[arg(long)]
        set: Option<String>,
    },
    /// Review the allocation log grouped by batch
    Logs {
        #[arg(long)]
        strategy: Option<StrategyTag>,
    },
    /// Delete one allocation log entry
    DeleteLog {
        #[arg(long)]
        id: i64,
    },
    /// Delete every log entry of a batch
    DeleteBatch {
        #[arg(long)]
        batch: u64,
    },
    /// Add a holding
    Add {
        #[arg(long)]
        ticker: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 0.0)]
        quantity: f64,
        #[arg(long, default_value_t = 0.0)]
        average_cost: f64,
    },
    /// Edit quantity and average cost of a holding
    Update {
        #[arg(long)]
        ticker: String,
        #[arg(long)]
        quantity: f64,
        #[arg(long)]
        average_cost: f64,
    },
    /// Remove a holding
    Remove {
        #[arg(long)]
        ticker: String,
    },
    /// Search the symbol list
    Search {
        #[arg(long)]
        query: String,
    },
    /// Validate the configuration file
    Validate,
}

pub fn run(cli: Cli) -> ExitCode {
    let config = match load_config(&cli.config) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Err(e) = init_logging(LoggingConfig::from_env(Some(&config))) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    match execute(cli.command, &config) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

pub fn open_store(config: &dyn ConfigPort) -> Result<SqliteStore, TrendfolioError> {
    let store = SqliteStore::from_config(config)?;
    store.initialize_schema()?;
    Ok(store)
}

pub fn build_quotes(
    config: &dyn ConfigPort,
    settings: &EngineSettings,
) -> Result<CsvQuoteAdapter, TrendfolioError> {
    let data_dir = require_string(config, "quotes", "data_dir")?;
    Ok(CsvQuoteAdapter::new(
        PathBuf::from(data_dir),
        settings.history_window,
    ))
}

pub fn normalize_ticker(raw: &str) -> String {
    raw.trim().to_uppercase()
}

pub fn execute(command: Command, config: &dyn ConfigPort) -> Result<ExitCode, TrendfolioError> {
    let settings = EngineSettings::from_config(config)?;

    match command {
        Command::Analyze => {
            let store = open_store(config)?;
            let quotes = build_quotes(config, &settings)?;
            let report = workflow::run_analysis(&quotes, &store, &settings)?;
            print!("{}", format_analysis(&report));
            if !report.outcomes.is_empty() && report.problem_tickers().len() == report.outcomes.len()
            {
                eprintln!("error: no holding could be analyzed");
                return Ok(ExitCode::from(5));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Holdings => {
            let store = open_store(config)?;
            let holdings = store.load_all()?;
            if holdings.is_empty() {
                eprintln!("Portfolio is empty");
            }
            print!("{}", format_holdings(holdings));
            Ok(ExitCode::SUCCESS)
        }
        Command::Allocate => {
            let store = open_store(config)?;
            let report =
                workflow::run_allocation(&store, &store, &store, &settings, Utc::now())?;
            print!("{}", format_allocation(&report.plan));
            Ok(report_write_failures(&report))
        }
        Command::History { json, until } => {
            let store = open_store(config)?;
            let quotes = build_quotes(config, &settings)?;
            let today = until.unwrap_or_else(|| Utc::now().date_naive());
            let history = workflow::run_history(&store, &quotes, today)?;
            if json {
                let body = serde_json::to_string_pretty(&history).map_err(|e| {
                    TrendfolioError::Io(std::io::Error::other(e))
                })?;
                println!("{body}");
            } else {
                print!("{}", format_history(&history));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Budget { set } => {
            let store = open_store(config)?;
            let state = match set {
                Some(raw) => workflow::set_budget(&store, &settings, &raw)?,
                None => workflow::load_or_init_budget(&store, &settings)?,
            };
            println!("Budget:      €{:.2}", state.amount);
            println!("Next batch:  {}", state.next_batch_id);
            Ok(ExitCode::SUCCESS)
        }
        Command::Logs { strategy } => {
            let store = open_store(config)?;
            let entries = match strategy {
                Some(tag) => store.list(tag)?,
                None => store.list_all()?,
            };
            print!("{}", format_logs(&entries, strategy));
            Ok(ExitCode::SUCCESS)
        }
        Command::DeleteLog { id } => {
            let store = open_store(config)?;
            if LogStore::delete(&store, id)? {
                eprintln!("Deleted log entry {id}");
                Ok(ExitCode::SUCCESS)
            } else {
                eprintln!("error: no log entry with id {id}");
                Ok(ExitCode::from(1))
            }
        }
        Command::DeleteBatch { batch } => {
            let store = open_store(config)?;
            let removed = store.delete_batch(batch)?;
            eprintln!("Deleted {removed} entries of batch {batch}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Add {
            ticker,
            name,
            quantity,
            average_cost,
        } => {
            let store = open_store(config)?;
            let ticker = normalize_ticker(&ticker);
            if ticker.is_empty() {
                eprintln!("error: ticker must not be empty");
                return Ok(ExitCode::from(1));
            }
            if find_holding(&store, &ticker)?.is_some() {
                eprintln!("error: {ticker} is already in the portfolio");
                return Ok(ExitCode::from(1));
            }
            let mut holding = Holding::new(ticker, name.trim());
            holding.quantity = quantity.max(0.0);
            holding.average_cost = average_cost.max(0.0);
            HoldingStore::save(&store, &holding)?;
            eprintln!("Added {}", holding.ticker);
            Ok(ExitCode::SUCCESS)
        }
        Command::Update {
            ticker,
            quantity,
            average_cost,
        } => {
            let store = open_store(config)?;
            let ticker = normalize_ticker(&ticker);
            let Some(mut holding) = find_holding(&store, &ticker)? else {
                eprintln!("error: {ticker} is not in the portfolio");
                return Ok(ExitCode::from(1));
            };
            holding.quantity = quantity.max(0.0);
            holding.average_cost = average_cost.max(0.0);
            HoldingStore::save(&store, &holding)?;
            eprintln!("Updated {ticker}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Remove { ticker } => {
            let store = open_store(config)?;
            let ticker = normalize_ticker(&ticker);
            if HoldingStore::delete(&store, &ticker)? {
                eprintln!("Removed {ticker}");
                Ok(ExitCode::SUCCESS)
            } else {
                eprintln!("error: {ticker} is not in the portfolio");
                Ok(ExitCode::from(1))
            }
        }
        Command::Search { query } => {
            let quotes = build_quotes(config, &settings)?;
            let results = quotes.search(&query)?;
            if results.is_empty() {
                eprintln!("No symbols match '{query}'");
            }
            for r in &results {
                println!("{:<10} {:<32} {:<4} {}", r.ticker, r.name, r.currency, r.exchange);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate => {
            require_string(config, "sqlite", "path")?;
            require_string(config, "quotes", "data_dir")?;
            eprintln!(
                "Configuration is valid: SMA({}), EMA_TREND({}), window {}, replenish €{:.2}",
                settings.sma_period,
                settings.ema_trend_period,
                settings.history_window,
                settings.replenish_amount
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn find_holding(
    store: &dyn HoldingStore,
    ticker: &str,
) -> Result<Option<Holding>, TrendfolioError> {
    Ok(store.load_all()?.into_iter().find(|h| h.ticker == ticker))
}

fn report_write_failures(report: &AllocationReport) -> ExitCode {
    if report.is_complete() {
        return ExitCode::SUCCESS;
    }
    for failure in report.failures() {
        let what = match &failure.target {
            WriteTarget::Holding(ticker) => format!("holding {ticker}"),
            WriteTarget::LogEntry { strategy, ticker } => format!("{strategy} log entry {ticker}"),
            WriteTarget::Budget => "budget".to_string(),
        };
        eprintln!(
            "warning: failed to store {what}: {}",
            failure.error.as_deref().unwrap_or_default()
        );
    }
    ExitCode::from(3)
}

pub fn format_analysis(report: &AnalysisReport) -> String {
    let mut out = String::new();
    for item in &report.outcomes {
        let line = match &item.outcome {
            AnalysisOutcome::Analyzed {
                current_price,
                sma200,
                ema_trend,
            } => format!(
                "{:<10} price {:>10.2}  sma {:>10.2}  ema_trend {:>8.4}",
                item.key, current_price, sma200, ema_trend
            ),
            AnalysisOutcome::PartiallyAnalyzed {
                current_price,
                missing,
            } => {
                let missing: Vec<String> = missing.iter().map(|i| i.to_string()).collect();
                format!(
                    "{:<10} price {:>10.2}  not enough history for {}",
                    item.key,
                    current_price,
                    missing.join(", ")
                )
            }
            AnalysisOutcome::Skipped { reason } => format!("{:<10} skipped: {reason}", item.key),
            AnalysisOutcome::Failed { reason } => format!("{:<10} failed: {reason}", item.key),
        };
        let _ = writeln!(out, "{line}");
    }
    let _ = writeln!(
        out,
        "{} of {} holdings analyzed",
        report.analyzed_count(),
        report.outcomes.len()
    );
    out
}

pub fn format_allocation(plan: &AllocationPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Batch {} ===", plan.batch_id);
    for strategy in StrategyTag::ALL {
        let decisions = plan.decisions(strategy);
        let _ = writeln!(out, "\n[{strategy}]");
        if decisions.is_empty() {
            let _ = writeln!(out, "  no decisions");
            continue;
        }
        for d in decisions {
            let _ = writeln!(
                out,
                "  {:<10} €{:>10.2}  {:>+12.6} @ {:.2}",
                d.ticker, d.invested_amount, d.quantity_delta, d.price_per_share
            );
        }
        let _ = writeln!(out, "  total €{:.2}", plan.total_invested(strategy));
    }
    if plan.rolled_over {
        let _ = writeln!(
            out,
            "\nNo eligible holdings: budget €{:.2} rolls over to the next run",
            plan.budget_after.amount
        );
    } else {
        let _ = writeln!(
            out,
            "\nBudget replenished to €{:.2}, next batch {}",
            plan.budget_after.amount, plan.budget_after.next_batch_id
        );
    }
    out
}

pub fn format_history(history: &[PortfolioHistoryPoint]) -> String {
    let mut out = String::new();
    if history.is_empty() {
        let _ = writeln!(out, "No allocation history yet");
        return out;
    }
    let _ = write!(out, "{:<12}", "date");
    for strategy in SIMULATED_STRATEGIES {
        let _ = write!(out, "{:>20}", strategy.as_str());
    }
    let _ = writeln!(out);
    for point in history {
        let _ = write!(out, "{:<12}", point.date.to_string());
        for strategy in SIMULATED_STRATEGIES {
            let _ = write!(out, "{:>20.2}", point.value(strategy));
        }
        let _ = writeln!(out);
    }
    out
}

pub fn format_logs(entries: &[LogEntry], strategy: Option<StrategyTag>) -> String {
    let mut out = String::new();
    if entries.is_empty() {
        let _ = writeln!(out, "Allocation log is empty");
        return out;
    }

    for (batch, batch_entries) in group_by_batch(entries).iter().rev() {
        let _ = writeln!(out, "=== Batch {batch} ===");
        for entry in batch_entries {
            let d = &entry.decision;
            let _ = writeln!(
                out,
                "  #{:<5} {:<19} {:<10} €{:>10.2} {:>+12.6} @ {:<10.2} {}",
                entry.id,
                d.strategy.as_str(),
                d.ticker,
                d.invested_amount,
                d.quantity_delta,
                d.price_per_share,
                d.timestamp.format("%Y-%m-%d %H:%M")
            );
        }
    }

    let summary = LogSummary::compute(entries);
    let _ = writeln!(out, "\nEntries:          {}", summary.total_investments);
    let _ = writeln!(out, "Total invested:   €{:.2}", summary.total_amount);
    if let Some((ticker, count)) = &summary.most_frequent {
        let _ = writeln!(out, "Most frequent:    {ticker} ({count} entries)");
    }
    if let Some((ticker, amount)) = &summary.highest_invested {
        let _ = writeln!(out, "Highest invested: {ticker} (€{amount:.2})");
    }

    let tag = strategy.unwrap_or(StrategyTag::MaUndervalued);
    let mut per_ticker = TickerSummary::compute_per_ticker(entries, tag);
    if !per_ticker.is_empty() {
        let _ = writeln!(out, "\n=== Per ticker ({tag}) ===");
        per_ticker.sort_by(|a, b| b.invested.total_cmp(&a.invested));
        for t in &per_ticker {
            let _ = writeln!(
                out,
                "  {:<10} {:>3} entries  €{:>10.2}  {:>12.6} shares",
                t.ticker, t.entries, t.invested, t.quantity
            );
        }
    }
    out
}

pub fn format_holdings(mut holdings: Vec<Holding>) -> String {
    sort_by_ticker(&mut holdings);
    let mut out = String::new();
    for h in &holdings {
        let _ = writeln!(
            out,
            "{:<10} {:>10.4} sh  avg €{:>9.2}  value €{:>10.2}  pnl €{:>+9.2}{}",
            h.ticker,
            h.quantity,
            h.average_cost,
            h.market_value(),
            h.unrealized_pnl(),
            if h.below_ma() { "  below SMA" } else { "" }
        );
        if !h.recommendation.is_empty() {
            let _ = writeln!(out, "{:<10} {}", "", h.recommendation);
        }
    }
    out
}
