//! Tracing subscriber setup.

use crate::domain::error::TrendfolioError;
use crate::ports::config_port::ConfigPort;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub const DEFAULT_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_string(),
            ansi: true,
        }
    }
}

impl LoggingConfig {
    /// `RUST_LOG` wins over `[logging] level`, which wins over `info`.
    pub fn resolve(env_level: Option<String>, config: Option<&dyn ConfigPort>) -> Self {
        let configured = config.and_then(|c| c.get_string("logging", "level"));
        let level = env_level
            .or(configured)
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LEVEL.to_string());
        let ansi = config.is_none_or(|c| c.get_bool("logging", "ansi", true));
        Self { level, ansi }
    }

    pub fn from_env(config: Option<&dyn ConfigPort>) -> Self {
        Self::resolve(std::env::var("RUST_LOG").ok(), config)
    }
}

/// Installs the global fmt subscriber on stderr. A second call is a no-op.
pub fn init_logging(config: LoggingConfig) -> Result<(), TrendfolioError> {
    let filter =
        EnvFilter::try_new(&config.level).map_err(|e| TrendfolioError::ConfigInvalid {
            section: "logging".into(),
            key: "level".into(),
            reason: e.to_string(),
        })?;

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(config.ansi)
                .with_target(false),
        )
        .try_init();

    if installed.is_ok() {
        tracing::debug!(level = %config.level, "logging initialized");
    }
    Ok(())
}
