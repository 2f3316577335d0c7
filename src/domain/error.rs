//! Domain error types.

/// Top-level error type for trendfolio.
#[derive(Debug, thiserror::Error)]
pub enum TrendfolioError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no price history found for {ticker}")]
    NotFound { ticker: String },

    #[error("quote provider unavailable for {ticker}: {reason}")]
    Transient { ticker: String, reason: String },

    #[error("insufficient data for {indicator}: have {points} closes, need {minimum}")]
    InsufficientData {
        indicator: String,
        points: usize,
        minimum: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrendfolioError {
    /// Errors raised by the quote provider rather than by the engine or a store.
    pub fn is_quote_error(&self) -> bool {
        matches!(
            self,
            TrendfolioError::NotFound { .. } | TrendfolioError::Transient { .. }
        )
    }
}

impl From<&TrendfolioError> for std::process::ExitCode {
    fn from(err: &TrendfolioError) -> Self {
        let code: u8 = match err {
            TrendfolioError::Io(_) => 1,
            TrendfolioError::ConfigParse { .. }
            | TrendfolioError::ConfigMissing { .. }
            | TrendfolioError::ConfigInvalid { .. } => 2,
            TrendfolioError::Database { .. } | TrendfolioError::DatabaseQuery { .. } => 3,
            TrendfolioError::NotFound { .. }
            | TrendfolioError::Transient { .. }
            | TrendfolioError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_message() {
        let err = TrendfolioError::InsufficientData {
            indicator: "SMA(200)".into(),
            points: 120,
            minimum: 200,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data for SMA(200): have 120 closes, need 200"
        );
    }

    #[test]
    fn quote_errors_are_classified() {
        let not_found = TrendfolioError::NotFound {
            ticker: "ASML".into(),
        };
        let transient = TrendfolioError::Transient {
            ticker: "ASML".into(),
            reason: "timeout".into(),
        };
        let db = TrendfolioError::Database {
            reason: "locked".into(),
        };
        assert!(not_found.is_quote_error());
        assert!(transient.is_quote_error());
        assert!(!db.is_quote_error());
    }
}
