//! INI file configuration adapter.

use crate::domain::error::TrendfolioError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TrendfolioError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| TrendfolioError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, TrendfolioError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| TrendfolioError::ConfigParse {
                file: "<inline>".into(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    const FULL_CONFIG: &str = r#"
[sqlite]
path = /var/lib/trendfolio/portfolio.db
pool_size = 2

[quotes]
data_dir = /var/lib/trendfolio/quotes
history_window = 300

[indicators]
sma_period = 200
ema_trend_period = 112

[allocation]
replenish_amount = 150.0
initial_budget = 100

[logging]
level = debug
ansi = no
"#;

    #[test]
    fn from_string_parses_all_sections() {
        let adapter = FileConfigAdapter::from_string(FULL_CONFIG).unwrap();
        assert_eq!(
            adapter.get_string("sqlite", "path"),
            Some("/var/lib/trendfolio/portfolio.db".to_string())
        );
        assert_eq!(adapter.get_int("sqlite", "pool_size", 4), 2);
        assert_eq!(adapter.get_int("quotes", "history_window", 250), 300);
        assert_eq!(adapter.get_int("indicators", "ema_trend_period", 0), 112);
        assert_eq!(
            adapter.get_double("allocation", "replenish_amount", 0.0),
            150.0
        );
        assert_eq!(adapter.get_double("allocation", "initial_budget", 0.0), 100.0);
        assert_eq!(
            adapter.get_string("logging", "level"),
            Some("debug".to_string())
        );
        assert!(!adapter.get_bool("logging", "ansi", true));
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[sqlite]\npool_size = 4\n").unwrap();
        assert_eq!(adapter.get_string("sqlite", "path"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_default_for_missing_or_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[indicators]\nsma_period = abc\n").unwrap();
        assert_eq!(adapter.get_int("indicators", "sma_period", 200), 200);
        assert_eq!(adapter.get_int("indicators", "ema_trend_period", 112), 112);
    }

    #[test]
    fn get_double_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[allocation]\nreplenish_amount = lots\n").unwrap();
        assert_eq!(
            adapter.get_double("allocation", "replenish_amount", 99.9),
            99.9
        );
    }

    #[test]
    fn get_bool_values_and_default() {
        let adapter =
            FileConfigAdapter::from_string("[logging]\na = true\nb = yes\nc = 0\n").unwrap();
        assert!(adapter.get_bool("logging", "a", false));
        assert!(adapter.get_bool("logging", "b", false));
        assert!(!adapter.get_bool("logging", "c", true));
        assert!(adapter.get_bool("logging", "missing", true));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[quotes]\ndata_dir = /tmp/quotes\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("quotes", "data_dir"),
            Some("/tmp/quotes".to_string())
        );
    }

    #[test]
    fn from_file_missing_file_is_parse_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        match result {
            Err(TrendfolioError::ConfigParse { file, .. }) => {
                assert_eq!(file, "/nonexistent/path/config.ini");
            }
            Err(other) => panic!("expected ConfigParse, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }
}
