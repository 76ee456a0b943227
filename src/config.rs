use std::fs;
use std::io;

use serde::{Deserialize, Serialize};

use crate::analysis::DEFAULT_LOOKBACK_DAYS;
use crate::db::connection;
use crate::error::CoordError;

/// Environment override for the missing-dependency lookback window.
pub const LOOKBACK_ENV: &str = "COORDAI_LOOKBACK_DAYS";

/// Persisted at `<git-root>/.coordai/config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookback_days: Option<i64>,
}

impl Config {
    /// A missing file (or running outside a repository) gives the defaults;
    /// a file that cannot be read or parsed is an error.
    pub fn load() -> Result<Self, CoordError> {
        let Ok(path) = connection::config_path() else {
            return Ok(Self::default());
        };
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(CoordError::validation(format!(
                    "Cannot read {}: {e}",
                    path.display()
                )))
            }
        };
        Self::parse(&content).map_err(|e| {
            CoordError::validation(format!("Invalid config {}: {}", path.display(), e.message))
        })
    }

    fn parse(content: &str) -> Result<Self, CoordError> {
        let config: Self = serde_json::from_str(content)?;
        if let Some(days) = config.lookback_days {
            validate_lookback_days(days)?;
        }
        Ok(config)
    }

    pub fn save(&self) -> Result<(), CoordError> {
        let path = connection::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| CoordError::database(e.to_string()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content).map_err(|e| CoordError::database(e.to_string()))
    }
}

/// Lookback window precedence: flag, then environment, then config file,
/// then the default.
pub fn resolve_lookback_days(
    flag: Option<i64>,
    env_value: Option<&str>,
    config: &Config,
) -> Result<i64, CoordError> {
    let days = match (flag, env_value) {
        (Some(days), _) => days,
        (None, Some(raw)) => raw.trim().parse::<i64>().map_err(|_| {
            CoordError::validation(format!("{LOOKBACK_ENV} must be a whole number of days, got '{raw}'"))
        })?,
        (None, None) => config.lookback_days.unwrap_or(DEFAULT_LOOKBACK_DAYS),
    };
    validate_lookback_days(days)
}

pub fn validate_lookback_days(days: i64) -> Result<i64, CoordError> {
    if days < 0 {
        return Err(CoordError::validation(format!(
            "Lookback window must not be negative, got {days}"
        )));
    }
    Ok(days)
}
