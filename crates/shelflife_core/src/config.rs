//! Runtime configuration for the core.
//!
//! # Responsibility
//! - Resolve storage locations, backend capability and reminder defaults.
//! - Read overrides from `SHELFLIFE_*` environment variables.
//!
//! # Invariants
//! - Blank environment values are ignored, never treated as empty paths.
//! - Disabling the structured backend forces the document fallback.

use crate::logging::default_log_level;
use crate::service::reminder::DEFAULT_LEAD_WINDOW_DAYS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "SHELFLIFE_DB_PATH";
pub const ENV_DATA_DIR: &str = "SHELFLIFE_DATA_DIR";
pub const ENV_DISABLE_SQLITE: &str = "SHELFLIFE_DISABLE_SQLITE";
pub const ENV_LEAD_DAYS: &str = "SHELFLIFE_LEAD_DAYS";
pub const ENV_LOG_LEVEL: &str = "SHELFLIFE_LOG_LEVEL";

const DEFAULT_DATA_DIR_NAME: &str = "shelflife";
const DB_FILE_NAME: &str = "expiry.db";
const LOG_DIR_NAME: &str = "logs";

/// Core configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Directory holding the database file, fallback documents and logs.
    pub data_dir: PathBuf,
    /// Explicit database file; defaults to `<data_dir>/expiry.db`.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    /// Whether the SQLite backend may be used at all.
    #[serde(default = "default_structured_backend")]
    pub structured_backend: bool,
    /// Window used by the reminder scheduler.
    #[serde(default = "default_lead_window_days")]
    pub lead_window_days: u32,
    #[serde(default = "default_level")]
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            data_dir: std::env::temp_dir().join(DEFAULT_DATA_DIR_NAME),
            db_path: None,
            structured_backend: default_structured_backend(),
            lead_window_days: default_lead_window_days(),
            log_level: default_level(),
        }
    }
}

impl CoreConfig {
    /// Builds configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let mut config = Self::default();
        if let Some(dir) = value(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(path) = value(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(flag) = value(ENV_DISABLE_SQLITE) {
            config.structured_backend = !parse_flag(&flag);
        }
        if let Some(days) = value(ENV_LEAD_DAYS).and_then(|raw| raw.parse::<u32>().ok()) {
            config.lead_window_days = days;
        }
        if let Some(level) = value(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        config
    }

    /// Database file to open, or `None` when the structured backend is disabled.
    pub fn resolved_db_path(&self) -> Option<PathBuf> {
        if !self.structured_backend {
            return None;
        }
        Some(
            self.db_path
                .clone()
                .unwrap_or_else(|| self.data_dir.join(DB_FILE_NAME)),
        )
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn default_structured_backend() -> bool {
    true
}

fn default_lead_window_days() -> u32 {
    DEFAULT_LEAD_WINDOW_DAYS
}

fn default_level() -> String {
    default_log_level().to_string()
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, ENV_DATA_DIR, ENV_DISABLE_SQLITE, ENV_LEAD_DAYS};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_place_database_inside_data_dir() {
        let config = CoreConfig::from_lookup(lookup(&[(ENV_DATA_DIR, "/var/shelflife")]));
        assert_eq!(
            config.resolved_db_path(),
            Some(PathBuf::from("/var/shelflife/expiry.db"))
        );
        assert_eq!(config.lead_window_days, 7);
    }

    #[test]
    fn disable_flag_removes_structured_backend() {
        let config = CoreConfig::from_lookup(lookup(&[(ENV_DISABLE_SQLITE, "TRUE")]));
        assert!(!config.structured_backend);
        assert_eq!(config.resolved_db_path(), None);
    }

    #[test]
    fn blank_and_malformed_values_are_ignored() {
        let config = CoreConfig::from_lookup(lookup(&[(ENV_DATA_DIR, "   "), (ENV_LEAD_DAYS, "-3")]));
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: CoreConfig = serde_json::from_str(r#"{"data_dir": "/srv/pantry"}"#).unwrap();
        assert!(config.structured_backend);
        assert_eq!(config.lead_window_days, 7);
        assert_eq!(config.db_path, None);
    }
}
