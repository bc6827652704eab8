//! Process-level bridge configuration.
//!
//! Values come from the environment with build-mode defaults:
//! - `DTT_LOG_LEVEL`: `trace|debug|info|warn|error`.
//! - `DTT_LOG_DIR`: absolute directory for rolling log files.

use crate::logging::{default_log_level, init_logging};
use std::path::PathBuf;

pub const LOG_LEVEL_ENV: &str = "DTT_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "DTT_LOG_DIR";
const DEFAULT_LOG_DIR_NAME: &str = "dtt-logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub log_level: String,
    pub log_dir: PathBuf,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            log_dir: std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME),
        }
    }
}

impl BridgeConfig {
    /// Resolves configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through `lookup`; blank values fall back to
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_blank = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        Self {
            log_level: non_blank(LOG_LEVEL_ENV).unwrap_or(defaults.log_level),
            log_dir: non_blank(LOG_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
        }
    }

    /// Starts bridge logging with this configuration.
    pub fn init_logging(&self) -> Result<(), String> {
        let log_dir = self
            .log_dir
            .to_str()
            .ok_or_else(|| format!("log_dir is not valid UTF-8: {}", self.log_dir.display()))?;
        init_logging(&self.log_level, log_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::{BridgeConfig, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = BridgeConfig::from_lookup(lookup_from(&[
            (LOG_LEVEL_ENV, "warn"),
            (LOG_DIR_ENV, "/var/log/dtt"),
        ]));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, PathBuf::from("/var/log/dtt"));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = BridgeConfig::from_lookup(lookup_from(&[(LOG_LEVEL_ENV, "  ")]));
        assert_eq!(config, BridgeConfig::default());
    }
}
