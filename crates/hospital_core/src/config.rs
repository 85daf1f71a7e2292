//! Runtime configuration for the hospital store.
//!
//! # Responsibility
//! - Describe where the store lives and how logging is set up.
//! - Load settings from process environment (and an optional `.env` file).
//!
//! # Invariants
//! - Loading never fails; unparsable values fall back to defaults with a
//!   warning.
//! - `db_path = None` means an in-memory store.

use crate::logging::default_log_level;
use log::warn;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "HOSPITAL_DB_PATH";
pub const ENV_BUSY_TIMEOUT_MS: &str = "HOSPITAL_BUSY_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "HOSPITAL_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "HOSPITAL_LOG_DIR";

/// Busy timeout applied to every opened connection unless configured.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Store and logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HospitalConfig {
    /// SQLite file path. `None` opens an in-memory database.
    pub db_path: Option<PathBuf>,
    /// How long SQLite waits on a locked database before failing.
    pub busy_timeout: Duration,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files. `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl Default for HospitalConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl HospitalConfig {
    /// Loads configuration from the process environment.
    ///
    /// A `.env` file in the working directory (or its parents) is read first
    /// when present; real environment variables win over it.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let busy_timeout = match read(ENV_BUSY_TIMEOUT_MS) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(millis) => Duration::from_millis(millis),
                Err(_) => {
                    warn!(
                        "event=config_load module=config status=fallback key={ENV_BUSY_TIMEOUT_MS} reason=not_an_integer"
                    );
                    defaults.busy_timeout
                }
            },
            None => defaults.busy_timeout,
        };

        Self {
            db_path: read(ENV_DB_PATH).map(PathBuf::from),
            busy_timeout,
            log_level: read(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_dir: read(ENV_LOG_DIR).map(PathBuf::from),
        }
    }

    /// Returns whether the store is persisted to disk.
    pub fn is_persistent(&self) -> bool {
        self.db_path.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{HospitalConfig, DEFAULT_BUSY_TIMEOUT};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_in_memory_defaults() {
        let config = HospitalConfig::from_lookup(|_| None);

        assert_eq!(config, HospitalConfig::default());
        assert!(!config.is_persistent());
        assert_eq!(config.busy_timeout, DEFAULT_BUSY_TIMEOUT);
    }

    #[test]
    fn reads_all_known_keys() {
        let config = HospitalConfig::from_lookup(lookup_from(&[
            ("HOSPITAL_DB_PATH", "/var/lib/hospital/store.db"),
            ("HOSPITAL_BUSY_TIMEOUT_MS", "250"),
            ("HOSPITAL_LOG_LEVEL", "warn"),
            ("HOSPITAL_LOG_DIR", "/var/log/hospital"),
        ]));

        assert_eq!(
            config.db_path,
            Some(PathBuf::from("/var/lib/hospital/store.db"))
        );
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/hospital")));
        assert!(config.is_persistent());
    }

    #[test]
    fn invalid_timeout_and_blank_values_fall_back() {
        let config = HospitalConfig::from_lookup(lookup_from(&[
            ("HOSPITAL_DB_PATH", "   "),
            ("HOSPITAL_BUSY_TIMEOUT_MS", "soon"),
        ]));

        assert_eq!(config.db_path, None);
        assert_eq!(config.busy_timeout, DEFAULT_BUSY_TIMEOUT);
    }
}
