use std::path::{Path, PathBuf};
use std::time::Duration;

use blockwarden_config::{settings_dir, settings_file_path};
use blockwarden_scheduler::UpdateScheduler;

/// Blockwarden command-line configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Directory holding `settings.json` and its backups
    pub settings_dir: PathBuf,
    /// Directory for rolling JSON logs; console only when unset
    pub log_dir: Option<PathBuf>,
    /// Log level
    pub log_level: String,
    pub check_period: Duration,
    pub init_delay: Duration,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            settings_dir: settings_dir(),
            log_dir: None,
            log_level: "info".to_string(),
            check_period: UpdateScheduler::CHECK_PERIOD,
            init_delay: UpdateScheduler::INIT_DELAY,
        }
    }
}

impl CliConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let secs = |key: &str| {
            get(key)
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
        };
        Self {
            settings_dir: get("BLOCKWARDEN_SETTINGS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.settings_dir),
            log_dir: get("BLOCKWARDEN_LOG_DIR").map(PathBuf::from),
            log_level: get("RUST_LOG").unwrap_or(defaults.log_level),
            check_period: secs("BLOCKWARDEN_CHECK_PERIOD_SECS").unwrap_or(defaults.check_period),
            init_delay: secs("BLOCKWARDEN_INIT_DELAY_SECS").unwrap_or(defaults.init_delay),
        }
    }

    pub fn settings_path(&self) -> PathBuf {
        settings_file_path(&self.settings_dir)
    }

    pub fn with_settings_dir(self, dir: Option<&Path>) -> Self {
        match dir {
            Some(dir) => Self { settings_dir: dir.to_path_buf(), ..self },
            None => self,
        }
    }
}
