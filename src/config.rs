use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::database::{CorruptionPolicy, DEFAULT_STORAGE_KEY};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub undo: UndoConfig,
    pub dice: DiceConfig,
    pub logging: LoggingConfig,
}

/// Where and how the envelope is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Override the default data directory.
    pub data_dir: Option<PathBuf>,
    /// Key (file stem) of the envelope.
    pub storage_key: String,
    /// What to do with stored data that cannot be decoded.
    pub on_corruption: CorruptionPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UndoConfig {
    /// How long an undo stays available, in milliseconds.
    pub window_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiceConfig {
    /// Rolls kept in the roll history.
    pub history_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Also write JSON logs under `<data_dir>/logs`.
    pub log_to_file: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            on_corruption: CorruptionPolicy::Recover,
        }
    }
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self { window_ms: 5000 }
    }
}

impl Default for DiceConfig {
    fn default() -> Self {
        Self { history_limit: 10 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
        }
    }
}

impl UndoConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl AppConfig {
    /// Load configuration from `~/.config/gamebook-companion/config.toml`.
    /// Returns `Default` if the file is missing or unparseable.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &std::path::Path) -> Self {
        match std::fs::read_to_string(config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse config at {}: {e}, using defaults",
                        config_path.display()
                    );
                    Self::default()
                }
            },
            Err(_) => {
                log::debug!(
                    "No config file at {}, using defaults",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    /// Resolved data directory (override or XDG default).
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(|| {
                dirs::data_dir()
                    .map(|d| d.join("gamebook-companion"))
                    .unwrap_or_else(|| PathBuf::from("data"))
            })
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir().join("logs")
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("gamebook-companion").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
