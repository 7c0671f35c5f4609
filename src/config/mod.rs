use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::reveal::{RevealDelay, DEFAULT_REVEAL_DELAY_MS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not find config directory")]
    NoConfigDir,
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealConfig {
    /// Animate assistant replies; when off they appear at once
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Per-character delay. Signed so a bad value clamps instead of failing to parse
    #[serde(default = "default_reveal_delay")]
    pub delay_ms: i64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_ms: default_reveal_delay(),
        }
    }
}

impl RevealConfig {
    pub fn delay(&self) -> RevealDelay {
        RevealDelay::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_assistant_name")]
    pub name: String,

    /// Pause between streamed word chunks
    #[serde(default = "default_chunk_delay")]
    pub chunk_delay_ms: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: default_assistant_name(),
            chunk_delay_ms: default_chunk_delay(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_min_rows")]
    pub min_rows: u16,
    #[serde(default = "default_max_rows")]
    pub max_rows: u16,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default = "default_validation_debounce")]
    pub validation_debounce_ms: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            min_rows: default_min_rows(),
            max_rows: default_max_rows(),
            max_length: default_max_length(),
            validation_debounce_ms: default_validation_debounce(),
        }
    }
}

/// Optional hex color overrides (`#RRGGBB` or `#RGB`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_dim: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub danger: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name shown on your own messages
    #[serde(default = "default_user_name")]
    pub user_name: String,

    #[serde(default)]
    pub reveal: RevealConfig,

    #[serde(default)]
    pub assistant: AssistantConfig,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub theme: ThemeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_name: default_user_name(),
            reveal: RevealConfig::default(),
            assistant: AssistantConfig::default(),
            input: InputConfig::default(),
            theme: ThemeConfig::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_reveal_delay() -> i64 {
    DEFAULT_REVEAL_DELAY_MS as i64
}

fn default_assistant_name() -> String {
    "Cognit".to_string()
}

fn default_chunk_delay() -> u64 {
    60
}

fn default_min_rows() -> u16 {
    1
}

fn default_max_rows() -> u16 {
    6
}

fn default_max_length() -> usize {
    4000
}

fn default_validation_debounce() -> u64 {
    300
}

fn default_user_name() -> String {
    "you".to_string()
}

impl AppConfig {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join("cognit-studio");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from `path` (or the default location), creating a default
    /// file when none exists. Unreadable or invalid files fall back to defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!("{}", e);
                    return AppConfig::default();
                }
            },
        };

        if path.exists() {
            match Self::read_from(&path) {
                Ok(config) => return config.sanitized(),
                Err(e) => {
                    tracing::warn!("{}, using defaults", e);
                    return AppConfig::default();
                }
            }
        }

        let config = AppConfig::default();
        if let Err(e) = config.save_to(&path) {
            tracing::warn!("Could not write default config: {}", e);
        }
        config
    }

    pub fn read_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Repair values that parse fine but make no sense together
    fn sanitized(mut self) -> Self {
        if self.input.min_rows == 0 {
            self.input.min_rows = 1;
        }
        if self.input.max_rows < self.input.min_rows {
            tracing::warn!(
                "input.max_rows ({}) below min_rows ({}), raising it",
                self.input.max_rows,
                self.input.min_rows
            );
            self.input.max_rows = self.input.min_rows;
        }
        if self.user_name.trim().is_empty() {
            self.user_name = default_user_name();
        }
        if self.assistant.name.trim().is_empty() {
            self.assistant.name = default_assistant_name();
        }
        self
    }
}
