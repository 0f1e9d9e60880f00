//! Client configuration loaded from TOML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::games::{AiMode, PlayerSide};

/// Settings for the game client.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the game server.
    #[serde(default = "default_server_url")]
    server_url: String,

    /// Milliseconds before an oracle call is treated as a transport failure.
    #[serde(default = "default_request_timeout_ms")]
    request_timeout_ms: u64,

    /// Milliseconds to wait before asking for the AI's move.
    #[serde(default = "default_ai_move_delay_ms")]
    ai_move_delay_ms: u64,

    /// AI algorithm used for new games.
    #[serde(default)]
    ai_mode: AiMode,

    /// Side played in checkers.
    #[serde(default)]
    player_side: PlayerSide,

    /// Where sound and animation preferences are stored.
    #[serde(default = "default_preferences_path")]
    preferences_path: PathBuf,

    /// Log file written while the terminal UI is running.
    #[serde(default = "default_log_file")]
    log_file: PathBuf,
}

#[instrument]
fn default_server_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

#[instrument]
fn default_request_timeout_ms() -> u64 {
    10_000
}

#[instrument]
fn default_ai_move_delay_ms() -> u64 {
    500
}

fn default_preferences_path() -> PathBuf {
    PathBuf::from("vsai_prefs.toml")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("vsai.log")
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            request_timeout_ms: default_request_timeout_ms(),
            ai_move_delay_ms: default_ai_move_delay_ms(),
            ai_mode: AiMode::default(),
            player_side: PlayerSide::default(),
            preferences_path: default_preferences_path(),
            log_file: default_log_file(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(server_url = %config.server_url, "Config loaded successfully");
        Ok(config)
    }

    /// Loads the file if it exists, otherwise returns defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            debug!("No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Request timeout as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// AI move delay as a duration.
    pub fn ai_move_delay(&self) -> Duration {
        Duration::from_millis(self.ai_move_delay_ms)
    }

    /// Overrides the server URL.
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// Overrides the AI mode.
    pub fn with_ai_mode(mut self, mode: AiMode) -> Self {
        self.ai_mode = mode;
        self
    }

    /// Overrides the checkers side.
    pub fn with_player_side(mut self, side: PlayerSide) -> Self {
        self.player_side = side;
        self
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
