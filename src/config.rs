use anyhow::Context;
use serde::Deserialize;
use std::{path::PathBuf, time::Duration};

pub const DEFAULT_DB_PATH: &str = "rolodex.db";
pub const DEFAULT_RELEASE_GRACE_SECS: u64 = 30;
pub const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub database: Database,
    #[serde(default)]
    pub player: PlayerConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            database: Database::default(),
            player: PlayerConfig::default(),
        }
    }
}

impl Config {
    /// Loads the config file, falling back to defaults when it does not exist.
    pub fn load(path: &str) -> anyhow::Result<Config> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("config {path} not found, using defaults");
                return Ok(Config::default());
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to read config {path}")),
        };
        toml::from_str(&contents).with_context(|| "Failed to parse config TOML")
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct Database {
    #[serde(default)]
    pub in_memory: bool,
    pub path: Option<PathBuf>,
}

impl Database {
    pub fn in_memory() -> Self {
        Self {
            in_memory: true,
            path: None,
        }
    }

    pub fn file_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH))
    }
}

/// mpv (or a compatible player) used for audio output. The IPC flags are
/// added on top of `args`.
#[derive(Debug, Deserialize, Clone)]
pub struct PlayerConfig {
    #[serde(default = "default_command")]
    pub command: String,
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// how long a replaced audio file stays readable
    #[serde(default = "default_grace")]
    pub release_grace_secs: u64,
    /// how long to wait for the player's IPC socket
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_secs: u64,
}

fn default_command() -> String {
    "mpv".to_string()
}

fn default_args() -> Vec<String> {
    vec!["--no-video".to_string(), "--really-quiet".to_string()]
}

fn default_grace() -> u64 {
    DEFAULT_RELEASE_GRACE_SECS
}

fn default_startup_timeout() -> u64 {
    DEFAULT_STARTUP_TIMEOUT_SECS
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
            release_grace_secs: default_grace(),
            startup_timeout_secs: default_startup_timeout(),
        }
    }
}

impl PlayerConfig {
    pub fn release_grace(&self) -> Duration {
        Duration::from_secs(self.release_grace_secs)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }
}
