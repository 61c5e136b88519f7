//! # Configuration
//!
//! Server settings live in a TOML file (`config.toml` by default), organised into
//! sections:
//!
//! - [`ServerConfig`] - listener address, server name, message of the day
//! - [`StorageConfig`] - where levels and the player database live
//! - [`GameConfig`] - session rules
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ```toml
//! [server]
//! name = "BerlinMUD"
//! bind = "0.0.0.0:1337"
//! motd = "Mind the gap."
//!
//! [storage]
//! data_dir = "./data"
//! # levels_dir = "./data/levels"
//! # players_db = "./data/players"
//!
//! [game]
//! single_session = true
//! max_line_length = 1024
//! outbox_capacity = 256
//! write_timeout_secs = 30
//!
//! [logging]
//! level = "info"
//! file = "berlinmud.log"
//! ```
//!
//! Every section and field has a default, so a partial file is valid.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_name")]
    pub name: String,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Shown after the welcome line; empty disables it.
    #[serde(default)]
    pub motd: String,
}

fn default_server_name() -> String {
    "BerlinMUD".to_string()
}

fn default_bind() -> String {
    "0.0.0.0:1337".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            bind: default_bind(),
            motd: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Optional override; defaults to `<data_dir>/levels`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub levels_dir: Option<String>,
    /// Optional override for the sled player database; defaults to `<data_dir>/players`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub players_db: Option<String>,
}

fn default_data_dir() -> String {
    "./data".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            levels_dir: None,
            players_db: None,
        }
    }
}

impl StorageConfig {
    pub fn levels_path(&self) -> PathBuf {
        match &self.levels_dir {
            Some(dir) => PathBuf::from(dir),
            None => PathBuf::from(&self.data_dir).join("levels"),
        }
    }

    pub fn players_path(&self) -> PathBuf {
        match &self.players_db {
            Some(dir) => PathBuf::from(dir),
            None => PathBuf::from(&self.data_dir).join("players"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Refuse a second concurrent login for a nickname that is already playing.
    #[serde(default = "default_single_session")]
    pub single_session: bool,
    /// Input lines longer than this (in bytes) end the session.
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
    /// Queued output chunks per session; text for a full mailbox is dropped.
    #[serde(default = "default_outbox_capacity")]
    pub outbox_capacity: usize,
    /// A client that accepts no output for this long is disconnected.
    #[serde(default = "default_write_timeout_secs")]
    pub write_timeout_secs: u64,
}

fn default_single_session() -> bool {
    true
}

fn default_max_line_length() -> usize {
    1024
}

fn default_outbox_capacity() -> usize {
    256
}

fn default_write_timeout_secs() -> u64 {
    30
}

impl GameConfig {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs.max(1))
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            single_session: default_single_session(),
            max_line_length: default_max_line_length(),
            outbox_capacity: default_outbox_capacity(),
            write_timeout_secs: default_write_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: Some("berlinmud.log".to_string()),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            motd = "hi"

            [storage]
            data_dir = "/srv/mud"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:1337");
        assert_eq!(config.server.motd, "hi");
        assert!(config.game.single_session);
        assert_eq!(config.game.max_line_length, 1024);
        assert_eq!(config.game.outbox_capacity, 256);
        assert_eq!(config.game.write_timeout(), Duration::from_secs(30));
        assert_eq!(config.storage.levels_path(), PathBuf::from("/srv/mud/levels"));
        assert_eq!(config.storage.players_path(), PathBuf::from("/srv/mud/players"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn explicit_storage_paths_win() {
        let storage = StorageConfig {
            data_dir: "d".into(),
            levels_dir: Some("maps".into()),
            players_db: Some("db".into()),
        };
        assert_eq!(storage.levels_path(), PathBuf::from("maps"));
        assert_eq!(storage.players_path(), PathBuf::from("db"));
    }

    #[tokio::test]
    async fn default_file_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let path = path.to_str().unwrap();
        Config::create_default(path).await.unwrap();
        let config = Config::load(path).await.unwrap();
        assert_eq!(config.server.name, "BerlinMUD");
        assert_eq!(config.logging.file.as_deref(), Some("berlinmud.log"));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let err = Config::load("/definitely/not/here.toml").await.unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
