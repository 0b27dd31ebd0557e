//! Configuration resolution for the room player
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (handled by clap's `env` attribute)
//! 3. TOML config file (`~/.config/jamroom/config.toml`)
//! 4. Compiled default (fallback)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Resolved room player configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen port
    pub port: u16,
    /// SQLite database path
    pub db_path: PathBuf,
    /// Base URL of the song resolver service
    pub resolver_url: String,
    /// Resolver request timeout in seconds
    pub resolver_timeout_secs: u64,
    /// Transport target the room streams into (e.g. a channel name)
    pub transport_target: String,
}

/// Optional overrides read from the TOML config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub db_path: Option<PathBuf>,
    pub resolver_url: Option<String>,
    pub resolver_timeout_secs: Option<u64>,
    pub transport_target: Option<String>,
}

impl Config {
    /// Merge CLI/env values with file overrides and compiled defaults.
    ///
    /// CLI and env values arrive already merged by clap; a `None` here means
    /// neither was given, so the file value (then the default) applies.
    pub fn resolve(
        port: Option<u16>,
        db_path: Option<PathBuf>,
        resolver_url: Option<String>,
        transport_target: Option<String>,
        file: FileConfig,
    ) -> Self {
        Self {
            port: port.or(file.port).unwrap_or(5760),
            db_path: db_path
                .or(file.db_path)
                .unwrap_or_else(default_db_path),
            resolver_url: resolver_url
                .or(file.resolver_url)
                .unwrap_or_else(|| "http://127.0.0.1:5761".to_string()),
            resolver_timeout_secs: file.resolver_timeout_secs.unwrap_or(10),
            transport_target: transport_target
                .or(file.transport_target)
                .unwrap_or_else(|| "main".to_string()),
        }
    }

    /// Load the TOML config file if one exists; absent file is not an error.
    pub fn load_file() -> Result<FileConfig> {
        let Some(path) = config_file_path() else {
            return Ok(FileConfig::default());
        };
        if !path.exists() {
            return Ok(FileConfig::default());
        }

        let contents = std::fs::read_to_string(&path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }
}

/// Platform config file location: `<config dir>/jamroom/config.toml`
fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("jamroom").join("config.toml"))
}

/// Default database location: `<local data dir>/jamroom/jamroom.db`
fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("jamroom").join("jamroom.db"))
        .unwrap_or_else(|| PathBuf::from("jamroom.db"))
}
