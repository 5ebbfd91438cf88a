//! Configuration management.

use crate::paths::{DataPaths, PathConfig};
use crate::state::DEFAULT_DEBOUNCE;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration structure that matches the TOML file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    save: SaveConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerConfig {
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct StorageConfig {
    data_dir: Option<PathBuf>,
    document_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SaveConfig {
    /// Milliseconds an edit burst must stay quiet before the document is written
    #[serde(default = "default_debounce_ms")]
    debounce_ms: u64,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct LoggingConfig {
    /// Path to log file (if set, logs will be written to file in addition to stdout)
    log_file: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error)
    /// If not set, uses RUST_LOG environment variable or defaults to "info"
    log_level: Option<String>,
}

fn default_port() -> u16 {
    klang_types::DEFAULT_PORT
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE.as_millis() as u64
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,
    /// Path to the configuration document
    pub document_path: PathBuf,
    /// Debounce window between an edit and the write it triggers
    pub debounce: Duration,
    /// Path to log file (if set, logs will be written to file in addition to stdout)
    pub log_file: Option<PathBuf>,
    /// Log level (if set, overrides RUST_LOG environment variable)
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with full priority chain: CLI args > env vars > config files > defaults.
    ///
    /// Config files are searched in this order:
    /// 1. `.klang.toml` in current directory
    /// 2. `config.toml` in user config directory (~/.config/klang/ on Linux)
    pub fn from_figment(
        port: Option<u16>,
        data_dir: Option<PathBuf>,
        document_path: Option<PathBuf>,
        debounce_ms: Option<u64>,
    ) -> anyhow::Result<Self> {
        // Find config file paths
        let local_config = std::env::current_dir().ok().map(|d| d.join(".klang.toml"));
        let user_config = directories::ProjectDirs::from("", "", "klang")
            .map(|dirs| dirs.config_dir().join("config.toml"));

        // Build figment with priority: defaults < user config < local config < env vars < CLI args
        let mut figment = Figment::new();

        // 1. Start with defaults
        figment = figment.merge(Serialized::defaults(ConfigFile {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            save: SaveConfig::default(),
            logging: LoggingConfig::default(),
        }));

        // 2. Merge user config file if it exists
        if let Some(ref path) = user_config {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        // 3. Merge local config file if it exists
        if let Some(ref path) = local_config {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        // 4. Merge environment variables (KLANG_* prefix)
        figment = figment.merge(
            Env::prefixed("KLANG_")
                .map(|key| key.as_str().replace("__", ".").into())
                .split("_"),
        );

        // 5. Merge CLI arguments (highest priority)
        if let Some(p) = port {
            figment = figment.merge(Serialized::default("server.port", p));
        }
        if let Some(ref dd) = data_dir {
            figment = figment.merge(Serialized::default("storage.data_dir", dd));
        }
        if let Some(ref dp) = document_path {
            figment = figment.merge(Serialized::default("storage.document_path", dp));
        }
        if let Some(ms) = debounce_ms {
            figment = figment.merge(Serialized::default("save.debounce_ms", ms));
        }

        // Extract the configuration
        let config_file: ConfigFile = figment.extract()?;

        // Resolve the document path
        let path_config = PathConfig {
            data_dir: config_file.storage.data_dir,
            document_path: config_file.storage.document_path,
        };
        let data_paths = DataPaths::resolve(path_config)?;

        Ok(Self {
            port: config_file.server.port,
            document_path: data_paths.document_path,
            debounce: Duration::from_millis(config_file.save.debounce_ms),
            log_file: config_file.logging.log_file,
            log_level: config_file.logging.log_level,
        })
    }
}
