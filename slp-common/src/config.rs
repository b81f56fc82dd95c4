//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from a TOML file. Everything in it is
//! optional; a missing or unreadable file yields the built-in defaults.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (`--root-folder`, `--port`)
//! 2. Environment variables (`SLP_ROOT_FOLDER`, `GEMINI_API_KEY`, `GOOGLE_API_KEY`)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "SLP_ROOT_FOLDER";

/// Environment variables checked for the generation API key, highest priority first
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "slp.db";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder for the database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// HTTP bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP server port
    ///
    /// Default: 5780
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub generation: GenerationConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            bind_address: default_bind_address(),
            port: default_port(),
            logging: LoggingConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` overrides it
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Text generation service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// API key; environment variables take precedence
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Practice questions requested when the client does not say
    #[serde(default = "default_practice_question_count")]
    pub practice_question_count: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            practice_question_count: default_practice_question_count(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5780
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_practice_question_count() -> usize {
    5
}

/// Parse TOML configuration text
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// How [`read_toml_config`] arrived at its configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// No file at the path; defaults apply
    Missing,
    /// File read and parsed
    Loaded,
    /// File exists but could not be read; defaults apply
    Unreadable(String),
    /// File read but not valid configuration; defaults apply
    Invalid(String),
}

impl ConfigSource {
    /// Log the outcome for `path`; call once the subscriber is installed
    pub fn log(&self, path: &Path) {
        match self {
            ConfigSource::Missing => info!("No config file at {}, using defaults", path.display()),
            ConfigSource::Loaded => info!("Loaded config file {}", path.display()),
            ConfigSource::Unreadable(e) => {
                warn!("Could not read config file {}: {}. Using defaults", path.display(), e)
            }
            ConfigSource::Invalid(e) => warn!("{} ({}). Using defaults", e, path.display()),
        }
    }
}

/// Read the TOML configuration file without logging
///
/// Any problem with the file falls back to defaults and is reported in the
/// returned [`ConfigSource`]. Startup never fails here.
pub fn read_toml_config(path: &Path) -> (TomlConfig, ConfigSource) {
    if !path.exists() {
        return (TomlConfig::default(), ConfigSource::Missing);
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => return (TomlConfig::default(), ConfigSource::Unreadable(e.to_string())),
    };

    match parse_toml_config(&content) {
        Ok(config) => (config, ConfigSource::Loaded),
        Err(e) => (TomlConfig::default(), ConfigSource::Invalid(e.to_string())),
    }
}

/// Read the TOML configuration file and log the outcome
pub fn load_toml_config(path: &Path) -> TomlConfig {
    let (config, source) = read_toml_config(path);
    source.log(path);
    config
}

/// Default config file location: `~/.config/slp/slp-server.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("slp").join("slp-server.toml"))
        .unwrap_or_else(|| PathBuf::from("slp-server.toml"))
}

/// Root folder resolution
///
/// 1. Command-line argument (highest priority)
/// 2. `SLP_ROOT_FOLDER` environment variable
/// 3. TOML `root_folder`
/// 4. OS-dependent default
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "macos") {
        // ~/Library/Application Support/slp
        dirs::data_dir()
            .map(|d| d.join("slp"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/slp"))
    } else {
        // ~/.local/share/slp, %LOCALAPPDATA%\slp
        dirs::data_local_dir()
            .map(|d| d.join("slp"))
            .unwrap_or_else(|| PathBuf::from("./slp_data"))
    }
}

/// Database file inside the root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join(DATABASE_FILE)
}

/// Resolve the generation API key
///
/// **Priority:** `GEMINI_API_KEY` → `GOOGLE_API_KEY` → TOML
///
/// Returns `None` when no source holds a valid key. Multiple valid sources
/// are logged as a warning.
pub fn resolve_api_key(toml_config: &TomlConfig) -> Option<String> {
    let mut candidates: Vec<(&str, String)> = API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| std::env::var(name).ok().map(|key| (*name, key)))
        .collect();
    if let Some(key) = &toml_config.generation.api_key {
        candidates.push(("TOML", key.clone()));
    }
    candidates.retain(|(_, key)| is_valid_key(key));

    if candidates.len() > 1 {
        let sources: Vec<&str> = candidates.iter().map(|(source, _)| *source).collect();
        warn!(
            "Generation API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    match candidates.into_iter().next() {
        Some((source, key)) => {
            info!("Generation API key loaded from {}", source);
            Some(key.trim().to_string())
        }
        None => {
            warn!(
                "Generation API key not configured. Set GEMINI_API_KEY, or api_key under \
                 [generation] in {}",
                default_config_path().display()
            );
            None
        }
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
