//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.trailguide/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::storage::BackendKind;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TrailguideConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    pub backend: Option<BackendKind>,
    pub dir: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub storage_backend: BackendKind,
    /// `None` = the default `~/.trailguide/storage/`.
    pub storage_dir: Option<PathBuf>,
}

/// CLI flags that can override the config (None = not specified).
#[derive(Debug, Default)]
pub struct CliOverrides<'a> {
    pub api_url: Option<&'a str>,
    pub storage: Option<BackendKind>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.trailguide/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".trailguide").join("config.toml"))
}

/// Load config from `~/.trailguide/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `TrailguideConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<TrailguideConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(TrailguideConfig::default());
        }
    };
    load_config_from(&path)
}

/// Same as [`load_config`] for an explicit path.
pub fn load_config_from(path: &Path) -> Result<TrailguideConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(TrailguideConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: TrailguideConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Trailguide Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [api]
# base_url = "http://localhost:3000/api"   # Or set TRAILGUIDE_API_URL
# timeout_secs = 15

# [storage]
# backend = "file"                         # "file" or "memory"; or TRAILGUIDE_STORAGE
# dir = "/home/me/.trailguide/storage"     # Or TRAILGUIDE_STORAGE_DIR
"#;

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, DEFAULT_CONFIG_TEMPLATE) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &TrailguideConfig, cli: &CliOverrides<'_>) -> ResolvedConfig {
    resolve_with_env(config, cli, |name| std::env::var(name).ok())
}

/// [`resolve`] with the environment lookup injected.
pub fn resolve_with_env<F>(config: &TrailguideConfig, cli: &CliOverrides<'_>, env: F) -> ResolvedConfig
where
    F: Fn(&str) -> Option<String>,
{
    // API base URL: CLI → env → config → default
    let api_base_url = cli
        .api_url
        .map(|s| s.to_string())
        .or_else(|| env("TRAILGUIDE_API_URL"))
        .or_else(|| config.api.base_url.clone())
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

    // Storage backend: CLI → env → config → default
    let env_backend = env("TRAILGUIDE_STORAGE").and_then(|raw| {
        let parsed = BackendKind::parse(&raw);
        if parsed.is_none() {
            warn!("Ignoring unknown TRAILGUIDE_STORAGE value: {}", raw);
        }
        parsed
    });
    let storage_backend = cli
        .storage
        .or(env_backend)
        .or(config.storage.backend)
        .unwrap_or_default();

    // Storage dir: env → config
    let storage_dir = env("TRAILGUIDE_STORAGE_DIR")
        .or_else(|| config.storage.dir.clone())
        .map(PathBuf::from);

    let timeout_secs = match config.api.timeout_secs {
        Some(0) => {
            warn!("timeout_secs = 0 is not allowed, using {}", DEFAULT_TIMEOUT_SECS);
            DEFAULT_TIMEOUT_SECS
        }
        Some(secs) => secs,
        None => DEFAULT_TIMEOUT_SECS,
    };

    ResolvedConfig {
        api_base_url,
        request_timeout: Duration::from_secs(timeout_secs),
        storage_backend,
        storage_dir,
    }
}
