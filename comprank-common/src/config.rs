//! Configuration loading and root folder resolution
//!
//! Resolution priority for the root folder:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "COMPRANK_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "comprank.db";

/// Contents of `config.toml`
///
/// Every field is optional: a missing file or a missing key falls back to
/// compiled defaults, never to a startup failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Folder holding the job database
    pub root_folder: Option<String>,

    /// Tracing filter directive (e.g. "info", "comprank_ai=debug")
    pub log_level: Option<String>,

    /// HTTP listen port
    pub port: Option<u16>,

    /// Bearer token for the rating service
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible rating service
    pub api_base_url: Option<String>,

    /// Model name sent with each rating request
    pub model: Option<String>,

    /// Outbound rating requests allowed per minute
    pub requests_per_minute: Option<u32>,

    /// Delay before the single retry of a failed rating call
    pub retry_backoff_ms: Option<u64>,

    /// Hex SHA-256 digest of the access password; None disables the gate
    pub password_sha256: Option<String>,
}

impl TomlConfig {
    /// Load configuration from `path`
    ///
    /// A missing file yields defaults with a warning. A file that exists but
    /// cannot be parsed is a configuration error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

        debug!(path = %path.display(), "Loaded TOML config");
        Ok(config)
    }

    /// Load from the platform default location, or defaults if there is none
    pub fn load_default() -> Result<Self> {
        match default_config_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}

/// Platform config file location: `<config dir>/comprank/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("comprank").join("config.toml"))
}

/// Resolve the root folder following CLI → ENV → TOML → default
pub fn resolve_root_folder(
    cli_arg: Option<&str>,
    env_var_name: &str,
    toml_config: &TomlConfig,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.root_folder {
        return PathBuf::from(path);
    }

    default_root_folder()
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("comprank"))
        .unwrap_or_else(|| PathBuf::from("./comprank_data"))
}

/// Create the root folder if missing and return the database path inside it
pub fn ensure_root_folder(root_folder: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(root_folder).map_err(|e| {
        Error::Config(format!(
            "Failed to create root folder {}: {}",
            root_folder.display(),
            e
        ))
    })?;
    Ok(root_folder.join(DATABASE_FILE))
}

/// User-Agent sent by outbound HTTP clients
pub fn get_user_agent() -> String {
    format!("comprank/{}", env!("CARGO_PKG_VERSION"))
}
