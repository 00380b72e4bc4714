//! Configuration resolution for comprank-ai
//!
//! Values come from the environment first, then `config.toml`, then compiled
//! defaults. The API key has no default: the service refuses to start
//! without one.

use comprank_common::config::TomlConfig;
use comprank_common::{Error, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::services::rater::{DEFAULT_MODEL, DEFAULT_RETRY_BACKOFF};

pub const API_KEY_ENV: &str = "COMPRANK_API_KEY";

/// Variable name used by older deployments
pub const LEGACY_API_KEY_ENV: &str = "API_KEY";

pub const PASSWORD_ENV: &str = "COMPRANK_PASSWORD_SHA256";

pub const DEFAULT_PORT: u16 = 5740;
pub const DEFAULT_API_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

/// Fully resolved service settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub api_key: String,
    pub api_base_url: String,
    pub model: String,
    pub requests_per_minute: u32,
    pub retry_backoff: Duration,
    pub password_sha256: Option<String>,
    pub port: u16,
}

impl ServiceConfig {
    /// Resolve every setting; `port_override` comes from the command line
    pub fn resolve(toml_config: &TomlConfig, port_override: Option<u16>) -> Result<Self> {
        let api_key = resolve_api_key(toml_config)?;

        let password_sha256 = std::env::var(PASSWORD_ENV)
            .ok()
            .filter(|v| is_valid_key(v))
            .or_else(|| toml_config.password_sha256.clone().filter(|v| is_valid_key(v)));
        if password_sha256.is_none() {
            warn!("No password configured; the job endpoints are open to anyone who can reach the port");
        }

        Ok(Self {
            api_key,
            api_base_url: toml_config
                .api_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            model: toml_config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            requests_per_minute: toml_config
                .requests_per_minute
                .unwrap_or(DEFAULT_REQUESTS_PER_MINUTE),
            retry_backoff: toml_config
                .retry_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_RETRY_BACKOFF),
            password_sha256,
            port: port_override.or(toml_config.port).unwrap_or(DEFAULT_PORT),
        })
    }
}

/// Resolve the rating service API key
///
/// **Priority:** `COMPRANK_API_KEY` → `API_KEY` → TOML
pub fn resolve_api_key(toml_config: &TomlConfig) -> Result<String> {
    let candidates = [
        ("environment", std::env::var(API_KEY_ENV).ok()),
        ("legacy environment", std::env::var(LEGACY_API_KEY_ENV).ok()),
        ("TOML", toml_config.api_key.clone()),
    ];

    let valid: Vec<(&str, String)> = candidates
        .into_iter()
        .filter_map(|(source, key)| key.filter(|k| is_valid_key(k)).map(|k| (source, k)))
        .collect();

    if valid.len() > 1 {
        let sources: Vec<&str> = valid.iter().map(|(source, _)| *source).collect();
        warn!(
            "API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    match valid.into_iter().next() {
        Some((source, key)) => {
            info!("API key loaded from {}", source);
            Ok(key)
        }
        None => Err(Error::Config(format!(
            "Rating service API key not configured. Set one of:\n\
             1. Environment: {}=your-key-here\n\
             2. TOML config: ~/.config/comprank/config.toml (api_key = \"your-key\")",
            API_KEY_ENV
        ))),
    }
}

/// Validate a secret (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
