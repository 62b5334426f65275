//! Configuration resolution for chaser
//!
//! Provides two-tier configuration resolution with ENV → TOML priority.
//! Environment variables win; the TOML file is the fallback for deployments
//! that keep credentials out of the process environment.

use crate::error::{Error, Result};
use crate::viz::capture::CaptureConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Canonical name of the target artist the whole system is biased toward
pub const DEFAULT_TARGET_ARTIST: &str = "femtanyl";

/// Default on-disk affinity cache location
pub const DEFAULT_CACHE_PATH: &str = "chaser.cache";

/// TOML configuration file contents (all fields optional)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Spotify client ID
    pub client_id: Option<String>,
    /// Spotify client secret
    pub client_secret: Option<String>,
    /// HTTP listen port
    pub port: Option<u16>,
    /// Affinity cache file path
    pub cache_path: Option<PathBuf>,
    /// Target artist override
    pub target_artist: Option<String>,
    /// Audio capture command override
    pub capture_command: Option<String>,
}

impl TomlConfig {
    /// Default config file location: `<config dir>/chaser/chaser.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("chaser").join("chaser.toml"))
            .unwrap_or_else(|| PathBuf::from("chaser.toml"))
    }

    /// Load the TOML config, treating a missing file as empty defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }
}

/// Resolved application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Spotify client ID
    pub client_id: String,
    /// Spotify client secret
    pub client_secret: String,
    /// HTTP listen port
    pub port: u16,
    /// Affinity cache file path
    pub cache_path: PathBuf,
    /// Target artist canonical name
    pub target_artist: String,
    /// Audio capture subprocess configuration
    pub capture: CaptureConfig,
}

impl Config {
    /// Resolve the full configuration from environment and TOML
    ///
    /// `port` and `cache_path` are CLI-level overrides and win over both
    /// tiers when present.
    pub fn resolve(
        toml: &TomlConfig,
        port: Option<u16>,
        cache_path: Option<PathBuf>,
    ) -> Result<Self> {
        let client_id = resolve_value("client_id", "SPOTIFY_CLIENT_ID", toml.client_id.as_ref())
            .ok_or_else(|| missing_credential_error("SPOTIFY_CLIENT_ID", "client_id"))?;
        let client_secret = resolve_value(
            "client_secret",
            "SPOTIFY_CLIENT_SECRET",
            toml.client_secret.as_ref(),
        )
        .ok_or_else(|| missing_credential_error("SPOTIFY_CLIENT_SECRET", "client_secret"))?;

        let mut capture = CaptureConfig::default();
        if let Some(command) = &toml.capture_command {
            capture.command = command.clone();
        }

        Ok(Self {
            client_id,
            client_secret,
            port: port.or(toml.port).unwrap_or(5000),
            cache_path: cache_path
                .or_else(|| toml.cache_path.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_PATH)),
            target_artist: toml
                .target_artist
                .clone()
                .unwrap_or_else(|| DEFAULT_TARGET_ARTIST.to_string()),
            capture,
        })
    }
}

/// Resolve a single value with ENV → TOML priority
///
/// Warns when both tiers carry a valid value (potential misconfiguration).
fn resolve_value(name: &str, env_var: &str, toml_value: Option<&String>) -> Option<String> {
    let env_value = std::env::var(env_var).ok().filter(|v| is_valid_value(v));
    let toml_value = toml_value.filter(|v| is_valid_value(v.as_str()));

    let mut sources = Vec::new();
    if env_value.is_some() {
        sources.push("environment");
    }
    if toml_value.is_some() {
        sources.push("TOML");
    }

    if sources.len() > 1 {
        warn!(
            "{} found in multiple sources: {}. Using environment (highest priority).",
            name,
            sources.join(", ")
        );
    }

    if let Some(value) = env_value {
        info!("{} loaded from environment variable", name);
        return Some(value);
    }
    if let Some(value) = toml_value {
        info!("{} loaded from TOML config", name);
        return Some(value.clone());
    }
    None
}

fn missing_credential_error(env_var: &str, toml_key: &str) -> Error {
    Error::Config(format!(
        "Spotify credentials not configured. Please configure using one of:\n\
         1. Environment: {}=your-value-here\n\
         2. TOML config: {} ({} = \"your-value\")\n\
         \n\
         Obtain credentials at: https://developer.spotify.com/dashboard",
        env_var,
        TomlConfig::default_path().display(),
        toml_key
    ))
}

/// Validate a configuration value (non-empty, non-whitespace)
pub fn is_valid_value(value: &str) -> bool {
    !value.trim().is_empty()
}
