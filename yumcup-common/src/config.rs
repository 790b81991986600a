//! Configuration loading
//!
//! Config file resolution follows a fixed priority order:
//! 1. Explicit path (command-line `--config`)
//! 2. `YUMCUP_CONFIG` environment variable
//! 3. Platform config dir (`~/.config/yumcup/config.toml` on Linux)
//! 4. Compiled defaults
//!
//! A missing file is not an error: defaults are used and a warning logged.
//! A file that exists but fails to parse is a [`Error::Config`].

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::geo::Coordinates;
use crate::{Error, Result};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "YUMCUP_CONFIG";

/// Game server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Listen address
    pub bind: String,

    /// Largest pool seeded into one bracket
    pub max_candidates: usize,

    /// Games untouched for this long are evicted
    pub game_idle_timeout_secs: u64,

    pub provider: ProviderConfig,

    pub legacy: LegacyConfig,

    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5780".to_string(),
            max_candidates: 16,
            game_idle_timeout_secs: 1800,
            provider: ProviderConfig::default(),
            legacy: LegacyConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Which candidate catalog backs the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Kakao,
    Static,
}

/// Candidate catalog configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,

    /// Kakao REST API key (falls back to `KAKAO_API_KEY`)
    pub kakao_api_key: Option<String>,

    /// Kakao Local API base URL
    pub kakao_base_url: String,

    /// JSON file of candidates for the static provider
    pub static_path: Option<PathBuf>,

    /// Lifetime of cached search results; 0 disables the cache
    pub cache_ttl_secs: u64,

    /// Per-request timeout against the catalog
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Kakao,
            kakao_api_key: None,
            kakao_base_url: "https://dapi.kakao.com".to_string(),
            static_path: None,
            cache_ttl_secs: 3600,
            request_timeout_secs: 10,
        }
    }
}

/// Search parameters for the stateless `GET /api/yumcup/start`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LegacyConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: u32,
}

impl Default for LegacyConfig {
    fn default() -> Self {
        // Seoul City Hall
        Self {
            latitude: 37.5665,
            longitude: 126.9780,
            radius: 1000,
        }
    }
}

impl LegacyConfig {
    pub fn center(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the first config file found, or defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match resolve_config_path(explicit) {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                let text = std::fs::read_to_string(&path)?;
                Self::from_toml_str(&text)
            }
            None => {
                warn!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_candidates < 2 {
            return Err(Error::Config(format!(
                "max_candidates must be at least 2, got {}",
                self.max_candidates
            )));
        }
        self.legacy
            .center()
            .validate()
            .map_err(|e| Error::Config(format!("legacy center: {}", e)))?;
        if self.provider.kind == ProviderKind::Static && self.provider.static_path.is_none() {
            return Err(Error::Config(
                "provider.static_path is required when provider.kind = \"static\"".to_string(),
            ));
        }
        Ok(())
    }
}

/// Find the config file per the priority order in the module docs
///
/// An explicit path is returned even if it does not exist, so the caller
/// reports the missing file instead of silently using defaults.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join("yumcup").join("config.toml"))
        .filter(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.max_candidates, 16);
        assert_eq!(config.provider.kind, ProviderKind::Kakao);
        assert_eq!(config.provider.cache_ttl_secs, 3600);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
            max_candidates = 8
            [provider]
            kind = "static"
            static_path = "venues.json"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_candidates, 8);
        assert_eq!(config.provider.kind, ProviderKind::Static);
        assert_eq!(config.provider.request_timeout_secs, 10);
        assert_eq!(config.legacy.radius, 1000);
    }

    #[test]
    fn static_provider_requires_path() {
        let err = TomlConfig::from_toml_str("[provider]\nkind = \"static\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rejects_tiny_pool() {
        assert!(TomlConfig::from_toml_str("max_candidates = 1").is_err());
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("max_candidates = \"many\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
