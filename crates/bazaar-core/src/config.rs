//! Configuration system for bazaar.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $BAZAAR_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/bazaar/config.toml
//!   3. ~/.config/bazaar/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BazaarConfig {
    pub server: ServerConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// TCP port the storefront listens on.
    pub port: u16,
    /// Charset stamped into text responses.
    pub encoding: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sessions idle this many seconds are eligible for eviction.
    pub timeout_secs: u64,
    /// How often the housekeeping sweep runs.
    pub housekeeping_period_secs: u64,
    /// Name of the session identifier cookie.
    pub cookie_name: String,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            encoding: "utf-8".to_string(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15 * 60,
            housekeeping_period_secs: 60,
            cookie_name: "bazaar.session".to_string(),
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl BazaarConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load from an explicit path, falling back to [`Self::file_path`].
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::file_path);
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            BazaarConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("BAZAAR_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&BazaarConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text)
                .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply BAZAAR_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("BAZAAR_SERVER__PORT") {
            if let Ok(p) = v.parse() {
                self.server.port = p;
            }
        }
        if let Ok(v) = std::env::var("BAZAAR_SERVER__ENCODING") {
            self.server.encoding = v;
        }
        if let Ok(v) = std::env::var("BAZAAR_SESSION__TIMEOUT_SECS") {
            if let Ok(t) = v.parse() {
                self.session.timeout_secs = t;
            }
        }
        if let Ok(v) = std::env::var("BAZAAR_SESSION__HOUSEKEEPING_PERIOD_SECS") {
            if let Ok(p) = v.parse() {
                self.session.housekeeping_period_secs = p;
            }
        }
        if let Ok(v) = std::env::var("BAZAAR_SESSION__COOKIE_NAME") {
            self.session.cookie_name = v;
        }
    }

    /// Startup validation. Failures here are fatal before the listener
    /// binds — never to a running server.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".into()));
        }
        if !matches!(
            self.server.encoding.as_str(),
            "utf-8" | "us-ascii" | "iso-8859-1"
        ) {
            return Err(ConfigError::Invalid(format!(
                "server.encoding {:?} is not one of utf-8, us-ascii, iso-8859-1",
                self.server.encoding
            )));
        }
        if self.session.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "session.timeout_secs must be non-zero".into(),
            ));
        }
        if self.session.housekeeping_period_secs == 0 {
            return Err(ConfigError::Invalid(
                "session.housekeeping_period_secs must be non-zero".into(),
            ));
        }
        let name = &self.session.cookie_name;
        if name.is_empty() || name.contains(|c: char| c.is_whitespace() || c == ';' || c == '=') {
            return Err(ConfigError::Invalid(format!(
                "session.cookie_name {name:?} is not a valid cookie token"
            )));
        }
        Ok(())
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session.timeout_secs)
    }

    pub fn housekeeping_period(&self) -> Duration {
        Duration::from_secs(self.session.housekeeping_period_secs)
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("bazaar")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}
