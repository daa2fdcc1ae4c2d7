//! Base-URL selection and the optional `config.toml` in the user's config
//! directory.

use crate::session::SessionBackend;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Dev server address; it proxies `/api` to the backend.
pub const DEV_BASE_URL: &str = "http://localhost:8080/api";
/// Backend host when talking to it directly.
pub const PROD_BASE_URL: &str = "http://localhost:8000";
/// Environment variable that overrides the configured base URL.
pub const API_URL_ENV: &str = "GANSTER_API_URL";

const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("could not encode config: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("invalid API URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("API URL must be http or https, got {0:?}")]
    UnsupportedScheme(String),
}

/// Which backend address a build talks to by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiEnvironment {
    Development,
    Production,
}

impl ApiEnvironment {
    /// Fixed at compile time: debug builds are development builds.
    pub const fn current() -> Self {
        if cfg!(debug_assertions) {
            ApiEnvironment::Development
        } else {
            ApiEnvironment::Production
        }
    }

    pub const fn base_url(self) -> &'static str {
        match self {
            ApiEnvironment::Development => DEV_BASE_URL,
            ApiEnvironment::Production => PROD_BASE_URL,
        }
    }
}

pub const fn default_base_url() -> &'static str {
    ApiEnvironment::current().base_url()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    pub session_backend: SessionBackend,
    pub poll_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            session_backend: SessionBackend::default(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl Config {
    /// `config.toml` inside the platform config directory.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let proj_dirs =
            ProjectDirs::from("com", "ganster", "ganster").ok_or(ConfigError::NoConfigDir)?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Loads from the default path. A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    /// Picks the base URL once for the lifetime of the process.
    ///
    /// Precedence: explicit flag, `GANSTER_API_URL`, `api_url` from the file,
    /// then the compile-time default.
    pub fn resolve_base_url(&self, flag: Option<&str>) -> Result<Url, ConfigError> {
        self.pick_base_url(flag, std::env::var(API_URL_ENV).ok())
    }

    fn pick_base_url(&self, flag: Option<&str>, env: Option<String>) -> Result<Url, ConfigError> {
        let chosen = flag
            .map(str::to_string)
            .or(env.filter(|v| !v.trim().is_empty()))
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| default_base_url().to_string());

        let url = Url::parse(chosen.trim()).map_err(|source| ConfigError::InvalidUrl {
            url: chosen.clone(),
            source,
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.poll_interval(), Duration::from_secs(10));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "session_backend = \"keyring\"\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.session_backend, SessionBackend::Keyring);
        assert_eq!(cfg.api_url, None);
        assert_eq!(cfg.poll_interval_secs, 10);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ganster").join("config.toml");
        let cfg = Config {
            api_url: Some("https://qa.example.com".into()),
            session_backend: SessionBackend::Memory,
            poll_interval_secs: 30,
        };
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn base_url_precedence() {
        let cfg = Config {
            api_url: Some("http://from-file:8000/".into()),
            ..Config::default()
        };

        let url = cfg
            .pick_base_url(Some("http://flag:1"), Some("http://env:2".into()))
            .unwrap();
        assert_eq!(url.as_str(), "http://flag:1/");

        let url = cfg.pick_base_url(None, Some("http://env:2".into())).unwrap();
        assert_eq!(url.as_str(), "http://env:2/");

        let url = cfg.pick_base_url(None, Some("  ".into())).unwrap();
        assert_eq!(url.as_str(), "http://from-file:8000/");

        let url = Config::default().pick_base_url(None, None).unwrap();
        assert_eq!(url, Url::parse(default_base_url()).unwrap());
    }

    #[test]
    fn relative_base_url_is_rejected() {
        let err = Config::default()
            .pick_base_url(Some("/api"), None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));

        let err = Config::default()
            .pick_base_url(Some("ftp://files.example.com"), None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedScheme(_)));
    }

    #[test]
    fn environment_urls_differ() {
        assert_ne!(
            ApiEnvironment::Development.base_url(),
            ApiEnvironment::Production.base_url()
        );
    }
}
