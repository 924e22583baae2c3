use std::{fmt, fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::{
    client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT},
    error::ConfigError,
};

pub const API_KEY_ENV: &str = "WEATHER_API_KEY";
pub const BASE_URL_ENV: &str = "WEATHER_API_BASE_URL";
pub const PLACEHOLDER_API_KEY: &str = "your_api_key_here";

pub const APP_NAME: &str = "Weather Forecast";
pub const DEFAULT_CITY: &str = "Seattle";

/// Contents of the on-disk config file. Every field is optional.
///
/// Example TOML:
/// [api]
/// key = "..."
/// timeout_secs = 10
///
/// [app]
/// default_city = "Seattle"
///
/// [features]
/// enable_logging = true
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    pub api: ApiSection,
    pub app: AppSection,
    pub features: FeatureSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ApiSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_city: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct FeatureSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_logging: Option<bool>,
}

impl FileConfig {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self, ConfigError> {
        let Some(path) = Self::locate() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents =
            fs::read_to_string(&path).map_err(|source| ConfigError::Read { path: path.clone(), source })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(path)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Self::locate().ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    fn locate() -> Option<PathBuf> {
        ProjectDirs::from("dev", "weather-forecast", "forecast")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api.key = Some(api_key);
    }
}

/// OpenWeatherMap API key. Its `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Rejects absent, blank and placeholder keys.
    pub fn parse(raw: Option<&str>) -> Result<Self, ConfigError> {
        let key = raw.map(str::trim).filter(|k| !k.is_empty()).ok_or(ConfigError::MissingApiKey)?;
        if key == PLACEHOLDER_API_KEY {
            return Err(ConfigError::PlaceholderApiKey);
        }
        Ok(Self(key.to_owned()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub key: ApiKey,
    pub base_url: Url,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub name: &'static str,
    pub version: &'static str,
    pub default_city: String,
}

#[derive(Debug, Clone)]
pub struct Features {
    pub enable_logging: bool,
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub app: AppConfig,
    pub features: Features,
}

impl Config {
    /// Reads the config file and process environment. Any error here is fatal.
    pub fn load() -> Result<Self, ConfigError> {
        let file = FileConfig::load()?;
        Self::resolve(file, |name| std::env::var(name).ok())
    }

    /// Merges file values with environment lookups; a non-blank environment
    /// value wins.
    pub fn resolve(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let lookup = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        let key = lookup(API_KEY_ENV).or(file.api.key);
        let key = ApiKey::parse(key.as_deref())?;

        let base_url = lookup(BASE_URL_ENV).or(file.api.base_url);
        let base_url = parse_base_url(base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;

        let timeout = file
            .api
            .timeout_secs
            .filter(|secs| *secs > 0)
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);

        Ok(Self {
            api: ApiConfig { key, base_url, timeout },
            app: AppConfig {
                name: APP_NAME,
                version: env!("CARGO_PKG_VERSION"),
                default_city: file.app.default_city.unwrap_or_else(|| DEFAULT_CITY.to_owned()),
            },
            features: Features {
                enable_logging: file.features.enable_logging.unwrap_or(cfg!(debug_assertions)),
            },
        })
    }
}

/// Accepts absolute http(s) URLs only.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl { url: raw.to_owned(), reason };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    Ok(url)
}
