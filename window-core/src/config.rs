use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf, time::Duration};

pub const DEFAULT_SERVER_BASE: &str = "http://localhost:8000";
pub const DEFAULT_DEVICE_BASE: &str = "http://172.20.10.4";
pub const DEFAULT_LOCATION: &str = "광주광역시";

/// Timer periods of the panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Polling {
    pub weather_refresh_secs: u64,
    pub status_poll_secs: u64,
    pub search_debounce_ms: u64,
    pub http_timeout_secs: u64,
}

impl Default for Polling {
    fn default() -> Self {
        Self {
            weather_refresh_secs: 5 * 60,
            status_poll_secs: 3,
            search_debounce_ms: 300,
            http_timeout_secs: 5,
        }
    }
}

impl Polling {
    pub fn weather_refresh(&self) -> Duration {
        Duration::from_secs(self.weather_refresh_secs.max(1))
    }

    pub fn status_poll(&self) -> Duration {
        Duration::from_secs(self.status_poll_secs.max(1))
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// server_base = "http://localhost:8000"
/// device_base = "http://172.20.10.4"
/// default_location = "광주광역시"
///
/// [polling]
/// status_poll_secs = 3
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Weather / region backend, e.g. "http://localhost:8000".
    pub server_base: Option<String>,

    /// Window actuator, e.g. "http://172.20.10.4".
    pub device_base: Option<String>,

    pub default_location: Option<String>,

    #[serde(default)]
    pub polling: Polling,
}

impl Config {
    pub fn server_base(&self) -> &str {
        non_blank(self.server_base.as_deref()).unwrap_or(DEFAULT_SERVER_BASE)
    }

    pub fn device_base(&self) -> &str {
        non_blank(self.device_base.as_deref()).unwrap_or(DEFAULT_DEVICE_BASE)
    }

    pub fn default_location(&self) -> &str {
        non_blank(self.default_location.as_deref()).unwrap_or(DEFAULT_LOCATION)
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
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

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "window-panel", "window-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply `WINDOW_SERVER_BASE`, `WINDOW_DEVICE_BASE` and
    /// `WINDOW_DEFAULT_LOCATION` on top of the file values.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let pick = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = pick("WINDOW_SERVER_BASE") {
            self.server_base = Some(v);
        }
        if let Some(v) = pick("WINDOW_DEVICE_BASE") {
            self.device_base = Some(v);
        }
        if let Some(v) = pick("WINDOW_DEFAULT_LOCATION") {
            self.default_location = Some(v);
        }

        self
    }

    pub fn log_config(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  server_base      : {}", self.server_base());
        tracing::info!("  device_base      : {}", self.device_base());
        tracing::info!("  default_location : {}", self.default_location());
        tracing::info!("  polling          : {:?}", self.polling);
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
