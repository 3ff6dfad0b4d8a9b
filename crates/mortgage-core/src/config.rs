use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

/// Endpoint used when neither the environment nor the config file names one
pub const FALLBACK_BASE_URL: &str = "https://lernout-hauspie.onrender.com";
pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;
pub const DEFAULT_MAX_MESSAGES: usize = 100;

pub const BASE_URL_ENV: &str = "MORTGAGE_API_BASE_URL";
pub const TIMEOUT_ENV: &str = "MORTGAGE_API_TIMEOUT_MS";

/// Base URL baked in at build time, if `MORTGAGE_API_BASE_URL` was set then
const BUILD_BASE_URL: Option<&str> = option_env!("MORTGAGE_API_BASE_URL");

/// Connection settings handed to [`crate::ChatClient::new`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout = Duration::from_millis(timeout_ms);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(BUILD_BASE_URL.unwrap_or(FALLBACK_BASE_URL))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub max_messages: Option<usize>,
    pub session_file: Option<PathBuf>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Read the config at `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config {:?}: {}", path, e))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Invalid config {:?}: {}", path, e))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::get_config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Resolve client settings: environment first, then this file, then
    /// build-time and hardcoded defaults.
    pub fn client_config(&self) -> ClientConfig {
        let env_url = std::env::var(BASE_URL_ENV).ok();
        let env_timeout = std::env::var(TIMEOUT_ENV).ok();
        self.resolve(env_url.as_deref(), env_timeout.as_deref())
    }

    fn resolve(&self, env_url: Option<&str>, env_timeout: Option<&str>) -> ClientConfig {
        let base_url = env_url
            .filter(|url| !url.trim().is_empty())
            .map(str::to_string)
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| BUILD_BASE_URL.unwrap_or(FALLBACK_BASE_URL).to_string());

        let timeout_ms = env_timeout
            .and_then(|t| t.trim().parse::<u64>().ok())
            .or(self.timeout_ms)
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        ClientConfig::new(&base_url).with_timeout_ms(timeout_ms)
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages.unwrap_or(DEFAULT_MAX_MESSAGES)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("mortgage-assist").join("config.json"))
    }
}
