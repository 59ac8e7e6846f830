// Configuration Storage Service
// Handles config file read/write, version backup and credential resolution

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const PROVIDER_OPENAI: &str = "openai";
pub const PROVIDER_GEMINI: &str = "gemini";
pub const PROVIDER_GPTZERO: &str = "gptzero";
pub const PROVIDER_GOOGLE_SEARCH: &str = "google_search";

const MAX_BACKUPS: usize = 10;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(String),
    #[error("Failed to serialize config: {0}")]
    Serialize(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: String,
    pub proxy: Option<ProxyConfig>,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            proxy: None,
            analysis: AnalysisConfig::default(),
            providers: HashMap::new(),
            api_keys: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    #[serde(default)]
    pub enabled: bool,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    #[serde(default = "default_min_words")]
    pub min_words: usize,
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_secs: u64,
    #[serde(default = "default_detector_timeout")]
    pub detector_timeout_secs: u64,
    #[serde(default = "default_search_timeout")]
    pub search_timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_words: default_min_words(),
            provider_timeout_secs: default_provider_timeout(),
            detector_timeout_secs: default_detector_timeout(),
            search_timeout_secs: default_search_timeout(),
        }
    }
}

impl AnalysisConfig {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs.max(1))
    }

    pub fn detector_timeout(&self) -> Duration {
        Duration::from_secs(self.detector_timeout_secs.max(1))
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub model: Option<String>,
    pub base_url: Option<String>,
    /// Search engine id (`cx`) for Google Custom Search.
    pub engine_id: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: None,
            base_url: None,
            engine_id: None,
        }
    }
}

fn default_version() -> String { "1".to_string() }
fn default_true() -> bool { true }
fn default_min_words() -> usize { 50 }
fn default_provider_timeout() -> u64 { 30 }
fn default_detector_timeout() -> u64 { 30 }
fn default_search_timeout() -> u64 { 10 }

/// Resolved secrets handed to provider constructors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gptzero_api_key: Option<String>,
    pub google_search_api_key: Option<String>,
    pub google_search_engine_id: Option<String>,
}

fn env_names(provider: &str) -> &'static [&'static str] {
    match provider {
        PROVIDER_OPENAI => &["OPENAI_API_KEY", "TEXTGUARD_OPENAI_API_KEY"],
        PROVIDER_GEMINI => &["GEMINI_API_KEY", "TEXTGUARD_GEMINI_API_KEY"],
        PROVIDER_GPTZERO => &["GPTZERO_API_KEY", "TEXTGUARD_GPTZERO_API_KEY"],
        PROVIDER_GOOGLE_SEARCH => &["GOOGLE_SEARCH_API_KEY", "TEXTGUARD_GOOGLE_SEARCH_API_KEY"],
        _ => &[],
    }
}

fn first_env(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AppConfig {
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    pub fn provider_enabled(&self, name: &str) -> bool {
        self.provider(name).map_or(true, |p| p.enabled)
    }

    pub fn provider_model(&self, name: &str) -> Option<String> {
        self.provider(name).and_then(|p| non_empty(p.model.as_ref()))
    }

    pub fn provider_url(&self, name: &str) -> Option<String> {
        self.provider(name).and_then(|p| non_empty(p.base_url.as_ref()))
    }

    pub fn proxy_url(&self) -> Option<String> {
        self.proxy
            .as_ref()
            .filter(|p| p.enabled)
            .and_then(|p| non_empty(p.url.as_ref()))
    }

    /// API key for a provider: environment first, then the config file.
    /// Disabled providers resolve to `None`.
    pub fn api_key(&self, provider: &str) -> Option<String> {
        if !self.provider_enabled(provider) {
            return None;
        }
        first_env(env_names(provider)).or_else(|| non_empty(self.api_keys.get(provider)))
    }

    pub fn credentials(&self) -> Credentials {
        let google_search_engine_id = if self.provider_enabled(PROVIDER_GOOGLE_SEARCH) {
            first_env(&["GOOGLE_SEARCH_ENGINE_ID", "TEXTGUARD_GOOGLE_SEARCH_ENGINE_ID"]).or_else(
                || {
                    self.provider(PROVIDER_GOOGLE_SEARCH)
                        .and_then(|p| non_empty(p.engine_id.as_ref()))
                },
            )
        } else {
            None
        };

        Credentials {
            openai_api_key: self.api_key(PROVIDER_OPENAI),
            gemini_api_key: self.api_key(PROVIDER_GEMINI),
            gptzero_api_key: self.api_key(PROVIDER_GPTZERO),
            google_search_api_key: self.api_key(PROVIDER_GOOGLE_SEARCH),
            google_search_engine_id,
        }
    }
}

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_dir, config_file }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("textguard"))
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Load configuration; a missing file yields defaults.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.config_file.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_file)?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration, backing up the previous file.
    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.config_dir)?;

        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(&self.config_file, content)?;
        Ok(())
    }

    fn create_backup(&self) -> Result<(), ConfigError> {
        let backup_dir = self.config_dir.join("backups");
        fs::create_dir_all(&backup_dir)?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S%3f");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));
        fs::copy(&self.config_file, &backup_file)?;

        self.cleanup_old_backups(&backup_dir, MAX_BACKUPS)
    }

    /// Remove old backups, keeping only the most recent N
    fn cleanup_old_backups(&self, backup_dir: &Path, keep: usize) -> Result<(), ConfigError> {
        let mut entries: Vec<_> = fs::read_dir(backup_dir)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
            .collect();

        if entries.len() <= keep {
            return Ok(());
        }

        // Names embed the timestamp, so lexical order is chronological.
        entries.sort_by_key(|e| e.file_name());

        let remove_count = entries.len() - keep;
        for entry in entries.iter().take(remove_count) {
            let _ = fs::remove_file(entry.path());
        }

        Ok(())
    }

    /// Store provider API key in config file
    pub fn set_api_key(&self, provider: &str, key: &str) -> Result<(), ConfigError> {
        let mut config = self.load()?;
        config.api_keys.insert(provider.to_string(), key.to_string());
        self.save(&config)
    }
}
