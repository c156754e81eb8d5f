//! Configuration management for Shipmate
//!
//! Configuration is loaded from `~/.shipmate/config.json` with
//! `SHIPMATE_*` environment variable overrides. A global instance can be
//! initialized once at startup and read from anywhere.

use std::path::PathBuf;
use std::sync::RwLock;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShipmateError};
use crate::orders::{CustomerContext, PlanTier};
use crate::providers::ChatOptions;

/// Global configuration instance
static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Main configuration struct for Shipmate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub provider: ProviderConfig,
    /// Merchant store configuration
    pub store: StoreConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Anthropic API key. Falls back to `ANTHROPIC_API_KEY`.
    pub api_key: Option<String>,
    /// Model identifier sent with every request
    pub model: String,
    /// Maximum tokens per model response
    pub max_tokens: u32,
    /// Use the deterministic mock provider instead of the real API
    pub mock_mode: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 1024,
            mock_mode: false,
        }
    }
}

/// Merchant store configuration, the source of the customer context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub name: String,
    pub plan_tier: PlanTier,
    pub labels_used: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "Demo Store".to_string(),
            plan_tier: PlanTier::Starter,
            labels_used: 0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset, e.g. "info" or "shipmate=debug"
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Returns the Shipmate configuration directory path (~/.shipmate)
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".shipmate")
    }

    /// Returns the path to the config file (~/.shipmate/config.json)
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load configuration from the default path with environment overrides.
    ///
    /// If the config file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::path())
    }

    /// Load configuration from a specific path with environment overrides.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SHIPMATE_API_KEY") {
            self.provider.api_key = Some(val);
        }
        if let Ok(val) = std::env::var("SHIPMATE_MODEL") {
            self.provider.model = val;
        }
        if let Ok(val) = std::env::var("SHIPMATE_MAX_TOKENS") {
            if let Ok(v) = val.parse() {
                self.provider.max_tokens = v;
            }
        }
        if let Ok(val) = std::env::var("SHIPMATE_MOCK_MODE") {
            if let Ok(v) = val.parse() {
                self.provider.mock_mode = v;
            }
        }
        if let Ok(val) = std::env::var("SHIPMATE_STORE_NAME") {
            self.store.name = val;
        }
        if let Ok(val) = std::env::var("SHIPMATE_PLAN_TIER") {
            if let Ok(tier) = val.parse() {
                self.store.plan_tier = tier;
            }
        }
        if let Ok(val) = std::env::var("SHIPMATE_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::path())
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Initialize the global configuration.
    ///
    /// This should be called once at startup. Subsequent calls will return
    /// an error if the config is already initialized.
    pub fn init() -> Result<()> {
        let config = Self::load()?;
        CONFIG
            .set(RwLock::new(config))
            .map_err(|_| ShipmateError::Config("Configuration already initialized".to_string()))
    }

    /// Initialize the global configuration with a specific config.
    ///
    /// Useful for testing or custom initialization.
    pub fn init_with(config: Config) -> Result<()> {
        CONFIG
            .set(RwLock::new(config))
            .map_err(|_| ShipmateError::Config("Configuration already initialized".to_string()))
    }

    /// Get a clone of the current global configuration.
    ///
    /// Returns default configuration if not yet initialized.
    pub fn get() -> Config {
        CONFIG
            .get()
            .and_then(|lock| lock.read().ok())
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Update the global configuration.
    ///
    /// Returns an error if the config hasn't been initialized yet.
    pub fn update<F>(f: F) -> Result<()>
    where
        F: FnOnce(&mut Config),
    {
        let lock = CONFIG
            .get()
            .ok_or_else(|| ShipmateError::Config("Configuration not initialized".to_string()))?;
        let mut guard = lock
            .write()
            .map_err(|_| ShipmateError::Config("Failed to acquire config write lock".to_string()))?;
        f(&mut guard);
        Ok(())
    }

    /// Resolve the API key, falling back to `ANTHROPIC_API_KEY`.
    pub fn api_key(&self) -> Option<String> {
        self.provider
            .api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
    }

    /// Chat options derived from the provider configuration.
    pub fn chat_options(&self) -> ChatOptions {
        ChatOptions::default()
            .with_model(&self.provider.model)
            .with_max_tokens(self.provider.max_tokens)
    }

    /// Customer context derived from the store configuration.
    pub fn customer_context(&self) -> CustomerContext {
        CustomerContext::from_plan(
            self.store.name.clone(),
            self.store.plan_tier,
            self.store.labels_used,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.provider.model, "claude-sonnet-4-20250514");
        assert_eq!(config.provider.max_tokens, 1024);
        assert!(!config.provider.mock_mode);
        assert_eq!(config.store.name, "Demo Store");
        assert_eq!(config.store.plan_tier, PlanTier::Starter);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = PathBuf::from("/nonexistent/shipmate/config.json");
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.store.name, "Demo Store");
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.provider.mock_mode = true;
        config.store.name = "Acme Goods".to_string();
        config.store.plan_tier = PlanTier::Growth;
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert!(loaded.provider.mock_mode);
        assert_eq!(loaded.store.name, "Acme Goods");
        assert_eq!(loaded.store.plan_tier, PlanTier::Growth);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"provider": {"mock_mode": true}}"#).unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert!(config.provider.mock_mode);
        assert_eq!(config.provider.model, "claude-sonnet-4-20250514");
        assert_eq!(config.store.plan_tier, PlanTier::Starter);
    }

    #[test]
    fn customer_context_from_store() {
        let mut config = Config::default();
        config.store.plan_tier = PlanTier::Growth;
        config.store.labels_used = 120;

        let ctx = config.customer_context();
        assert_eq!(ctx.store_name, "Demo Store");
        assert_eq!(ctx.labels_limit, 2000);
        assert_eq!(ctx.labels_remaining(), 1880);
    }
}
