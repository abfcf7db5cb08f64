use crate::errors::{AuraError, AuraResult};
use crate::reply::AURA_SYSTEM_INSTRUCTION;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "aura";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variables checked for the API credential, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Configuration for the Aura companion
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct AuraConfig {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub model_name: Option<String>,
    pub system_prompt: Option<String>,
    pub retry_max_attempts: Option<u32>,
    pub retry_base_delay_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub local_reply_delay_ms: Option<u64>,
    pub typing_idle_ms: Option<u64>,
    pub wake_delay_ms: Option<u64>,
    pub welcome_delay_ms: Option<u64>,
    pub welcome_message: Option<String>,
    pub bundle_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub rng_seed: Option<u64>,
}

impl AuraConfig {
    /// Loads configuration from a file if it exists, otherwise returns the default config
    pub fn load_from_file(path: &Path) -> AuraResult<Self> {
        if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                AuraError::ConfigError(format!("Failed to read config file: {}", e))
            })?;

            let config: Self = toml::from_str(&content).map_err(|e| {
                AuraError::ConfigError(format!("Failed to parse config file: {}", e))
            })?;

            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Saves configuration to a file
    pub fn save_to_file(&self, path: &Path) -> AuraResult<()> {
        let content = toml::to_string(self).map_err(|e| {
            AuraError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        // Ensure the directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AuraError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        fs::write(path, content).map_err(|e| {
            AuraError::ConfigError(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Merges this config with another config, preferring values from the other config if present
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            api_key: other.api_key.clone().or_else(|| self.api_key.clone()),
            api_base: other.api_base.clone().or_else(|| self.api_base.clone()),
            model_name: other.model_name.clone().or_else(|| self.model_name.clone()),
            system_prompt: other
                .system_prompt
                .clone()
                .or_else(|| self.system_prompt.clone()),
            retry_max_attempts: other.retry_max_attempts.or(self.retry_max_attempts),
            retry_base_delay_ms: other.retry_base_delay_ms.or(self.retry_base_delay_ms),
            request_timeout_secs: other.request_timeout_secs.or(self.request_timeout_secs),
            local_reply_delay_ms: other.local_reply_delay_ms.or(self.local_reply_delay_ms),
            typing_idle_ms: other.typing_idle_ms.or(self.typing_idle_ms),
            wake_delay_ms: other.wake_delay_ms.or(self.wake_delay_ms),
            welcome_delay_ms: other.welcome_delay_ms.or(self.welcome_delay_ms),
            welcome_message: other
                .welcome_message
                .clone()
                .or_else(|| self.welcome_message.clone()),
            bundle_path: other.bundle_path.clone().or_else(|| self.bundle_path.clone()),
            log_level: other.log_level.clone().or_else(|| self.log_level.clone()),
            rng_seed: other.rng_seed.or(self.rng_seed),
        }
    }

    /// The API credential from config or environment.
    ///
    /// A missing key is a startup failure; there is no offline fallback.
    pub fn resolve_api_key(&self) -> AuraResult<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.trim().to_string());
        }
        API_KEY_ENV_VARS
            .iter()
            .find_map(|var| env::var(var).ok().filter(|v| !v.trim().is_empty()))
            .map(|v| v.trim().to_string())
            .ok_or_else(|| {
                AuraError::ConfigError(format!(
                    "API key is required: set api_key in the config file or one of {}",
                    API_KEY_ENV_VARS.join(", ")
                ))
            })
    }

    pub fn model_name(&self) -> &str {
        self.model_name.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn api_base(&self) -> &str {
        self.api_base
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/')
    }

    pub fn system_prompt(&self) -> &str {
        self.system_prompt
            .as_deref()
            .unwrap_or(AURA_SYSTEM_INSTRUCTION)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(60))
    }
}

/// Helper function to get default config directory
pub fn get_default_config_dir(app_name: &str) -> AuraResult<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| {
        AuraError::ConfigError("Could not determine home directory".to_string())
    })?;

    let config_dir = home_dir.join(".config").join(app_name);

    Ok(config_dir)
}

/// Helper function to get default config file path
pub fn get_default_config_file(app_name: &str) -> AuraResult<PathBuf> {
    let config_dir = get_default_config_dir(app_name)?;
    Ok(config_dir.join("config.toml"))
}
