//! Configuration management for Luatbot
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//!
//! The completion credential is never compiled in. It comes from the
//! `LUATBOT_API_KEY` environment variable or the `completion.api_key`
//! field of the config file, and its absence is reported when a command
//! that talks to the endpoint starts.

use crate::error::{LuatbotError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persona instruction sent as the system turn of every request
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful Vietnamese legal assistant. \
Provide clear, concise, and accurate information about Vietnamese law. \
Always respond in Vietnamese.";

/// Assistant greeting that seeds every new session
pub const DEFAULT_GREETING: &str = "Xin chào, bạn cần hỏi gì?";

/// Assistant text substituted when a completion request fails
pub const DEFAULT_FALLBACK_MESSAGE: &str =
    "Xin lỗi, đã xảy ra lỗi khi lấy câu trả lời. Vui lòng thử lại sau.";

/// Storage key holding the serialized session collection
pub const DEFAULT_STORAGE_KEY: &str = "chatHistory";

/// Main configuration structure for Luatbot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote completion endpoint settings
    #[serde(default)]
    pub completion: CompletionConfig,
    /// Chat behaviour settings
    #[serde(default)]
    pub chat: ChatConfig,
    /// Local history storage settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Terminal rendering settings
    #[serde(default)]
    pub ui: UiConfig,
}

/// Remote completion endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Full URL of the chat-completions endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// System instruction fixing the assistant persona and language
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Bearer credential. Prefer the `LUATBOT_API_KEY` environment variable.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Optional request timeout. `None` waits indefinitely.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

fn default_endpoint() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "qwen/qwen-turbo".to_string()
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            system_prompt: default_system_prompt(),
            api_key: None,
            timeout_seconds: None,
        }
    }
}

impl CompletionConfig {
    /// Return the configured credential
    ///
    /// # Errors
    ///
    /// Returns `LuatbotError::MissingCredentials` when no non-empty key
    /// was supplied by the config file or the environment.
    ///
    /// # Examples
    ///
    /// ```
    /// use luatbot::config::CompletionConfig;
    ///
    /// let mut config = CompletionConfig::default();
    /// assert!(config.api_key().is_err());
    ///
    /// config.api_key = Some("sk-test".to_string());
    /// assert_eq!(config.api_key().unwrap(), "sk-test");
    /// ```
    pub fn api_key(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(LuatbotError::MissingCredentials(
                "set LUATBOT_API_KEY or completion.api_key in the config file".to_string(),
            )
            .into()),
        }
    }
}

/// Chat behaviour configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Assistant greeting seeded into every new session
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Assistant text used when the completion request fails
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,

    /// Number of characters of the first user message used as the title
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,
}

fn default_greeting() -> String {
    DEFAULT_GREETING.to_string()
}

fn default_fallback_message() -> String {
    DEFAULT_FALLBACK_MESSAGE.to_string()
}

fn default_title_max_chars() -> usize {
    20
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
            fallback_message: default_fallback_message(),
            title_max_chars: default_title_max_chars(),
        }
    }
}

/// Local history storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file. Defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Key under which the session collection is stored
    #[serde(default = "default_storage_key")]
    pub key: String,
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            key: default_storage_key(),
        }
    }
}

/// Terminal rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Reveal assistant replies character by character
    #[serde(default = "default_typing_effect")]
    pub typing_effect: bool,

    /// Delay between revealed characters (milliseconds)
    #[serde(default = "default_typing_delay_ms")]
    pub typing_delay_ms: u64,
}

fn default_typing_effect() -> bool {
    true
}

fn default_typing_delay_ms() -> u64 {
    30
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            typing_effect: default_typing_effect(),
            typing_delay_ms: default_typing_delay_ms(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(LuatbotError::from)
            .with_context(|| format!("Failed to read config file {}", path))?;
        let config: Self = serde_yaml::from_str(&contents)
            .map_err(LuatbotError::from)
            .context("Failed to parse config")?;
        Ok(config)
    }

    fn apply_env_vars(&mut self) {
        if let Ok(api_key) = std::env::var("LUATBOT_API_KEY") {
            self.completion.api_key = Some(api_key);
        }

        if let Ok(endpoint) = std::env::var("LUATBOT_ENDPOINT") {
            tracing::debug!(endpoint = %endpoint, "Env override: LUATBOT_ENDPOINT");
            self.completion.endpoint = endpoint;
        }

        if let Ok(model) = std::env::var("LUATBOT_MODEL") {
            tracing::debug!(model = %model, "Env override: LUATBOT_MODEL");
            self.completion.model = model;
        }

        if let Ok(prompt) = std::env::var("LUATBOT_SYSTEM_PROMPT") {
            self.completion.system_prompt = prompt;
        }

        if let Ok(timeout) = std::env::var("LUATBOT_TIMEOUT_SECONDS") {
            match timeout.parse::<u64>() {
                Ok(v) => self.completion.timeout_seconds = Some(v),
                Err(_) => tracing::warn!("Invalid LUATBOT_TIMEOUT_SECONDS: {}", timeout),
            }
        }

        if let Ok(db_path) = std::env::var("LUATBOT_HISTORY_DB") {
            self.storage.path = Some(PathBuf::from(db_path));
        }

        if let Ok(typing) = std::env::var("LUATBOT_TYPING_EFFECT") {
            match typing.parse::<bool>() {
                Ok(v) => self.ui.typing_effect = v,
                Err(_) => tracing::warn!("Invalid value for LUATBOT_TYPING_EFFECT: {}", typing),
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(db_path) = &cli.storage_path {
            tracing::info!("Using storage DB override from CLI: {}", db_path);
            self.storage.path = Some(PathBuf::from(db_path));
        }
    }

    /// Validate the configuration
    ///
    /// Ensures all configuration values are within acceptable ranges
    /// and that required fields are properly set. The credential is
    /// checked separately by [`CompletionConfig::api_key`], since
    /// commands that never contact the endpoint do not need it.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        let endpoint = url::Url::parse(&self.completion.endpoint).map_err(|e| {
            LuatbotError::Config(format!(
                "completion.endpoint is not a valid URL ({}): {}",
                self.completion.endpoint, e
            ))
        })?;

        if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
            return Err(LuatbotError::Config(format!(
                "completion.endpoint must use http or https, got: {}",
                endpoint.scheme()
            ))
            .into());
        }

        if self.completion.model.trim().is_empty() {
            return Err(
                LuatbotError::Config("completion.model cannot be empty".to_string()).into(),
            );
        }

        if self.completion.timeout_seconds == Some(0) {
            return Err(LuatbotError::Config(
                "completion.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.chat.greeting.trim().is_empty() {
            return Err(LuatbotError::Config("chat.greeting cannot be empty".to_string()).into());
        }

        if self.chat.fallback_message.trim().is_empty() {
            return Err(
                LuatbotError::Config("chat.fallback_message cannot be empty".to_string()).into(),
            );
        }

        if self.chat.title_max_chars == 0 {
            return Err(LuatbotError::Config(
                "chat.title_max_chars must be greater than 0".to_string(),
            )
            .into());
        }

        if self.storage.key.trim().is_empty() {
            return Err(LuatbotError::Config("storage.key cannot be empty".to_string()).into());
        }

        Ok(())
    }
}
