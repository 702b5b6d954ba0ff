//! Application Configuration Module
//!
//! Loads settings for the reflection service from environment variables
//! (and a `.env` file, when present) into a single struct.

use reflection_core::responder::DEFAULT_CHAT_MODEL;
use secrecy::SecretString;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Debug)]
pub struct Config {
    pub openai_api_key: SecretString,
    pub chat_model: String,
    pub log_level: Level,
    pub prompts_dir: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// *   `OPENAI_API_KEY`: Your secret key for the OpenAI API. Required.
    /// *   `CHAT_MODEL`: (Optional) The chat model used for replies. Defaults to "gpt-4o-mini".
    /// *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    /// *   `PROMPTS_DIR`: (Optional) Directory of `.md` prompt overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. This is useful for local development and is ignored if not present.
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_key = lookup("OPENAI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))?;

        let chat_model = lookup("CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let prompts_dir = lookup("PROMPTS_DIR").map(PathBuf::from);

        Ok(Self {
            openai_api_key,
            chat_model,
            log_level,
            prompts_dir,
        })
    }
}
