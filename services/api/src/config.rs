//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development. Provider keys are optional here: only the
//! key of the selected provider is required, and its absence is reported when
//! the adapter is built.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// The LLM vendors a deck can be generated with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    Groq,
    Xai,
    Gemini,
}

impl Provider {
    /// The variable holding this provider's API key.
    pub fn key_var(&self) -> &'static str {
        match self {
            Provider::Groq => "GROQ_API_KEY",
            Provider::Xai => "XAI_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Groq => f.write_str("groq"),
            Provider::Xai => f.write_str("xai"),
            Provider::Gemini => f.write_str("gemini"),
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(Provider::Groq),
            "xai" | "grok" => Ok(Provider::Xai),
            "gemini" | "google" => Ok(Provider::Gemini),
            other => Err(format!("'{}' is not one of groq, xai, gemini", other)),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub cors_origin: String,
    pub provider: Provider,
    pub groq_api_key: Option<String>,
    pub xai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    /// Overrides the provider's default text-only model.
    pub text_model: Option<String>,
    /// Overrides the provider's default vision model.
    pub vision_model: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset.
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        // --- Server Settings ---
        let bind_address_str = var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            var("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:5173".to_string());

        // --- Provider Selection ---
        let provider = match var("LLM_PROVIDER") {
            Some(name) => name
                .parse::<Provider>()
                .map_err(|e| ConfigError::InvalidValue("LLM_PROVIDER".to_string(), e))?,
            None => Provider::Groq,
        };

        // --- Load API Keys (as optional) ---
        let groq_api_key = var("GROQ_API_KEY");
        let xai_api_key = var("XAI_API_KEY");
        let gemini_api_key = var("GEMINI_API_KEY");

        let text_model = var("LLM_TEXT_MODEL");
        let vision_model = var("LLM_VISION_MODEL");

        Ok(Self {
            bind_address,
            log_level,
            cors_origin,
            provider,
            groq_api_key,
            xai_api_key,
            gemini_api_key,
            text_model,
            vision_model,
        })
    }

    /// The API key of the selected provider, if one was configured.
    pub fn provider_api_key(&self) -> Option<&str> {
        match self.provider {
            Provider::Groq => self.groq_api_key.as_deref(),
            Provider::Xai => self.xai_api_key.as_deref(),
            Provider::Gemini => self.gemini_api_key.as_deref(),
        }
    }
}
