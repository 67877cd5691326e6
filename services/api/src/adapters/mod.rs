//! services/api/src/adapters/mod.rs
//!
//! Provider adapters implementing the `ModelClient` port, and the factory that
//! picks one from the configuration.

pub mod gemini;
pub mod openai_compat;

pub use gemini::GeminiClient;
pub use openai_compat::OpenAiCompatibleClient;

use crate::config::{Config, Provider};
use serde::Deserialize;
use slide_deck_core::ports::{GenerationError, ModelClient, ModelSelection, PortResult};
use std::sync::Arc;
use tracing::info;

/// Builds the client for the configured provider.
///
/// Fails with `GenerationError::Configuration` when that provider's key is
/// missing, so a misconfigured server never makes a network call.
pub fn build_model_client(config: &Config) -> PortResult<Arc<dyn ModelClient>> {
    let models = model_selection(config);
    let api_key = config.provider_api_key();

    info!(
        "Using provider {} (text model: {}, vision model: {})",
        config.provider, models.text_model, models.vision_model
    );

    let client: Arc<dyn ModelClient> = match config.provider {
        Provider::Groq => Arc::new(OpenAiCompatibleClient::groq(api_key, models)?),
        Provider::Xai => Arc::new(OpenAiCompatibleClient::xai(api_key, models)?),
        Provider::Gemini => Arc::new(GeminiClient::new(api_key, models)?),
    };
    Ok(client)
}

/// The provider's default models, with any configured overrides applied.
pub fn model_selection(config: &Config) -> ModelSelection {
    let (text, vision) = match config.provider {
        Provider::Groq => ("llama-3.3-70b-versatile", "llama-3.2-11b-vision-preview"),
        Provider::Xai => ("grok-2-1212", "grok-2-vision-1212"),
        Provider::Gemini => ("gemini-1.5-flash", "gemini-1.5-flash"),
    };
    ModelSelection::new(
        config.text_model.clone().unwrap_or_else(|| text.to_string()),
        config
            .vision_model
            .clone()
            .unwrap_or_else(|| vision.to_string()),
    )
}

//=========================================================================================
// Shared Helpers
//=========================================================================================

pub(crate) fn require_key(provider: &str, key_var: &str, api_key: Option<&str>) -> PortResult<String> {
    match api_key.map(str::trim) {
        Some(key) if !key.is_empty() => Ok(key.to_string()),
        _ => Err(GenerationError::Configuration(format!(
            "{} API key is missing. Set {} in the environment or .env file.",
            provider, key_var
        ))),
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// Classifies a non-success reply. Both OpenAI-style and Gemini error bodies
/// carry `error.message`; otherwise the status reason is used.
pub(crate) fn status_error(status: u16, reason: Option<&str>, body: &str) -> GenerationError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .filter(|m| !m.trim().is_empty())
        .or_else(|| reason.map(str::to_string))
        .unwrap_or_else(|| "Unknown error".to_string());

    match status {
        401 | 403 => GenerationError::Auth { status, message },
        _ => GenerationError::Provider { status, message },
    }
}

pub(crate) fn transport_error(provider: &str, err: reqwest::Error) -> GenerationError {
    GenerationError::Transport(format!("{} request failed: {}", provider, err))
}
