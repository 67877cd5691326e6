//! crates/slide_deck_core/src/ports.rs
//!
//! Defines the service contract (trait) between the generation pipeline and
//! the LLM providers, along with the error taxonomy every stage reports into.
//! Provider adapters live outside this crate, so the core stays free of any
//! network code.

use async_trait::async_trait;
use std::fmt;

use crate::prompt::Prompt;

//=========================================================================================
// Generation Error and Result Types
//=========================================================================================

/// Which stage of response validation rejected the model's reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedKind {
    /// The text is empty or not JSON at all.
    Syntax,
    /// The JSON is well formed but does not have the deck shape.
    Schema,
}

impl fmt::Display for MalformedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedKind::Syntax => f.write_str("syntax"),
            MalformedKind::Schema => f.write_str("schema"),
        }
    }
}

/// Every way a `generate` call can fail. Nothing is recovered internally.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// A provider credential is missing. Raised before any network call.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The request has nothing to generate from, or an attachment is unusable.
    #[error("Invalid input: {0}")]
    Input(String),

    /// The provider rejected the credential.
    #[error("Provider rejected the API key ({status}): {message}")]
    Auth { status: u16, message: String },

    /// The provider answered with a non-success status.
    #[error("Provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    /// The request never produced an HTTP response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The model did not honour the JSON deck contract.
    #[error("Malformed model response ({kind}): {detail}")]
    MalformedResponse { kind: MalformedKind, detail: String },
}

impl GenerationError {
    pub fn syntax(detail: impl Into<String>) -> Self {
        GenerationError::MalformedResponse {
            kind: MalformedKind::Syntax,
            detail: detail.into(),
        }
    }

    pub fn schema(detail: impl Into<String>) -> Self {
        GenerationError::MalformedResponse {
            kind: MalformedKind::Schema,
            detail: detail.into(),
        }
    }

    /// The message a UI should show. Model non-compliance is not actionable by
    /// the user, so it collapses to a generic retry hint.
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::MalformedResponse { .. } => {
                "The AI returned an invalid response format. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// A convenience type alias for `Result<T, GenerationError>`.
pub type PortResult<T> = Result<T, GenerationError>;

//=========================================================================================
// Model Selection
//=========================================================================================

/// The pair of model identifiers a provider is configured with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub text_model: String,
    pub vision_model: String,
}

impl ModelSelection {
    pub fn new(text_model: impl Into<String>, vision_model: impl Into<String>) -> Self {
        Self {
            text_model: text_model.into(),
            vision_model: vision_model.into(),
        }
    }

    /// Vision models cost more, so they are only used when an image is attached.
    pub fn select(&self, has_images: bool) -> &str {
        if has_images {
            &self.vision_model
        } else {
            &self.text_model
        }
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// A short provider name for logs.
    fn provider(&self) -> &str;

    /// The models this client uses for text-only and image-bearing prompts.
    fn models(&self) -> &ModelSelection;

    /// Sends one JSON-mode completion request and returns the raw reply text.
    /// Exactly one attempt is made.
    async fn complete(&self, prompt: &Prompt, model: &str) -> PortResult<String>;
}
