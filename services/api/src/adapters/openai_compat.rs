//! services/api/src/adapters/openai_compat.rs
//!
//! This module contains the adapter for chat-completion APIs that follow the
//! OpenAI wire format (Groq and xAI). It implements the `ModelClient` port
//! from the `core` crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use slide_deck_core::{
    ports::{GenerationError, ModelClient, ModelSelection, PortResult},
    prompt::Prompt,
};
use tracing::debug;

use super::{require_key, status_error, transport_error};
use crate::config::Provider;

pub const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const XAI_API_URL: &str = "https://api.x.ai/v1/chat/completions";

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
    temperature: f64,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

/// Text-only prompts are sent as a plain string; prompts with images as parts.
#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ModelClient` for OpenAI-compatible chat endpoints.
#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    provider: &'static str,
    endpoint: String,
    api_key: String,
    models: ModelSelection,
    temperature: f64,
}

impl OpenAiCompatibleClient {
    /// Creates a new client. Fails without a network call when the key is missing.
    pub fn new(
        provider: &'static str,
        key_var: &str,
        endpoint: impl Into<String>,
        api_key: Option<&str>,
        models: ModelSelection,
        temperature: f64,
    ) -> PortResult<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            provider,
            endpoint: endpoint.into(),
            api_key: require_key(provider, key_var, api_key)?,
            models,
            temperature,
        })
    }

    pub fn groq(api_key: Option<&str>, models: ModelSelection) -> PortResult<Self> {
        Self::new("groq", Provider::Groq.key_var(), GROQ_API_URL, api_key, models, 0.6)
    }

    pub fn xai(api_key: Option<&str>, models: ModelSelection) -> PortResult<Self> {
        Self::new("xai", Provider::Xai.key_var(), XAI_API_URL, api_key, models, 0.7)
    }

    fn request_body<'a>(&self, prompt: &'a Prompt, model: &'a str) -> ChatRequest<'a> {
        let user_content = if prompt.images.is_empty() {
            MessageContent::Text(&prompt.user_text)
        } else {
            let mut parts = vec![ContentPart::Text {
                text: &prompt.user_text,
            }];
            parts.extend(prompt.images.iter().map(|image| ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: image.data_uri(),
                },
            }));
            MessageContent::Parts(parts)
        };

        ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(&prompt.system_instruction),
                },
                ChatMessage {
                    role: "user",
                    content: user_content,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: self.temperature,
        }
    }
}

/// Pulls the message text out of a chat-completion reply.
fn extract_content(body: &str) -> PortResult<String> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::syntax(format!("unreadable completion envelope: {}", e)))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| GenerationError::schema("the completion contained no message content"))
}

//=========================================================================================
// `ModelClient` Trait Implementation
//=========================================================================================

#[async_trait]
impl ModelClient for OpenAiCompatibleClient {
    fn provider(&self) -> &str {
        self.provider
    }

    fn models(&self) -> &ModelSelection {
        &self.models
    }

    async fn complete(&self, prompt: &Prompt, model: &str) -> PortResult<String> {
        let body = self.request_body(prompt, model);
        debug!(
            "POST {} model={} images={}",
            self.endpoint,
            model,
            prompt.images.len()
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(self.provider, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(self.provider, e))?;

        if !status.is_success() {
            return Err(status_error(status.as_u16(), status.canonical_reason(), &text));
        }

        extract_content(&text)
    }
}
