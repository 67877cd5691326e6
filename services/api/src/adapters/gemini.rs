//! services/api/src/adapters/gemini.rs
//!
//! This module contains the adapter for Google's Gemini `generateContent` API.
//! It implements the `ModelClient` port from the `core` crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use slide_deck_core::{
    domain::SlideLayout,
    ports::{GenerationError, ModelClient, ModelSelection, PortResult},
    prompt::Prompt,
};
use tracing::{debug, warn};

use super::{require_key, status_error, transport_error};
use crate::config::Provider;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const TEMPERATURE: f64 = 0.7;

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: SystemInstruction<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
    temperature: f64,
}

/// The deck shape in Gemini's schema dialect. The provider enforces the
/// required fields and the layout enum; the validator still checks the reply.
fn deck_schema() -> Value {
    let layouts: Vec<&str> = SlideLayout::ALL.iter().map(SlideLayout::as_str).collect();
    let string = json!({ "type": "STRING" });
    let string_list = json!({ "type": "ARRAY", "items": { "type": "STRING" } });

    json!({
        "type": "OBJECT",
        "properties": {
            "title": string,
            "slides": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": string,
                        "layout": { "type": "STRING", "enum": layouts },
                        "content": {
                            "type": "OBJECT",
                            "properties": {
                                "title": string,
                                "subtitle": string,
                                "points": string_list,
                                "leftColumn": string_list,
                                "rightColumn": string_list,
                                "speakerNotes": string,
                                "imagePrompt": string,
                                "imageDescription": string
                            },
                            "required": ["title"]
                        }
                    },
                    "required": ["id", "layout", "content"]
                }
            }
        },
        "required": ["title", "slides"]
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ModelClient` using the Gemini REST API.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    models: ModelSelection,
}

impl GeminiClient {
    /// Creates a new `GeminiClient`. Fails without a network call when the key is missing.
    pub fn new(api_key: Option<&str>, models: ModelSelection) -> PortResult<Self> {
        Self::with_api_base(GEMINI_API_BASE, api_key, models)
    }

    /// Like `new`, against another base URL ending just before `/{model}`.
    pub fn with_api_base(
        api_base: impl Into<String>,
        api_key: Option<&str>,
        models: ModelSelection,
    ) -> PortResult<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: require_key("gemini", Provider::Gemini.key_var(), api_key)?,
            models,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/{}:generateContent", self.api_base, model)
    }

    fn request_body<'a>(&self, prompt: &'a Prompt) -> GenerateContentRequest<'a> {
        let mut parts = vec![Part::Text {
            text: &prompt.user_text,
        }];
        parts.extend(prompt.images.iter().map(|image| Part::InlineData {
            inline_data: InlineData {
                mime_type: &image.mime_type,
                data: &image.data,
            },
        }));

        GenerateContentRequest {
            system_instruction: SystemInstruction {
                parts: vec![Part::Text {
                    text: &prompt.system_instruction,
                }],
            },
            contents: vec![Content {
                role: "user",
                parts,
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: deck_schema(),
                temperature: TEMPERATURE,
            },
        }
    }
}

/// Joins the text parts of the first candidate.
fn extract_text(body: &str) -> PortResult<String> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::syntax(format!("unreadable Gemini reply: {}", e)))?;

    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Err(GenerationError::schema(format!(
            "Gemini blocked the prompt: {}",
            reason
        )));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::schema("Gemini returned no candidates"))?;

    let text: String = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    if text.trim().is_empty() {
        warn!(
            "Gemini candidate had no text (finish reason: {:?})",
            candidate.finish_reason
        );
        return Err(GenerationError::schema("Gemini returned an empty candidate"));
    }
    Ok(text)
}

//=========================================================================================
// `ModelClient` Trait Implementation
//=========================================================================================

#[async_trait]
impl ModelClient for GeminiClient {
    fn provider(&self) -> &str {
        "gemini"
    }

    fn models(&self) -> &ModelSelection {
        &self.models
    }

    async fn complete(&self, prompt: &Prompt, model: &str) -> PortResult<String> {
        let body = self.request_body(prompt);
        let endpoint = self.endpoint(model);
        debug!("POST {} images={}", endpoint, prompt.images.len());

        let response = self
            .http
            .post(&endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("gemini", e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error("gemini", e))?;

        if !status.is_success() {
            return Err(status_error(status.as_u16(), status.canonical_reason(), &text));
        }

        extract_text(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::stub;
    use slide_deck_core::normalize::ImagePart;

    fn client() -> GeminiClient {
        GeminiClient::new(Some("gem-test"), ModelSelection::new("gemini-1.5-flash", "gemini-1.5-flash"))
            .unwrap()
    }

    #[test]
    fn body_carries_system_instruction_and_inline_images() {
        let prompt = Prompt {
            system_instruction: "be a designer".to_string(),
            user_text: "Topic: tides".to_string(),
            images: vec![ImagePart {
                mime_type: "image/jpeg".to_string(),
                data: "/9j/4AAQ".to_string(),
            }],
        };
        let body = serde_json::to_value(client().request_body(&prompt)).unwrap();

        assert_eq!(
            body,
            json!({
                "systemInstruction": { "parts": [{ "text": "be a designer" }] },
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "text": "Topic: tides" },
                        { "inlineData": { "mimeType": "image/jpeg", "data": "/9j/4AAQ" } }
                    ]
                }],
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": deck_schema(),
                    "temperature": 0.7
                }
            })
        );

        let schema = &body["generationConfig"]["responseSchema"];
        assert_eq!(schema["required"], json!(["title", "slides"]));
        let slide = &schema["properties"]["slides"]["items"];
        assert_eq!(slide["required"], json!(["id", "layout", "content"]));
        assert_eq!(
            slide["properties"]["layout"]["enum"],
            json!(["TITLE", "CONTENT", "TWO_COLUMN", "QUOTE", "BIG_IMAGE"])
        );
        let content = &slide["properties"]["content"];
        assert_eq!(content["required"], json!(["title"]));
        assert_eq!(content["properties"]["leftColumn"]["items"]["type"], "STRING");
    }

    #[test]
    fn endpoint_embeds_the_model() {
        assert_eq!(
            client().endpoint("gemini-1.5-pro"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }

    #[test]
    fn joins_candidate_parts() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"{\"title\":"},{"text":"\"T\"}"}]},"finishReason":"STOP"}]}"#;
        assert_eq!(extract_text(body).unwrap(), r#"{"title":"T"}"#);
    }

    #[test]
    fn blocked_or_empty_replies_are_malformed() {
        let blocked = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        assert!(matches!(
            extract_text(blocked),
            Err(GenerationError::MalformedResponse { detail, .. }) if detail.contains("SAFETY")
        ));

        let empty = r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#;
        assert!(matches!(
            extract_text(empty),
            Err(GenerationError::MalformedResponse { .. })
        ));
    }

    #[tokio::test]
    async fn posts_once_with_the_api_key_header() {
        let reply = r#"{"candidates":[{"content":{"parts":[{"text":"{\"title\":\"Tides\"}"}]},"finishReason":"STOP"}]}"#;
        let (base, seen) = stub::serve(200, reply).await;
        let client = GeminiClient::with_api_base(
            format!("{}/v1beta/models/", base),
            Some("gem-test"),
            ModelSelection::new("gemini-1.5-flash", "gemini-1.5-flash"),
        )
        .unwrap();

        let prompt = Prompt {
            system_instruction: "be a designer".to_string(),
            user_text: "Topic: tides".to_string(),
            images: vec![],
        };
        let text = client.complete(&prompt, "gemini-1.5-flash").await.unwrap();
        assert_eq!(text, r#"{"title":"Tides"}"#);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].path, "/v1beta/models/gemini-1.5-flash:generateContent");
        assert_eq!(seen[0].headers["x-goog-api-key"], "gem-test");
        assert!(seen[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn error_statuses_keep_the_provider_status() {
        let prompt = Prompt {
            system_instruction: String::new(),
            user_text: "Topic: tides".to_string(),
            images: vec![],
        };

        let (base, seen) = stub::serve(
            403,
            r#"{"error":{"code":403,"message":"API key not valid","status":"PERMISSION_DENIED"}}"#,
        )
        .await;
        let client = GeminiClient::with_api_base(base, Some("gem-test"), ModelSelection::new("m", "m")).unwrap();
        let err = client.complete(&prompt, "m").await.unwrap_err();
        assert!(
            matches!(err, GenerationError::Auth { status: 403, ref message } if message == "API key not valid"),
            "{:?}",
            err
        );
        assert_eq!(seen.lock().unwrap().len(), 1);

        let (base, seen) = stub::serve(503, "").await;
        let client = GeminiClient::with_api_base(base, Some("gem-test"), ModelSelection::new("m", "m")).unwrap();
        let err = client.complete(&prompt, "m").await.unwrap_err();
        assert!(matches!(err, GenerationError::Provider { status: 503, .. }), "{:?}", err);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
