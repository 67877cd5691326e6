//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use slide_deck_core::{Attachment, Deck, GenerationError, GenerationRequest, InputMode};
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::{OpenApi, ToSchema};

/// Several 10 MB attachments, base64-encoded, fit under this limit.
pub const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

const DEFAULT_SLIDE_COUNT: u32 = 6;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        generate_presentation_handler,
        health_handler,
    ),
    components(
        schemas(GeneratePresentationRequest, AttachmentPayload, GeneratePresentationResponse, HealthResponse)
    ),
    tags(
        (name = "Slide Deck API", description = "Turns topics, notes and documents into structured slide decks.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// A file sent along with the request. Documents carry the text the browser
/// extracted from them; images carry only their data.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentPayload {
    pub mime_type: String,
    /// Base64 file contents, with or without a `data:` URI prefix.
    pub data: String,
    #[serde(default)]
    pub extracted_text: Option<String>,
}

/// The request payload for generating a presentation.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePresentationRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub theme: String,
    #[serde(default = "default_slide_count")]
    pub slide_count: u32,
    /// One of `topic`, `content`, `file`.
    #[serde(default)]
    #[schema(value_type = String, example = "topic")]
    pub input_mode: InputMode,
    #[serde(default)]
    pub attachments: Vec<AttachmentPayload>,
}

fn default_slide_count() -> u32 {
    DEFAULT_SLIDE_COUNT
}

impl From<GeneratePresentationRequest> for GenerationRequest {
    fn from(payload: GeneratePresentationRequest) -> Self {
        GenerationRequest {
            raw_text: payload.text,
            input_mode: payload.input_mode,
            theme: payload.theme,
            requested_slide_count: payload.slide_count,
            attachments: payload
                .attachments
                .into_iter()
                .map(|a| Attachment {
                    mime_type: a.mime_type,
                    data: a.data,
                    extracted_text: a.extracted_text,
                })
                .collect(),
        }
    }
}

/// The response payload sent after a deck is generated.
#[derive(Debug, Serialize, ToSchema)]
pub struct GeneratePresentationResponse {
    #[schema(value_type = Object)]
    pub presentation: Deck,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub provider: String,
}

//=========================================================================================
// Router
//=========================================================================================

/// Builds the API routes over the shared state.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/presentations", post(generate_presentation_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(app_state)
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Generate a presentation from text and attachments.
///
/// Makes exactly one request to the configured LLM provider. A failed call
/// returns an error and no deck.
#[utoipa::path(
    post,
    path = "/presentations",
    request_body = GeneratePresentationRequest,
    responses(
        (status = 200, description = "Presentation generated", body = GeneratePresentationResponse),
        (status = 400, description = "Nothing to generate from, or an unusable attachment"),
        (status = 500, description = "The server is missing provider credentials"),
        (status = 502, description = "The LLM provider failed or returned an invalid deck")
    )
)]
pub async fn generate_presentation_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<GeneratePresentationRequest>,
) -> Result<Json<GeneratePresentationResponse>, (StatusCode, String)> {
    let request = GenerationRequest::from(payload);

    match app_state.generator.generate(request).await {
        Ok(presentation) => Ok(Json(GeneratePresentationResponse { presentation })),
        Err(e) => Err(error_response(&e)),
    }
}

/// Liveness check, reporting which provider decks are generated with.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "The service is up", body = HealthResponse))
)]
pub async fn health_handler(State(app_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        provider: app_state.generator.provider().to_string(),
    })
}

/// Maps a generation failure to the status and message shown to the user.
pub fn error_response(err: &GenerationError) -> (StatusCode, String) {
    let status = match err {
        GenerationError::Input(_) => StatusCode::BAD_REQUEST,
        GenerationError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        GenerationError::Auth { .. }
        | GenerationError::Provider { .. }
        | GenerationError::Transport(_)
        | GenerationError::MalformedResponse { .. } => StatusCode::BAD_GATEWAY,
    };

    if status.is_server_error() {
        error!("Presentation generation failed: {}", err);
    } else {
        warn!("Rejected presentation request: {}", err);
    }

    (status, err.user_message())
}
