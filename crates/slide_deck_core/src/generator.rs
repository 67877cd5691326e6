//! crates/slide_deck_core/src/generator.rs
//!
//! The generation pipeline: normalize, build the prompt, make one model call,
//! validate the reply. Holds no state between calls, so one instance can be
//! shared by every session.

use std::sync::Arc;
use tracing::{error, info};

use crate::domain::{Deck, GenerationRequest};
use crate::normalize::normalize;
use crate::ports::{ModelClient, PortResult};
use crate::prompt::build_prompt;
use crate::validate::validate_response;

/// Theme used when the request leaves it blank.
pub const DEFAULT_THEME: &str = "modern";

#[derive(Clone)]
pub struct DeckGenerator {
    client: Arc<dyn ModelClient>,
}

impl DeckGenerator {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    pub fn provider(&self) -> &str {
        self.client.provider()
    }

    /// Turns one user request into a validated deck.
    ///
    /// Input problems are reported before the provider is contacted. A failure
    /// at any stage returns an error and never a partial deck.
    pub async fn generate(&self, request: GenerationRequest) -> PortResult<Deck> {
        let theme = match request.theme.trim() {
            "" => DEFAULT_THEME,
            theme => theme,
        };

        let input = normalize(&request)?;
        let prompt = build_prompt(
            &input,
            request.input_mode,
            theme,
            request.requested_slide_count,
        );
        let model = self.client.models().select(input.has_images()).to_string();

        info!(
            "Generating deck via {} ({}): mode={}, theme={}, slides={}, attachments={}",
            self.client.provider(),
            model,
            request.input_mode,
            theme,
            request.requested_slide_count,
            request.attachments.len()
        );

        let raw = self.client.complete(&prompt, &model).await.map_err(|e| {
            error!("Model call to {} failed: {}", self.client.provider(), e);
            e
        })?;

        let deck = validate_response(&raw, theme).map_err(|e| {
            error!("Rejected model response from {}: {}", self.client.provider(), e);
            e
        })?;

        info!("Generated deck '{}' with {} slides.", deck.title, deck.slides.len());
        Ok(deck)
    }
}
