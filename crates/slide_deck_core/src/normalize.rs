//! crates/slide_deck_core/src/normalize.rs
//!
//! Turns a `GenerationRequest` into the inputs the prompt builder works with:
//! the user's text, the extracted text of each document in upload order, and
//! the images that travel to the model as inline data.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, warn};

use crate::domain::GenerationRequest;
use crate::ports::{GenerationError, PortResult};

/// Largest decoded attachment accepted, matching the upload cap of the UI.
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

/// Extracted text of one non-image attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextBlock {
    /// 1-based position of the attachment in the request.
    pub position: usize,
    pub mime_type: String,
    pub text: String,
}

/// An image forwarded to the model by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePart {
    pub mime_type: String,
    /// Base64 payload without any `data:` prefix.
    pub data: String,
}

impl ImagePart {
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedInput {
    /// The user's text, trimmed. May be empty when attachments carry the content.
    pub text: String,
    pub context: Vec<ContextBlock>,
    pub images: Vec<ImagePart>,
}

impl NormalizedInput {
    pub fn has_images(&self) -> bool {
        !self.images.is_empty()
    }
}

/// Validates the request and splits its attachments into text context and images.
///
/// This is the only check made before a provider is contacted.
pub fn normalize(request: &GenerationRequest) -> PortResult<NormalizedInput> {
    let text = request.raw_text.trim().to_string();

    if text.is_empty() && request.attachments.is_empty() {
        return Err(GenerationError::Input(
            "Enter some text or attach a file to generate a presentation.".to_string(),
        ));
    }
    if request.requested_slide_count == 0 {
        return Err(GenerationError::Input(
            "The requested slide count must be at least 1.".to_string(),
        ));
    }

    let mut context = Vec::new();
    let mut images = Vec::new();

    for (index, attachment) in request.attachments.iter().enumerate() {
        let position = index + 1;
        let data = decode_checked(&attachment.data, position)?;

        if attachment.is_image() {
            images.push(ImagePart {
                mime_type: attachment.mime_type.trim().to_ascii_lowercase(),
                data,
            });
            continue;
        }

        match attachment.extracted_text.as_deref().map(str::trim) {
            Some(extracted) if !extracted.is_empty() => context.push(ContextBlock {
                position,
                mime_type: attachment.mime_type.trim().to_string(),
                text: extracted.to_string(),
            }),
            _ => warn!(
                "Attachment {} ({}) has no extracted text and is skipped.",
                position, attachment.mime_type
            ),
        }
    }

    if text.is_empty() && context.is_empty() && images.is_empty() {
        return Err(GenerationError::Input(
            "None of the attached files contained readable content.".to_string(),
        ));
    }

    debug!(
        text_chars = text.chars().count(),
        context_blocks = context.len(),
        images = images.len(),
        "Normalized generation input"
    );

    Ok(NormalizedInput {
        text,
        context,
        images,
    })
}

/// Strips an optional data-URI prefix and whitespace, and checks the payload
/// decodes and fits under the size cap. Returns the cleaned base64 text.
fn decode_checked(raw: &str, position: usize) -> PortResult<String> {
    let payload = match raw.find(";base64,") {
        Some(idx) if raw.starts_with("data:") => &raw[idx + ";base64,".len()..],
        _ => raw,
    };
    let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    let decoded = STANDARD.decode(cleaned.as_bytes()).map_err(|e| {
        GenerationError::Input(format!(
            "Attachment {} is not valid base64 data: {}",
            position, e
        ))
    })?;
    if decoded.len() > MAX_ATTACHMENT_BYTES {
        return Err(GenerationError::Input(format!(
            "Attachment {} is larger than the 10 MB limit.",
            position
        )));
    }

    Ok(cleaned)
}
