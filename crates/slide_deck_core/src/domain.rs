//! crates/slide_deck_core/src/domain.rs
//!
//! Defines the core data structures for deck generation: the request a user
//! action produces, and the validated deck handed back to the caller.
//! The deck types carry the camelCase JSON shape shared with the UI and the
//! exporter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//=========================================================================================
// Generation Input
//=========================================================================================

/// How strictly the slide count and the content source are weighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// A short topic string; the deck has exactly the requested number of slides.
    #[default]
    Topic,
    /// Free-text content; the slide count follows the depth of the content.
    Content,
    /// Attachments are the primary source; user text is secondary guidance.
    File,
}

impl InputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputMode::Topic => "topic",
            InputMode::Content => "content",
            InputMode::File => "file",
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "topic" => Ok(InputMode::Topic),
            "content" => Ok(InputMode::Content),
            "file" => Ok(InputMode::File),
            other => Err(format!("unknown input mode '{}'", other)),
        }
    }
}

/// A user-supplied file or image.
///
/// `extracted_text` is filled in by the document-extraction collaborator for
/// PDF/DOCX uploads before the request reaches the core. Images never carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub mime_type: String,
    /// Base64-encoded file contents.
    pub data: String,
    pub extracted_text: Option<String>,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.mime_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }
}

/// One user action's worth of input. Created per action, consumed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub raw_text: String,
    pub input_mode: InputMode,
    pub theme: String,
    pub requested_slide_count: u32,
    pub attachments: Vec<Attachment>,
}

impl GenerationRequest {
    pub fn has_images(&self) -> bool {
        self.attachments.iter().any(Attachment::is_image)
    }
}

//=========================================================================================
// Deck Model
//=========================================================================================

/// The closed set of slide archetypes a renderer knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlideLayout {
    Title,
    Content,
    TwoColumn,
    Quote,
    /// Accepted from the model but never requested by the prompts.
    BigImage,
}

impl SlideLayout {
    pub const ALL: [SlideLayout; 5] = [
        SlideLayout::Title,
        SlideLayout::Content,
        SlideLayout::TwoColumn,
        SlideLayout::Quote,
        SlideLayout::BigImage,
    ];

    /// The layouts the prompt asks the model to choose from.
    pub const REQUESTED: [SlideLayout; 4] = [
        SlideLayout::Title,
        SlideLayout::Content,
        SlideLayout::TwoColumn,
        SlideLayout::Quote,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SlideLayout::Title => "TITLE",
            SlideLayout::Content => "CONTENT",
            SlideLayout::TwoColumn => "TWO_COLUMN",
            SlideLayout::Quote => "QUOTE",
            SlideLayout::BigImage => "BIG_IMAGE",
        }
    }
}

impl fmt::Display for SlideLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlideLayout {
    type Err = String;

    /// Letter case is not significant: `two_column` parses as `TWO_COLUMN`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|layout| layout.as_str() == wanted)
            .ok_or_else(|| format!("unknown layout '{}'", s.trim()))
    }
}

/// The text of a single slide. Only `title` is guaranteed; renderers must
/// cope with any other field being absent regardless of the layout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideContent {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_column: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_column: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    /// Unique within a deck by convention only. Editors address slides by position.
    pub id: String,
    pub layout: SlideLayout,
    pub content: SlideContent,
}

/// A validated presentation. Owned by the caller once returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    pub title: String,
    pub slides: Vec<Slide>,
    pub theme: String,
}
