//! crates/slide_deck_core/src/validate.rs
//!
//! Checks the model's reply against the deck schema. Every outcome is one of:
//! a `Deck`, a syntax failure (not JSON), or a schema failure (JSON of the
//! wrong shape). Required fields are never defaulted; optional ones stay absent.

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::warn;

use crate::domain::{Deck, Slide, SlideContent, SlideLayout};
use crate::ports::{GenerationError, PortResult};

//=========================================================================================
// Loosely Typed Reply Shapes
//=========================================================================================

// Required fields are `Option` here so that their absence is reported with a
// precise message instead of a generic serde error.

#[derive(Deserialize)]
struct RawDeck {
    title: Option<String>,
    slides: Option<Vec<RawSlide>>,
}

#[derive(Deserialize)]
struct RawSlide {
    id: Option<Value>,
    layout: Option<String>,
    content: Option<RawContent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContent {
    title: Option<String>,
    subtitle: Option<String>,
    points: Option<Vec<String>>,
    left_column: Option<Vec<String>>,
    right_column: Option<Vec<String>>,
    speaker_notes: Option<String>,
    image_prompt: Option<String>,
    image_description: Option<String>,
}

//=========================================================================================
// Validation
//=========================================================================================

/// Parses `raw` into a `Deck`, stamping the requested `theme` onto it.
///
/// The model is never trusted to echo the theme back, so whatever it sent is ignored.
pub fn validate_response(raw: &str, theme: &str) -> PortResult<Deck> {
    let body = unwrap_code_fence(raw.trim());
    if body.is_empty() {
        return Err(GenerationError::syntax("the model returned an empty response"));
    }

    let value: Value =
        serde_json::from_str(body).map_err(|e| GenerationError::syntax(e.to_string()))?;
    let parsed: RawDeck =
        serde_json::from_value(value).map_err(|e| GenerationError::schema(e.to_string()))?;

    let title = parsed
        .title
        .ok_or_else(|| GenerationError::schema("the presentation is missing \"title\""))?;
    let raw_slides = parsed
        .slides
        .ok_or_else(|| GenerationError::schema("the presentation is missing \"slides\""))?;

    let slides = raw_slides
        .into_iter()
        .enumerate()
        .map(|(index, slide)| convert_slide(index + 1, slide))
        .collect::<PortResult<Vec<_>>>()?;

    Ok(Deck {
        title,
        slides,
        theme: theme.to_string(),
    })
}

fn convert_slide(position: usize, slide: RawSlide) -> PortResult<Slide> {
    let layout_name = slide.layout.ok_or_else(|| {
        GenerationError::schema(format!("slide {} is missing \"layout\"", position))
    })?;
    let layout = layout_name
        .parse::<SlideLayout>()
        .map_err(|e| GenerationError::schema(format!("slide {}: {}", position, e)))?;

    let content = slide.content.ok_or_else(|| {
        GenerationError::schema(format!("slide {} is missing \"content\"", position))
    })?;
    let title = content.title.ok_or_else(|| {
        GenerationError::schema(format!("slide {} is missing \"content.title\"", position))
    })?;

    Ok(Slide {
        id: slide_id(position, slide.id),
        layout,
        content: SlideContent {
            title,
            subtitle: content.subtitle,
            points: content.points,
            left_column: content.left_column,
            right_column: content.right_column,
            speaker_notes: content.speaker_notes,
            image_prompt: content.image_prompt,
            image_description: content.image_description,
        },
    })
}

/// Ids are taken as given, even blank ones. Numbers are kept in string form;
/// a missing id or one of any other type falls back to a positional id.
fn slide_id(position: usize, id: Option<Value>) -> String {
    match id {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        other => {
            warn!("Slide {} has an unusable id {:?}; assigning one.", position, other);
            format!("slide-{}", position)
        }
    }
}

fn code_fence() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)^```[A-Za-z]*[ \t]*\r?\n?(.*?)\s*```$").expect("code fence pattern is valid")
    })
}

/// Models sometimes wrap JSON in a Markdown fence despite being told not to.
fn unwrap_code_fence(text: &str) -> &str {
    code_fence()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MalformedKind;
    use serde_json::json;

    fn sample_deck(theme: &str) -> Deck {
        Deck {
            title: "Photosynthesis".to_string(),
            theme: theme.to_string(),
            slides: vec![
                Slide {
                    id: "1".to_string(),
                    layout: SlideLayout::Title,
                    content: SlideContent {
                        title: "How Plants Eat Sunlight".to_string(),
                        subtitle: Some("A journey inside a leaf".to_string()),
                        speaker_notes: Some("Welcome everyone.".to_string()),
                        ..Default::default()
                    },
                },
                Slide {
                    id: "2".to_string(),
                    layout: SlideLayout::TwoColumn,
                    content: SlideContent {
                        title: "In and Out".to_string(),
                        left_column: Some(vec!["Water".to_string(), "Sunlight".to_string()]),
                        right_column: Some(vec!["Sugar".to_string(), "Oxygen".to_string()]),
                        image_prompt: Some("macro shot of a green leaf".to_string()),
                        ..Default::default()
                    },
                },
            ],
        }
    }

    fn kind_of(result: PortResult<Deck>) -> MalformedKind {
        match result {
            Err(GenerationError::MalformedResponse { kind, .. }) => kind,
            other => panic!("expected a malformed response error, got {:?}", other),
        }
    }

    #[test]
    fn valid_deck_round_trips() {
        let deck = sample_deck("school");
        let text = serde_json::to_string(&deck).unwrap();
        assert_eq!(validate_response(&text, "school").unwrap(), deck);
    }

    #[test]
    fn blank_string_ids_round_trip_unchanged() {
        let mut deck = sample_deck("modern");
        deck.slides[0].id = String::new();
        deck.slides[1].id = "  ".to_string();
        let text = serde_json::to_string(&deck).unwrap();
        assert_eq!(validate_response(&text, "modern").unwrap(), deck);
    }

    #[test]
    fn theme_is_always_the_requested_one() {
        let text = serde_json::to_string(&sample_deck("cyberpunk")).unwrap();
        let deck = validate_response(&text, "school").unwrap();
        assert_eq!(deck.theme, "school");
    }

    #[test]
    fn empty_and_invalid_text_are_syntax_errors() {
        assert_eq!(kind_of(validate_response("", "modern")), MalformedKind::Syntax);
        assert_eq!(kind_of(validate_response("   ", "modern")), MalformedKind::Syntax);
        assert_eq!(kind_of(validate_response("{title:", "modern")), MalformedKind::Syntax);
    }

    #[test]
    fn missing_required_fields_are_schema_errors() {
        let cases = [
            json!({ "slides": [] }),
            json!({ "title": "No slides" }),
            json!({ "title": "T", "slides": [{ "id": "1", "content": { "title": "x" } }] }),
            json!({ "title": "T", "slides": [{ "id": "1", "layout": "CONTENT" }] }),
            json!({ "title": "T", "slides": [{ "id": "1", "layout": "CONTENT", "content": { "points": ["a"] } }] }),
            json!({ "title": "T", "slides": [{ "id": "1", "layout": "HERO", "content": { "title": "x" } }] }),
            json!({ "title": "T", "slides": [{ "id": "1", "layout": "CONTENT", "content": { "title": "x", "points": "a" } }] }),
            json!([{ "title": "T" }]),
        ];
        for case in cases {
            let result = validate_response(&case.to_string(), "modern");
            assert_eq!(kind_of(result), MalformedKind::Schema, "{}", case);
        }
    }

    #[test]
    fn optional_fields_stay_absent() {
        let text = json!({
            "title": "T",
            "slides": [{ "id": "a", "layout": "CONTENT", "content": { "title": "Only a title", "subtitle": null } }]
        })
        .to_string();
        let deck = validate_response(&text, "modern").unwrap();
        let content = &deck.slides[0].content;
        assert_eq!(content.title, "Only a title");
        assert_eq!(content.points, None);
        assert_eq!(content.subtitle, None);
        assert_eq!(content.speaker_notes, None);
    }

    #[test]
    fn accepts_big_image_and_lowercase_layouts() {
        let text = json!({
            "title": "T",
            "slides": [
                { "id": "1", "layout": "BIG_IMAGE", "content": { "title": "Wow" } },
                { "id": "2", "layout": "two_column", "content": { "title": "Split" } }
            ]
        })
        .to_string();
        let deck = validate_response(&text, "modern").unwrap();
        assert_eq!(deck.slides[0].layout, SlideLayout::BigImage);
        assert_eq!(deck.slides[1].layout, SlideLayout::TwoColumn);
    }

    #[test]
    fn repairs_missing_and_numeric_ids_but_keeps_duplicates() {
        let text = json!({
            "title": "T",
            "slides": [
                { "id": 7, "layout": "TITLE", "content": { "title": "a" } },
                { "layout": "CONTENT", "content": { "title": "b" } },
                { "id": "dup", "layout": "QUOTE", "content": { "title": "c" } },
                { "id": "dup", "layout": "QUOTE", "content": { "title": "d" } },
                { "id": null, "layout": "QUOTE", "content": { "title": "e" } },
                { "id": ["x"], "layout": "QUOTE", "content": { "title": "f" } }
            ]
        })
        .to_string();
        let deck = validate_response(&text, "modern").unwrap();
        let ids: Vec<_> = deck.slides.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["7", "slide-2", "dup", "dup", "slide-5", "slide-6"]);
    }

    #[test]
    fn unwraps_markdown_code_fences() {
        let inner = serde_json::to_string_pretty(&sample_deck("modern")).unwrap();
        let fenced = format!("```json\n{}\n```", inner);
        assert_eq!(validate_response(&fenced, "modern").unwrap(), sample_deck("modern"));

        let bare_fence = format!("```\n{}```", inner);
        assert_eq!(validate_response(&bare_fence, "modern").unwrap(), sample_deck("modern"));
    }

    #[test]
    fn ignores_unknown_fields() {
        let text = json!({
            "title": "T",
            "theme": "ignored",
            "slides": [{ "id": "1", "layout": "QUOTE", "content": { "title": "q", "author": "Ada" }, "notes": 3 }]
        })
        .to_string();
        let deck = validate_response(&text, "minimal").unwrap();
        assert_eq!(deck.slides.len(), 1);
        assert_eq!(deck.theme, "minimal");
    }
}
