//! crates/slide_deck_core/src/prompt.rs
//!
//! Builds the system instruction and the user message for one generation.
//! The output is provider-neutral; each adapter maps it onto its own wire format.

use crate::domain::{InputMode, SlideLayout};
use crate::normalize::{ImagePart, NormalizedInput};

const DESIGNER_PREAMBLE: &str = "You are a professional presentation designer and content creator. \
You must respond in valid JSON format.";

const SCHEMA_INSTRUCTIONS: &str = r#"Structure the response as a Presentation object with "title" (string) and "slides" (array).
Each slide has "id" (string, unique within the presentation), "layout" (one of {layouts}), and "content" (object).
The first slide MUST be a TITLE slide. Use a variety of layouts across the rest of the deck.
"content" MUST include:
- "title": (string)
- "subtitle": (string, optional)
- "points": (string array, optional) used by CONTENT slides
- "leftColumn": (string array, optional) used by TWO_COLUMN slides
- "rightColumn": (string array, optional) used by TWO_COLUMN slides
- "speakerNotes": (string) A detailed script for the presenter (3-4 sentences).
- "imagePrompt": (string) A highly descriptive prompt for a cinematic background image. Be specific about style, lighting, and elements (e.g. "aerial view of a lush rainforest at sunrise, hyper-realistic, 8k, soft lighting"). Avoid text in images."#;

const JSON_ONLY: &str = "Respond ONLY with the JSON object. No markdown, no filler.";

const EMPTY_TEXT_FALLBACK: &str = "Please extract content from the attached files.";

/// A provider-neutral prompt: a system instruction plus one user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system_instruction: String,
    pub user_text: String,
    /// Inline images that accompany `user_text`, in attachment order.
    pub images: Vec<ImagePart>,
}

/// Tone guidance for the themes that change how the copy is written.
pub fn theme_directive(theme: &str) -> Option<&'static str> {
    match theme.trim().to_ascii_lowercase().as_str() {
        "school" => Some(
            "Use simple, engaging, and child-friendly language suitable for elementary school \
             students (ages 6-11). Focus on being educational, fun, and clear.",
        ),
        "corporate" => Some("Use professional, punchy business language."),
        "minimal" => Some("Use concise, high-impact text."),
        _ => None,
    }
}

fn slide_count_rule(mode: InputMode, requested_slide_count: u32) -> String {
    match mode {
        InputMode::Topic => format!(
            "Generate exactly {} slides, developed from the topic the user provides.",
            requested_slide_count
        ),
        InputMode::File => format!(
            "Generate exactly {} slides. Build them primarily from the attached material and \
             treat the user's text only as secondary guidance.",
            requested_slide_count
        ),
        InputMode::Content => "Do not aim for a fixed number of slides. Infer the slide count \
             from the depth of the content provided: cover every substantive point without \
             padding thin material."
            .to_string(),
    }
}

/// Builds the prompt pair for a normalized input.
pub fn build_prompt(
    input: &NormalizedInput,
    mode: InputMode,
    theme: &str,
    requested_slide_count: u32,
) -> Prompt {
    let layouts = SlideLayout::REQUESTED
        .iter()
        .map(SlideLayout::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    let mut system_instruction = String::from(DESIGNER_PREAMBLE);
    system_instruction.push_str("\n\nTheme style requested: ");
    system_instruction.push_str(theme);
    if let Some(directive) = theme_directive(theme) {
        system_instruction.push_str("\nTheme-specific instructions: ");
        system_instruction.push_str(directive);
    }
    system_instruction.push_str("\n\n");
    system_instruction.push_str(&slide_count_rule(mode, requested_slide_count));
    system_instruction.push_str("\n\n");
    system_instruction.push_str(&SCHEMA_INSTRUCTIONS.replace("{layouts}", &layouts));
    system_instruction.push_str("\n\n");
    system_instruction.push_str(JSON_ONLY);

    Prompt {
        system_instruction,
        user_text: user_text(input, mode, theme),
        images: input.images.clone(),
    }
}

fn user_text(input: &NormalizedInput, mode: InputMode, theme: &str) -> String {
    let label = match mode {
        InputMode::Topic => "Topic",
        InputMode::Content => "Content",
        InputMode::File => "User guidance",
    };
    let text = if input.text.is_empty() {
        EMPTY_TEXT_FALLBACK
    } else {
        input.text.as_str()
    };

    let mut out = format!(
        "Transform the provided input into a professional presentation.\n\
         Theme style requested: {}\n\n{}: {}",
        theme, label, text
    );

    if !input.context.is_empty() {
        out.push_str("\n\nAdditional context from the attached documents:");
        for block in &input.context {
            out.push_str(&format!(
                "\n\n--- Attachment {} ({}) ---\n{}",
                block.position, block.mime_type, block.text
            ));
        }
    }

    if !input.images.is_empty() {
        out.push_str(&format!(
            "\n\n{} image(s) are attached. Use what they show as part of the input.",
            input.images.len()
        ));
    }

    out.push_str("\n\n");
    out.push_str(JSON_ONLY);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::ContextBlock;

    fn text_input(text: &str) -> NormalizedInput {
        NormalizedInput {
            text: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn topic_mode_demands_the_exact_count() {
        for count in [1, 5, 12, 40] {
            let prompt = build_prompt(&text_input("Rust ownership"), InputMode::Topic, "modern", count);
            assert!(
                prompt
                    .system_instruction
                    .contains(&format!("Generate exactly {} slides", count)),
                "{}",
                prompt.system_instruction
            );
        }
    }

    #[test]
    fn content_mode_relaxes_the_count() {
        let prompt = build_prompt(&text_input("Long notes"), InputMode::Content, "modern", 7);
        assert!(!prompt.system_instruction.contains("exactly"));
        assert!(!prompt.system_instruction.contains('7'));
        assert!(prompt.system_instruction.contains("depth of the content"));
        assert!(prompt.user_text.contains("Content: Long notes"));
    }

    #[test]
    fn file_mode_prefers_attachments() {
        let prompt = build_prompt(&text_input("focus on costs"), InputMode::File, "modern", 4);
        assert!(prompt.system_instruction.contains("primarily from the attached material"));
        assert!(prompt.user_text.contains("User guidance: focus on costs"));
    }

    #[test]
    fn school_theme_asks_for_child_friendly_tone() {
        let prompt = build_prompt(&text_input("Photosynthesis basics"), InputMode::Topic, "school", 5);
        assert!(prompt.system_instruction.contains("child-friendly"));
        assert!(prompt.system_instruction.contains("Generate exactly 5 slides"));
        assert!(prompt.user_text.contains("Topic: Photosynthesis basics"));
    }

    #[test]
    fn unknown_theme_gets_no_directive() {
        let prompt = build_prompt(&text_input("x"), InputMode::Topic, "midnight", 3);
        assert!(!prompt.system_instruction.contains("Theme-specific instructions"));
        assert!(prompt.system_instruction.contains("Theme style requested: midnight"));
    }

    #[test]
    fn lists_requested_layouts_and_fields() {
        let prompt = build_prompt(&text_input("x"), InputMode::Topic, "modern", 3);
        assert!(prompt
            .system_instruction
            .contains("one of TITLE, CONTENT, TWO_COLUMN, QUOTE)"));
        assert!(!prompt.system_instruction.contains("BIG_IMAGE"));
        for field in ["\"speakerNotes\"", "\"imagePrompt\"", "\"leftColumn\"", "\"rightColumn\""] {
            assert!(prompt.system_instruction.contains(field), "missing {}", field);
        }
    }

    #[test]
    fn appends_context_blocks_in_order() {
        let input = NormalizedInput {
            text: String::new(),
            context: vec![
                ContextBlock {
                    position: 1,
                    mime_type: "application/pdf".to_string(),
                    text: "Quarterly revenue grew 12%...".to_string(),
                },
                ContextBlock {
                    position: 2,
                    mime_type: "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                        .to_string(),
                    text: "Headcount is flat.".to_string(),
                },
            ],
            images: vec![],
        };
        let prompt = build_prompt(&input, InputMode::File, "corporate", 6);

        let first = prompt.user_text.find("Quarterly revenue grew 12%...").unwrap();
        let second = prompt.user_text.find("Headcount is flat.").unwrap();
        assert!(first < second);
        assert!(prompt.user_text.contains(EMPTY_TEXT_FALLBACK));
        assert!(prompt.images.is_empty());
    }

    #[test]
    fn images_travel_as_parts_not_text() {
        let input = NormalizedInput {
            text: "Describe the chart".to_string(),
            context: vec![],
            images: vec![ImagePart {
                mime_type: "image/jpeg".to_string(),
                data: "QUJD".to_string(),
            }],
        };
        let prompt = build_prompt(&input, InputMode::Topic, "modern", 3);
        assert_eq!(prompt.images, input.images);
        assert!(!prompt.user_text.contains("QUJD"));
        assert!(prompt.user_text.contains("1 image(s) are attached"));
    }
}
