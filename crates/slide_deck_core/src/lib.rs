pub mod domain;
pub mod generator;
pub mod normalize;
pub mod ports;
pub mod prompt;
pub mod validate;

pub use domain::{Attachment, Deck, GenerationRequest, InputMode, Slide, SlideContent, SlideLayout};
pub use generator::{DeckGenerator, DEFAULT_THEME};
pub use normalize::{normalize, ContextBlock, ImagePart, NormalizedInput, MAX_ATTACHMENT_BYTES};
pub use ports::{GenerationError, MalformedKind, ModelClient, ModelSelection, PortResult};
pub use prompt::{build_prompt, Prompt};
pub use validate::validate_response;
