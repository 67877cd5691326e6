//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use slide_deck_core::DeckGenerator;

/// The shared application state, created once at startup and passed to all handlers.
///
/// Generation is stateless, so every request shares the same generator.
#[derive(Clone)]
pub struct AppState {
    pub generator: DeckGenerator,
}
