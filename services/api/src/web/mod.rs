pub mod rest;
pub mod state;

// Re-export the handlers so the binary that builds the router can reach them.
pub use rest::{generate_presentation_handler, health_handler, router};
