//! Streaming report generation.
//!
//! A request resolves a prompt, renders the message pair, opens the LLM stream
//! and relays deltas to the client over SSE. The finished text is saved as a
//! report unless the client asked not to, or went away before the end.

pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;

pub use services::GenerationService;
