//! Server half of dictation: audio upload, speech-to-text, medical spelling fixes.

pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;

pub use services::TranscriptionService;
