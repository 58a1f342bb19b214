pub mod dictionary;
pub mod transcription_service;

pub use transcription_service::TranscriptionService;
