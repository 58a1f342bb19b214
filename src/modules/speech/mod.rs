//! Speech-to-text integration.

pub mod client;

pub use client::WhisperClient;

use async_trait::async_trait;

use crate::core::error::AppError;

/// Recorded audio as received from the browser
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
    /// ISO-639-1 hint; `None` lets the provider detect the language
    pub language: Option<String>,
}

#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Raw transcript text, before any dictionary correction
    async fn transcribe(&self, audio: AudioUpload) -> Result<String, AppError>;
}
