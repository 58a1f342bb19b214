use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::transcription::services::dictionary::Correction;

/// Multipart form for `POST /api/transcribe`, documentation only.
/// The handler reads the fields with axum's `Multipart` extractor.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct TranscribeAudioDto {
    /// Recorded audio (`audio/*` or `video/webm`). The field may also be named `file`.
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub audio: String,
    /// ISO-639-1 language hint, e.g. "en"
    #[schema(example = "en")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CorrectionDto {
    pub from: String,
    pub to: String,
}

impl From<Correction> for CorrectionDto {
    fn from(c: Correction) -> Self {
        Self { from: c.from, to: c.to }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TranscriptionResponseDto {
    /// Transcript after medical spelling correction
    pub text: String,
    /// Transcript as returned by the speech provider
    pub raw_text: String,
    pub corrections: Vec<CorrectionDto>,
}
