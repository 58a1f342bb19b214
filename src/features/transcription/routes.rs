use axum::{extract::DefaultBodyLimit, routing::post, Router};
use std::sync::Arc;

use crate::features::transcription::handlers::transcribe_audio;
use crate::features::transcription::services::TranscriptionService;

/// Multipart framing on top of the audio itself
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn routes(service: Arc<TranscriptionService>) -> Router {
    let body_limit = service.max_audio_bytes() + MULTIPART_OVERHEAD_BYTES;
    Router::new()
        .route(
            "/api/transcribe",
            post(transcribe_audio).layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(service)
}
