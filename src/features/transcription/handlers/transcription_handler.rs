use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::transcription::dtos::{TranscribeAudioDto, TranscriptionResponseDto};
use crate::features::transcription::services::TranscriptionService;
use crate::modules::speech::AudioUpload;
use crate::shared::types::ApiResponse;

const MAX_LANGUAGE_LEN: usize = 10;

fn multipart_error(e: MultipartError) -> AppError {
    debug!("Failed to read multipart data: {}", e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Audio upload exceeds the size limit".to_string())
    } else {
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    }
}

/// Transcribe a recorded dictation
///
/// Accepts multipart/form-data with:
/// - `audio` (or `file`): the recording
/// - `language`: optional ISO-639-1 hint
#[utoipa::path(
    post,
    path = "/api/transcribe",
    tag = "transcription",
    request_body(
        content = TranscribeAudioDto,
        content_type = "multipart/form-data",
        description = "Audio recording with an optional language hint",
    ),
    responses(
        (status = 200, description = "Transcript with medical spelling corrections", body = ApiResponse<TranscriptionResponseDto>),
        (status = 400, description = "Missing, empty or non-audio upload"),
        (status = 401, description = "Authentication required"),
        (status = 413, description = "Audio too large"),
        (status = 429, description = "Speech provider rate limit"),
        (status = 502, description = "Speech provider error")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn transcribe_audio(
    user: AuthenticatedUser,
    State(service): State<Arc<TranscriptionService>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<TranscriptionResponseDto>>> {
    let mut audio: Option<(Vec<u8>, String, String)> = None;
    let mut language: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "audio" | "file" if audio.is_none() => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let file_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "recording".to_string());
                let data = field.bytes().await.map_err(multipart_error)?;

                audio = Some((data.to_vec(), file_name, content_type));
            }
            "language" => {
                let text = field.text().await.map_err(multipart_error)?;
                let text = text.trim();
                if text.len() > MAX_LANGUAGE_LEN {
                    return Err(AppError::BadRequest(
                        "language must be a short language code such as \"en\"".to_string(),
                    ));
                }
                if !text.is_empty() {
                    language = Some(text.to_string());
                }
            }
            _ => {
                debug!("Ignoring multipart field: {}", field_name);
            }
        }
    }

    let (bytes, file_name, content_type) = audio.ok_or_else(|| {
        AppError::BadRequest("Audio file is required (field \"audio\")".to_string())
    })?;

    debug!("User {} uploaded {} bytes for transcription", user.user_id, bytes.len());

    let result = service
        .transcribe(AudioUpload {
            bytes,
            file_name,
            content_type,
            language,
        })
        .await?;

    Ok(Json(ApiResponse::success(Some(result), None, None)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::transcription::routes;
    use crate::features::transcription::services::transcription_service::tests::FixedTranscript;
    use crate::shared::test_helpers::{regular_user, with_user};
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;

    fn server(stt: Arc<FixedTranscript>, max: usize) -> TestServer {
        let service = Arc::new(TranscriptionService::new(stt, max));
        TestServer::new(with_user(routes::routes(service), regular_user())).unwrap()
    }

    fn audio_part(bytes: Vec<u8>, mime: &str) -> Part {
        Part::bytes(bytes).file_name("dictation.webm").mime_type(mime)
    }

    #[tokio::test]
    async fn test_transcribe_returns_corrected_text() {
        let stt = Arc::new(FixedTranscript::new("Small plural effusion."));
        let form = MultipartForm::new()
            .add_part("audio", audio_part(vec![1, 2, 3], "audio/webm"))
            .add_text("language", "en");

        let response = server(stt.clone(), 1024)
            .post("/api/transcribe")
            .multipart(form)
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["data"]["text"], "Small pleural effusion.");
        assert_eq!(body["data"]["raw_text"], "Small plural effusion.");
        assert_eq!(body["data"]["corrections"][0]["from"], "plural effusion");

        let last = stt.last.lock().unwrap();
        let upload = last.as_ref().unwrap();
        assert_eq!(upload.language.as_deref(), Some("en"));
        assert_eq!(upload.bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_file_field_name_accepted() {
        let form = MultipartForm::new().add_part("file", audio_part(vec![1], "video/webm"));

        let response = server(Arc::new(FixedTranscript::new("ok")), 1024)
            .post("/api/transcribe")
            .multipart(form)
            .await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn test_missing_audio_field() {
        let form = MultipartForm::new().add_text("language", "en");

        let response = server(Arc::new(FixedTranscript::new("ok")), 1024)
            .post("/api/transcribe")
            .multipart(form)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_and_wrong_type_rejected() {
        let server = server(Arc::new(FixedTranscript::new("ok")), 1024);

        let empty = MultipartForm::new().add_part("audio", audio_part(vec![], "audio/webm"));
        server
            .post("/api/transcribe")
            .multipart(empty)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let text = MultipartForm::new().add_part("audio", audio_part(vec![1], "text/plain"));
        server
            .post("/api/transcribe")
            .multipart(text)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_audio() {
        let form = MultipartForm::new().add_part("audio", audio_part(vec![0; 64], "audio/wav"));

        let response = server(Arc::new(FixedTranscript::new("ok")), 32)
            .post("/api/transcribe")
            .multipart(form)
            .await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    }
}
