use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::transcription::dtos::TranscriptionResponseDto;
use crate::features::transcription::services::dictionary::correct_medical_terms;
use crate::modules::speech::{AudioUpload, SpeechToText};

/// `audio/*`, plus `video/webm` which some browsers use for MediaRecorder output
pub fn is_audio_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence.starts_with("audio/") || essence == "video/webm"
}

pub struct TranscriptionService {
    stt: Arc<dyn SpeechToText>,
    max_audio_bytes: usize,
}

impl TranscriptionService {
    pub fn new(stt: Arc<dyn SpeechToText>, max_audio_bytes: usize) -> Self {
        Self {
            stt,
            max_audio_bytes,
        }
    }

    pub fn max_audio_bytes(&self) -> usize {
        self.max_audio_bytes
    }

    pub fn check_upload(&self, audio: &AudioUpload) -> Result<()> {
        if audio.bytes.is_empty() {
            return Err(AppError::BadRequest("Audio file is empty".to_string()));
        }
        if audio.bytes.len() > self.max_audio_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Audio too large. Maximum size is {} MB",
                self.max_audio_bytes / 1024 / 1024
            )));
        }
        if !is_audio_content_type(&audio.content_type) {
            return Err(AppError::BadRequest(format!(
                "Unsupported content type '{}'. Expected an audio recording",
                audio.content_type
            )));
        }
        Ok(())
    }

    pub async fn transcribe(&self, audio: AudioUpload) -> Result<TranscriptionResponseDto> {
        self.check_upload(&audio)?;

        tracing::debug!(
            "Transcribing {} bytes of {} ({})",
            audio.bytes.len(),
            audio.content_type,
            audio.file_name
        );
        let raw_text = self.stt.transcribe(audio).await?;
        let raw_text = raw_text.trim().to_string();

        let (text, corrections) = correct_medical_terms(&raw_text);
        if !corrections.is_empty() {
            tracing::debug!("Applied {} medical term corrections", corrections.len());
        }

        Ok(TranscriptionResponseDto {
            text,
            raw_text,
            corrections: corrections.into_iter().map(Into::into).collect(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns a fixed transcript and remembers the last upload
    pub struct FixedTranscript {
        pub text: &'static str,
        pub last: Mutex<Option<AudioUpload>>,
    }

    impl FixedTranscript {
        pub fn new(text: &'static str) -> Self {
            Self {
                text,
                last: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl SpeechToText for FixedTranscript {
        async fn transcribe(&self, audio: AudioUpload) -> Result<String> {
            *self.last.lock().unwrap() = Some(audio);
            Ok(self.text.to_string())
        }
    }

    fn upload(bytes: usize, content_type: &str) -> AudioUpload {
        AudioUpload {
            bytes: vec![1; bytes],
            file_name: "dictation.webm".to_string(),
            content_type: content_type.to_string(),
            language: None,
        }
    }

    fn service(max: usize) -> TranscriptionService {
        TranscriptionService::new(Arc::new(FixedTranscript::new(" no new monia ")), max)
    }

    #[test]
    fn test_content_types() {
        assert!(is_audio_content_type("audio/webm;codecs=opus"));
        assert!(is_audio_content_type("Audio/MPEG"));
        assert!(is_audio_content_type("video/webm"));
        assert!(!is_audio_content_type("video/mp4"));
        assert!(!is_audio_content_type("application/octet-stream"));
    }

    #[test]
    fn test_upload_checks() {
        let service = service(10);
        assert!(matches!(
            service.check_upload(&upload(0, "audio/webm")),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            service.check_upload(&upload(11, "audio/webm")),
            Err(AppError::PayloadTooLarge(_))
        ));
        assert!(matches!(
            service.check_upload(&upload(5, "text/plain")),
            Err(AppError::BadRequest(_))
        ));
        assert!(service.check_upload(&upload(10, "audio/webm")).is_ok());
    }

    #[tokio::test]
    async fn test_transcribe_applies_corrections() {
        let result = service(1024).transcribe(upload(4, "audio/ogg")).await.unwrap();
        assert_eq!(result.raw_text, "no new monia");
        assert_eq!(result.text, "no pneumonia");
        assert_eq!(result.corrections.len(), 1);
        assert_eq!(result.corrections[0].to, "pneumonia");
    }
}
