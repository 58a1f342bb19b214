use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info};

use crate::core::config::TranscriptionConfig;
use crate::core::error::AppError;
use crate::modules::speech::{AudioUpload, SpeechToText};
use crate::modules::upstream;

const SERVICE: &str = "Speech API";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Biases recognition towards clinical vocabulary
const MEDICAL_VOCABULARY_PROMPT: &str = "Clinical dictation. Vocabulary: echocardiogram, \
    myocardial infarction, atrial fibrillation, pneumothorax, pleural effusion, consolidation, \
    hepatomegaly, splenomegaly, cholecystitis, appendicitis, hydronephrosis, metastasis, \
    lymphadenopathy, stenosis, thrombosis, embolism, edema, hemorrhage, ischemia, mg, mL, mmHg.";

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// OpenAI-compatible `/audio/transcriptions` client
pub struct WhisperClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    default_language: Option<String>,
    request_timeout: Duration,
}

impl WhisperClient {
    pub fn new(config: &TranscriptionConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "Speech client initialized for {} (model: {})",
            config.base_url, config.model
        );

        Ok(Self {
            http,
            endpoint: format!(
                "{}/audio/transcriptions",
                config.base_url.trim_end_matches('/')
            ),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            default_language: config.language.clone(),
            request_timeout: config.request_timeout,
        })
    }

    fn form(&self, audio: AudioUpload) -> Result<Form, AppError> {
        let size = audio.bytes.len();
        let file = Part::bytes(audio.bytes)
            .file_name(audio.file_name)
            .mime_str(&audio.content_type)
            .map_err(|e| AppError::BadRequest(format!("Invalid audio content type: {}", e)))?;

        let mut form = Form::new()
            .part("file", file)
            .text("model", self.model.clone())
            .text("response_format", "json")
            .text("prompt", MEDICAL_VOCABULARY_PROMPT);

        if let Some(language) = audio.language.or_else(|| self.default_language.clone()) {
            form = form.text("language", language);
        }

        debug!("Prepared transcription upload ({} bytes)", size);
        Ok(form)
    }
}

#[async_trait]
impl SpeechToText for WhisperClient {
    async fn transcribe(&self, audio: AudioUpload) -> Result<String, AppError> {
        let form = self.form(audio)?;

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(self.request_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| upstream::map_transport(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(upstream::error_from_response(SERVICE, response).await);
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| upstream::map_transport(SERVICE, e))?;

        Ok(parsed.text)
    }
}
