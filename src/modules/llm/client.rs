use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::config::LlmConfig;
use crate::core::error::AppError;
use crate::modules::llm::sse::{SseDecoder, DONE_SENTINEL};
use crate::modules::llm::{ChatCompletionProvider, ChatMessage, DeltaStream};
use crate::modules::upstream;

const SERVICE: &str = "LLM API";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

type ByteStream = BoxStream<'static, reqwest::Result<Bytes>>;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    error: Option<StreamError>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamError {
    message: String,
}

/// OpenAI-compatible chat-completion client
pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    request_timeout: Duration,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "LLM client initialized for {} (model: {})",
            config.base_url, config.model
        );

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            request_timeout: config.request_timeout,
        })
    }

    fn request(&self, messages: &[ChatMessage], stream: bool) -> reqwest::RequestBuilder {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream,
        };
        self.http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
    }
}

#[async_trait]
impl ChatCompletionProvider for OpenAiClient {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, AppError> {
        debug!("Requesting chat completion ({} messages)", messages.len());

        let response = self
            .request(&messages, false)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| upstream::map_transport(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(upstream::error_from_response(SERVICE, response).await);
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| upstream::map_transport(SERVICE, e))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                AppError::ExternalServiceError(format!("{} returned no content", SERVICE))
            })
    }

    async fn stream(&self, messages: Vec<ChatMessage>) -> Result<DeltaStream, AppError> {
        debug!("Opening streaming chat completion ({} messages)", messages.len());

        // No total timeout: a long report can stream for minutes
        let response = self
            .request(&messages, true)
            .send()
            .await
            .map_err(|e| upstream::map_transport(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(upstream::error_from_response(SERVICE, response).await);
        }

        Ok(delta_stream(response.bytes_stream().boxed()))
    }
}

struct DeltaState {
    body: ByteStream,
    decoder: SseDecoder,
    pending: VecDeque<Result<String, AppError>>,
    finished: bool,
}

impl DeltaState {
    fn absorb(&mut self, payloads: Vec<String>) {
        for payload in payloads {
            if self.finished {
                return;
            }
            if payload.trim() == DONE_SENTINEL {
                self.finished = true;
                return;
            }
            match serde_json::from_str::<StreamChunk>(&payload) {
                Ok(chunk) => {
                    if let Some(err) = chunk.error {
                        self.pending
                            .push_back(Err(AppError::ExternalServiceError(err.message)));
                        self.finished = true;
                        return;
                    }
                    for choice in chunk.choices {
                        if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
                            self.pending.push_back(Ok(content));
                        }
                    }
                }
                Err(e) => warn!("Skipping unparseable stream chunk: {}", e),
            }
        }
    }
}

/// Turn an upstream SSE byte stream into content deltas
fn delta_stream(body: ByteStream) -> DeltaStream {
    let state = DeltaState {
        body,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let payloads = state.decoder.feed(&chunk);
                    state.absorb(payloads);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(upstream::map_transport(SERVICE, e)), state));
                }
                None => {
                    // Upstream closed without [DONE]; keep what arrived
                    let tail = state.decoder.finish().into_iter().collect();
                    state.absorb(tail);
                    state.finished = true;
                }
            }
        }
    })
    .boxed()
}
