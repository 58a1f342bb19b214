//! Chat-completion integration.
//!
//! [`ChatCompletionProvider`] is the seam the generation and refine flows
//! depend on; [`OpenAiClient`] implements it against any OpenAI-compatible
//! `/chat/completions` endpoint.

pub mod client;
pub mod sse;

pub use client::OpenAiClient;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::core::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Content deltas in arrival order. The stream ends after the upstream `[DONE]`;
/// an `Err` item means the upstream failed mid-stream and nothing follows it.
pub type DeltaStream = BoxStream<'static, Result<String, AppError>>;

#[async_trait]
pub trait ChatCompletionProvider: Send + Sync {
    /// Single-shot completion returning the full assistant message
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, AppError>;

    /// Open a streaming completion. Errors before the first byte are returned
    /// here rather than inside the stream.
    async fn stream(&self, messages: Vec<ChatMessage>) -> Result<DeltaStream, AppError>;
}
