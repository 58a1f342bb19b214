//! Modules layer - Infrastructure components for external integrations
//!
//! Contains clients for the OpenAI-compatible chat-completion and
//! speech-to-text APIs.

pub mod llm;
pub mod speech;
pub mod upstream;
