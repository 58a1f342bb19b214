//! Moves LLM deltas from the upstream stream to the client's SSE channel.
//!
//! One pump task runs per generation request. It owns the upstream stream,
//! so returning from [`pump`] drops the HTTP response and stops reading it.

use std::sync::Arc;

use async_trait::async_trait;
use axum::response::sse::Event;
use futures::StreamExt;
use serde_json::json;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::reports::models::NewReport;
use crate::features::reports::ReportService;
use crate::modules::llm::sse::DONE_SENTINEL;
use crate::modules::llm::DeltaStream;
use crate::shared::constants::MAX_DERIVED_TITLE_CHARS;

/// What the client sees, one SSE `data:` frame each
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationEvent {
    Delta(String),
    Saved(Uuid),
    Error(String),
    Done,
}

impl GenerationEvent {
    pub fn data(&self) -> String {
        match self {
            GenerationEvent::Delta(content) => json!({ "content": content }).to_string(),
            GenerationEvent::Saved(id) => json!({ "report_id": id }).to_string(),
            GenerationEvent::Error(message) => json!({ "error": message }).to_string(),
            GenerationEvent::Done => DONE_SENTINEL.to_string(),
        }
    }

    pub fn into_sse(self) -> Event {
        Event::default().data(self.data())
    }
}

/// Persists the finished report
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn save(&self, report: NewReport) -> Result<Uuid>;
}

#[async_trait]
impl ReportSink for ReportService {
    async fn save(&self, report: NewReport) -> Result<Uuid> {
        Ok(self.insert(report).await?.id)
    }
}

/// Everything needed to store the report once the stream completes
#[derive(Debug, Clone)]
pub struct ReportDraft {
    pub user_id: Uuid,
    pub findings: String,
    pub specialty: String,
    pub specialty_name: String,
    pub prompt_id: Option<Uuid>,
    pub title: Option<String>,
    pub save: bool,
}

impl ReportDraft {
    fn into_new_report(self, content: String) -> NewReport {
        let title = derive_title(self.title.as_deref(), &content, &self.specialty_name);
        NewReport {
            title,
            findings: self.findings,
            content,
            specialty: self.specialty,
            prompt_id: self.prompt_id,
            user_id: self.user_id,
        }
    }
}

fn clean_heading(line: &str) -> String {
    line.trim()
        .trim_start_matches('#')
        .trim()
        .trim_matches(|c| c == '*' || c == '_')
        .trim()
        .to_string()
}

/// Given title as-is, else the first markdown heading, else the first line,
/// else "<Specialty> report". Only derived titles are shortened.
pub fn derive_title(given: Option<&str>, content: &str, specialty_name: &str) -> String {
    if let Some(title) = given.map(str::trim).filter(|t| !t.is_empty()) {
        return title.to_string();
    }

    let derived = content
        .lines()
        .find(|l| l.trim_start().starts_with('#'))
        .map(clean_heading)
        .filter(|t| !t.is_empty())
        .or_else(|| {
            content
                .lines()
                .map(clean_heading)
                .find(|l| !l.is_empty())
        })
        .unwrap_or_else(|| format!("{} report", specialty_name));

    match derived.char_indices().nth(MAX_DERIVED_TITLE_CHARS) {
        Some((idx, _)) => derived[..idx].trim_end().to_string(),
        None => derived,
    }
}

/// Relay `deltas` into `tx`, then save and finish.
///
/// Always ends with [`GenerationEvent::Done`] unless the client went away.
pub async fn pump(
    mut deltas: DeltaStream,
    tx: mpsc::Sender<GenerationEvent>,
    sink: Arc<dyn ReportSink>,
    draft: ReportDraft,
) {
    let mut text = String::new();

    loop {
        let item = tokio::select! {
            item = deltas.next() => item,
            _ = tx.closed() => {
                tracing::info!("Client disconnected, abandoning generation for user {}", draft.user_id);
                return;
            }
        };

        match item {
            Some(Ok(delta)) => {
                text.push_str(&delta);
                if tx.send(GenerationEvent::Delta(delta)).await.is_err() {
                    tracing::info!("Client disconnected mid-stream for user {}", draft.user_id);
                    return;
                }
            }
            Some(Err(e)) => {
                tracing::error!("Generation stream failed: {}", e);
                let _ = tx.send(GenerationEvent::Error(e.public_message())).await;
                let _ = tx.send(GenerationEvent::Done).await;
                return;
            }
            None => break,
        }
    }

    drop(deltas);

    if draft.save && !text.trim().is_empty() {
        let report = draft.into_new_report(text);
        match sink.save(report).await {
            Ok(id) => {
                let _ = tx.send(GenerationEvent::Saved(id)).await;
            }
            Err(e) => {
                tracing::error!("Failed to save generated report: {}", e);
                let _ = tx.send(GenerationEvent::Error(e.public_message())).await;
            }
        }
    } else {
        tracing::debug!("Generated report not saved (save: {})", draft.save);
    }

    let _ = tx.send(GenerationEvent::Done).await;
}
