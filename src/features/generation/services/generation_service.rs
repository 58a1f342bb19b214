use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::generation::dtos::GenerateReportDto;
use crate::features::generation::services::relay::{pump, GenerationEvent, ReportDraft, ReportSink};
use crate::features::prompts::models::Prompt;
use crate::features::prompts::PromptService;
use crate::modules::llm::{ChatCompletionProvider, ChatMessage};
use crate::shared::constants::GENERATION_CHANNEL_CAPACITY;
use crate::shared::prompts::{render_generation_messages, PromptContext};

/// Finds the stored prompt to use for a generation request
#[async_trait]
pub trait PromptResolver: Send + Sync {
    async fn resolve(
        &self,
        user: &AuthenticatedUser,
        specialty: &str,
        prompt_id: Option<Uuid>,
    ) -> Result<Option<Prompt>>;
}

#[async_trait]
impl PromptResolver for PromptService {
    async fn resolve(
        &self,
        user: &AuthenticatedUser,
        specialty: &str,
        prompt_id: Option<Uuid>,
    ) -> Result<Option<Prompt>> {
        self.resolve_for_generation(user, specialty, prompt_id).await
    }
}

pub struct GenerationService {
    prompts: Arc<dyn PromptResolver>,
    llm: Arc<dyn ChatCompletionProvider>,
    sink: Arc<dyn ReportSink>,
}

impl GenerationService {
    pub fn new(
        prompts: Arc<dyn PromptResolver>,
        llm: Arc<dyn ChatCompletionProvider>,
        sink: Arc<dyn ReportSink>,
    ) -> Self {
        Self { prompts, llm, sink }
    }

    async fn prepare(
        &self,
        user: &AuthenticatedUser,
        dto: GenerateReportDto,
    ) -> Result<(Vec<ChatMessage>, ReportDraft)> {
        let specialty = dto.specialty.trim().to_string();
        let prompt = self
            .prompts
            .resolve(user, &specialty, dto.prompt_id)
            .await?;

        let ctx = PromptContext::new(&specialty);
        let findings = dto.findings.trim();
        let (system, user_message) = render_generation_messages(
            prompt.as_ref().map(|p| p.content.as_str()),
            &ctx,
            findings,
        )?;

        let draft = ReportDraft {
            user_id: user.user_id,
            findings: findings.to_string(),
            specialty,
            specialty_name: ctx.specialty_name,
            prompt_id: prompt.map(|p| p.id),
            title: dto.title,
            save: dto.save,
        };

        Ok((
            vec![ChatMessage::system(system), ChatMessage::user(user_message)],
            draft,
        ))
    }

    /// Open the upstream stream and hand it to a pump task.
    ///
    /// Errors before the first byte (bad prompt, upstream 4xx/5xx) are returned
    /// here so the handler can answer with a plain JSON error.
    pub async fn start(
        &self,
        user: &AuthenticatedUser,
        dto: GenerateReportDto,
    ) -> Result<ReceiverStream<GenerationEvent>> {
        let (messages, draft) = self.prepare(user, dto).await?;

        tracing::info!(
            "Starting {} report generation for user {}",
            draft.specialty,
            user.user_id
        );
        let deltas = self.llm.stream(messages).await?;

        let (tx, rx) = mpsc::channel(GENERATION_CHANNEL_CAPACITY);
        tokio::spawn(pump(deltas, tx, self.sink.clone(), draft));

        Ok(ReceiverStream::new(rx))
    }
}
