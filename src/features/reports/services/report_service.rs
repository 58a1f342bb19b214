use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::database::{constraint_violation, ConstraintViolation};
use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::reports::dtos::{
    CreateReportDto, ReportQueryParams, ReportResponseDto, UpdateReportDto,
};
use crate::features::prompts::models::Prompt;
use crate::features::prompts::services::policy;
use crate::features::prompts::PromptService;
use crate::features::reports::models::{NewReport, Report};
use crate::modules::llm::{ChatCompletionProvider, ChatMessage};
use crate::shared::prompts::{render_refine_messages, PromptContext};
use crate::shared::types::{contains_pattern, non_blank};

const REPORT_COLUMNS: &str =
    "id, title, findings, content, specialty, prompt_id, user_id, created_at, updated_at";

fn handle_db_error(e: sqlx::Error) -> AppError {
    match constraint_violation(&e) {
        Some(ConstraintViolation::ForeignKey(_)) => {
            AppError::BadRequest("Referenced prompt does not exist".to_string())
        }
        _ => AppError::Database(e),
    }
}

/// Owner or admin; anyone else gets 404 so ids cannot be probed
pub fn ensure_report_access(user: &AuthenticatedUser, report: &Report) -> Result<()> {
    if user.can_access_owned(report.user_id) {
        Ok(())
    } else {
        Err(AppError::NotFound(format!(
            "Report with id {} not found",
            report.id
        )))
    }
}

/// Loads a prompt by id so a report can reference it
#[async_trait]
pub trait PromptLookup: Send + Sync {
    async fn find_prompt(&self, id: Uuid) -> Result<Option<Prompt>>;
}

#[async_trait]
impl PromptLookup for PromptService {
    async fn find_prompt(&self, id: Uuid) -> Result<Option<Prompt>> {
        self.find_optional(id).await
    }
}

pub struct ReportService {
    pool: PgPool,
    prompts: Arc<dyn PromptLookup>,
    llm: Arc<dyn ChatCompletionProvider>,
}

impl ReportService {
    pub fn new(
        pool: PgPool,
        prompts: Arc<dyn PromptLookup>,
        llm: Arc<dyn ChatCompletionProvider>,
    ) -> Self {
        Self { pool, prompts, llm }
    }

    /// A referenced prompt must be readable by the caller. Missing and
    /// unreadable ids give the same 404.
    async fn ensure_prompt_attachable(&self, user: &AuthenticatedUser, id: Uuid) -> Result<()> {
        match self.prompts.find_prompt(id).await? {
            Some(prompt) => policy::ensure_readable(user, &prompt),
            None => Err(AppError::NotFound(format!("Prompt with id {} not found", id))),
        }
    }

    async fn find(&self, id: Uuid) -> Result<Report> {
        let query = format!("SELECT {} FROM reports WHERE id = $1", REPORT_COLUMNS);
        sqlx::query_as::<_, Report>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound(format!("Report with id {} not found", id)))
    }

    pub async fn get(&self, user: &AuthenticatedUser, id: Uuid) -> Result<Report> {
        let report = self.find(id).await?;
        ensure_report_access(user, &report)?;
        Ok(report)
    }

    /// The caller's reports only, admins included
    pub async fn list(
        &self,
        user: &AuthenticatedUser,
        params: &ReportQueryParams,
    ) -> Result<(Vec<ReportResponseDto>, i64)> {
        let search = contains_pattern(params.search.as_deref());
        let specialty = non_blank(params.specialty.as_deref());

        let where_clause = r#"
            WHERE user_id = $1
              AND ($2::text IS NULL OR title ILIKE $2 OR findings ILIKE $2 OR content ILIKE $2)
              AND ($3::text IS NULL OR specialty = $3)
        "#;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM reports {}", where_clause))
                .bind(user.user_id)
                .bind(&search)
                .bind(specialty)
                .fetch_one(&self.pool)
                .await
                .map_err(AppError::Database)?;

        // order_by() only emits whitelisted column names
        let query = format!(
            "SELECT {} FROM reports {} ORDER BY {} LIMIT $4 OFFSET $5",
            REPORT_COLUMNS,
            where_clause,
            params.order_by()
        );
        let reports = sqlx::query_as::<_, Report>(&query)
            .bind(user.user_id)
            .bind(&search)
            .bind(specialty)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok((
            reports.into_iter().map(ReportResponseDto::from).collect(),
            total,
        ))
    }

    pub async fn insert(&self, data: NewReport) -> Result<Report> {
        let query = format!(
            r#"
            INSERT INTO reports (title, findings, content, specialty, prompt_id, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            REPORT_COLUMNS
        );
        let report = sqlx::query_as::<_, Report>(&query)
            .bind(data.title.trim())
            .bind(&data.findings)
            .bind(&data.content)
            .bind(&data.specialty)
            .bind(data.prompt_id)
            .bind(data.user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(handle_db_error)?;

        tracing::info!("Report {} saved for user {}", report.id, report.user_id);
        Ok(report)
    }

    pub async fn create(&self, user: &AuthenticatedUser, dto: CreateReportDto) -> Result<Report> {
        if let Some(prompt_id) = dto.prompt_id {
            self.ensure_prompt_attachable(user, prompt_id).await?;
        }

        self.insert(NewReport {
            title: dto.title,
            findings: dto.findings,
            content: dto.content,
            specialty: dto.specialty,
            prompt_id: dto.prompt_id,
            user_id: user.user_id,
        })
        .await
    }

    pub async fn update(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        dto: UpdateReportDto,
    ) -> Result<Report> {
        let existing = self.find(id).await?;
        ensure_report_access(user, &existing)?;

        let query = format!(
            r#"
            UPDATE reports
            SET title = COALESCE($1, title),
                findings = COALESCE($2, findings),
                content = COALESCE($3, content),
                specialty = COALESCE($4, specialty),
                updated_at = NOW()
            WHERE id = $5
            RETURNING {}
            "#,
            REPORT_COLUMNS
        );
        let report = sqlx::query_as::<_, Report>(&query)
            .bind(dto.title.as_deref().map(str::trim))
            .bind(&dto.findings)
            .bind(&dto.content)
            .bind(&dto.specialty)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound(format!("Report with id {} not found", id)))?;

        tracing::info!("Report {} updated by {}", id, user.user_id);
        Ok(report)
    }

    pub async fn delete(&self, user: &AuthenticatedUser, id: Uuid) -> Result<()> {
        let existing = self.find(id).await?;
        ensure_report_access(user, &existing)?;

        sqlx::query("DELETE FROM reports WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        tracing::info!("Report {} deleted by {}", id, user.user_id);
        Ok(())
    }

    /// Ask the LLM for a rewritten body. Empty output is an upstream failure.
    async fn refined_content(&self, report: &Report, instruction: &str) -> Result<String> {
        let ctx = PromptContext::new(&report.specialty);
        let (system, user_message) =
            render_refine_messages(&ctx, &report.findings, &report.content, instruction.trim())?;

        tracing::debug!("Refining report {}", report.id);
        let refined = self
            .llm
            .complete(vec![
                ChatMessage::system(system),
                ChatMessage::user(user_message),
            ])
            .await?;

        let refined = refined.trim();
        if refined.is_empty() {
            return Err(AppError::ExternalServiceError(
                "LLM API returned an empty report".to_string(),
            ));
        }
        Ok(refined.to_string())
    }

    /// Rewrite the report body following `instruction`, then store it
    pub async fn refine(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        instruction: &str,
    ) -> Result<Report> {
        let existing = self.get(user, id).await?;
        let content = self.refined_content(&existing, instruction).await?;

        self.update(
            user,
            id,
            UpdateReportDto {
                title: None,
                findings: None,
                content: Some(content),
                specialty: None,
            },
        )
        .await
    }
}
