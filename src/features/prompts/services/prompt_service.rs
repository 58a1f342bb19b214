use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::core::database::{constraint_violation, ConstraintViolation};
use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::prompts::dtos::{
    CreatePromptDto, PromptQueryParams, PromptResponseDto, UpdatePromptDto,
};
use crate::features::prompts::models::Prompt;
use crate::features::prompts::services::policy;
use crate::shared::prompts::check_syntax;
use crate::shared::types::{contains_pattern, non_blank};

const PROMPT_COLUMNS: &str =
    "id, title, content, specialty, is_system, is_default, user_id, created_at, updated_at";

/// Convert database error to more specific AppError with user-friendly messages
fn handle_db_error(e: sqlx::Error) -> AppError {
    match constraint_violation(&e) {
        Some(ConstraintViolation::Unique(_)) => AppError::Conflict(
            "Another default prompt already exists for this specialty".to_string(),
        ),
        Some(ConstraintViolation::ForeignKey(_)) => {
            AppError::BadRequest("Referenced record does not exist".to_string())
        }
        None => AppError::Database(e),
    }
}

/// Validate that a template can be compiled by minijinja
fn validate_template_compilation(content: &str) -> Result<()> {
    check_syntax(content)?;
    Ok(())
}

/// An explicitly chosen prompt must target the requested specialty
pub fn check_prompt_specialty(prompt: &Prompt, specialty: &str) -> Result<()> {
    if prompt.specialty != specialty {
        return Err(AppError::BadRequest(format!(
            "Prompt '{}' is for specialty '{}', not '{}'",
            prompt.title, prompt.specialty, specialty
        )));
    }
    Ok(())
}

/// Clear the current default in one scope (system when `owner` is `None`)
async fn clear_defaults(
    conn: &mut PgConnection,
    owner: Option<Uuid>,
    specialty: &str,
    keep: Option<Uuid>,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE prompts
        SET is_default = FALSE, updated_at = NOW()
        WHERE is_default
          AND specialty = $1
          AND user_id IS NOT DISTINCT FROM $2
          AND ($3::uuid IS NULL OR id <> $3)
        "#,
    )
    .bind(specialty)
    .bind(owner)
    .bind(keep)
    .execute(conn)
    .await
    .map_err(AppError::Database)?;

    Ok(result.rows_affected())
}

/// The caller's default, else the system default, else the most recently
/// updated system prompt. Prompts outside those tiers are never picked.
pub fn pick_generation_prompt(user_id: Uuid, candidates: Vec<Prompt>) -> Option<Prompt> {
    let tier = |p: &Prompt| {
        if p.user_id == Some(user_id) && p.is_default {
            Some(0)
        } else if p.is_system && p.is_default {
            Some(1)
        } else if p.is_system {
            Some(2)
        } else {
            None
        }
    };

    candidates
        .into_iter()
        .filter_map(|p| tier(&p).map(|t| (t, p)))
        .min_by(|(ta, a), (tb, b)| ta.cmp(tb).then_with(|| b.updated_at.cmp(&a.updated_at)))
        .map(|(_, p)| p)
}

pub struct PromptService {
    pool: PgPool,
}

impl std::fmt::Debug for PromptService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptService")
            .field("pool", &"<PgPool>")
            .finish()
    }
}

impl PromptService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Any prompt by id, without access checks
    pub async fn find_optional(&self, id: Uuid) -> Result<Option<Prompt>> {
        let query = format!("SELECT {} FROM prompts WHERE id = $1", PROMPT_COLUMNS);
        sqlx::query_as::<_, Prompt>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find(&self, id: Uuid) -> Result<Prompt> {
        self.find_optional(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Prompt with id {} not found", id)))
    }

    /// Get a prompt the caller may read
    pub async fn get(&self, user: &AuthenticatedUser, id: Uuid) -> Result<Prompt> {
        let prompt = self.find(id).await?;
        policy::ensure_readable(user, &prompt)?;
        Ok(prompt)
    }

    /// System prompts plus the caller's own, defaults first
    pub async fn list(
        &self,
        user: &AuthenticatedUser,
        params: &PromptQueryParams,
    ) -> Result<(Vec<PromptResponseDto>, i64)> {
        let specialty = non_blank(params.specialty.as_deref());
        let search = contains_pattern(params.search.as_deref());

        let where_clause = format!(
            r#"
            WHERE (is_system OR user_id = $1)
              AND ($2::text IS NULL OR specialty = $2)
              AND ($3::text IS NULL OR title ILIKE $3 OR content ILIKE $3)
              AND {}
            "#,
            params.scope.as_sql()
        );

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM prompts {}", where_clause))
                .bind(user.user_id)
                .bind(specialty)
                .bind(&search)
                .fetch_one(&self.pool)
                .await
                .map_err(AppError::Database)?;

        let query = format!(
            "SELECT {} FROM prompts {} ORDER BY is_default DESC, title ASC, id ASC LIMIT $4 OFFSET $5",
            PROMPT_COLUMNS, where_clause
        );
        let prompts = sqlx::query_as::<_, Prompt>(&query)
            .bind(user.user_id)
            .bind(specialty)
            .bind(&search)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok((
            prompts.into_iter().map(PromptResponseDto::from).collect(),
            total,
        ))
    }

    /// Create a prompt. System prompts are admin-only and have no owner.
    pub async fn create(&self, user: &AuthenticatedUser, dto: CreatePromptDto) -> Result<Prompt> {
        policy::ensure_can_create(user, dto.is_system)?;
        validate_template_compilation(&dto.content)?;

        let owner = (!dto.is_system).then_some(user.user_id);
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        if dto.is_default {
            clear_defaults(&mut tx, owner, &dto.specialty, None).await?;
        }

        let query = format!(
            r#"
            INSERT INTO prompts (title, content, specialty, is_system, is_default, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            PROMPT_COLUMNS
        );
        let prompt = sqlx::query_as::<_, Prompt>(&query)
            .bind(dto.title.trim())
            .bind(&dto.content)
            .bind(&dto.specialty)
            .bind(dto.is_system)
            .bind(dto.is_default)
            .bind(owner)
            .fetch_one(&mut *tx)
            .await
            .map_err(handle_db_error)?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            "Prompt {} created by {} (system: {}, default: {})",
            prompt.id,
            user.user_id,
            prompt.is_system,
            prompt.is_default
        );
        Ok(prompt)
    }

    pub async fn update(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        dto: UpdatePromptDto,
    ) -> Result<Prompt> {
        if let Some(ref content) = dto.content {
            validate_template_compilation(content)?;
        }

        let existing = self.find(id).await?;
        policy::ensure_modifiable(user, &existing)?;

        let specialty = dto.specialty.as_deref().unwrap_or(&existing.specialty);
        let becomes_default = dto.is_default.unwrap_or(existing.is_default);

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        if becomes_default {
            clear_defaults(&mut tx, existing.user_id, specialty, Some(id)).await?;
        }

        let query = format!(
            r#"
            UPDATE prompts
            SET title = COALESCE($1, title),
                content = COALESCE($2, content),
                specialty = COALESCE($3, specialty),
                is_default = COALESCE($4, is_default),
                updated_at = NOW()
            WHERE id = $5
            RETURNING {}
            "#,
            PROMPT_COLUMNS
        );
        let prompt = sqlx::query_as::<_, Prompt>(&query)
            .bind(dto.title.as_deref().map(str::trim))
            .bind(&dto.content)
            .bind(&dto.specialty)
            .bind(dto.is_default)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(handle_db_error)?
            .ok_or_else(|| AppError::NotFound(format!("Prompt with id {} not found", id)))?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!("Prompt {} updated by {}", id, user.user_id);
        Ok(prompt)
    }

    /// Hard delete. Reports generated from it keep their content.
    pub async fn delete(&self, user: &AuthenticatedUser, id: Uuid) -> Result<()> {
        let existing = self.find(id).await?;
        policy::ensure_modifiable(user, &existing)?;

        let result = sqlx::query("DELETE FROM prompts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Prompt with id {} not found",
                id
            )));
        }

        tracing::info!("Prompt {} deleted by {}", id, user.user_id);
        Ok(())
    }

    /// Pick the prompt for a generation request.
    ///
    /// Explicit id first, then the caller's default, the system default and the
    /// latest system prompt for the specialty. `None` means use the built-in template.
    pub async fn resolve_for_generation(
        &self,
        user: &AuthenticatedUser,
        specialty: &str,
        prompt_id: Option<Uuid>,
    ) -> Result<Option<Prompt>> {
        if let Some(id) = prompt_id {
            let prompt = self.get(user, id).await?;
            check_prompt_specialty(&prompt, specialty)?;
            return Ok(Some(prompt));
        }

        let query = format!(
            r#"
            SELECT {}
            FROM prompts
            WHERE specialty = $1
              AND ((user_id = $2 AND is_default) OR is_system)
            "#,
            PROMPT_COLUMNS
        );

        let candidates = sqlx::query_as::<_, Prompt>(&query)
            .bind(specialty)
            .bind(user.user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        let prompt = pick_generation_prompt(user.user_id, candidates);
        match &prompt {
            Some(p) => tracing::debug!("Resolved prompt {} for {}", p.id, specialty),
            None => tracing::debug!("No stored prompt for {}, using built-in", specialty),
        }
        Ok(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::model::UserRole;
    use crate::shared::test_helpers::{admin_user, insert_user, lazy_pool, regular_user};
    use chrono::{Duration, Utc};

    fn stored(user_id: Option<Uuid>, is_default: bool, age_minutes: i64) -> Prompt {
        let at = Utc::now() - Duration::minutes(age_minutes);
        Prompt {
            id: Uuid::new_v4(),
            title: "Stored".to_string(),
            content: "You write reports.".to_string(),
            specialty: "radiology".to_string(),
            is_system: user_id.is_none(),
            is_default,
            user_id,
            created_at: at,
            updated_at: at,
        }
    }

    fn create_dto(is_system: bool, content: &str) -> CreatePromptDto {
        CreatePromptDto {
            title: "MRI brain".to_string(),
            content: content.to_string(),
            specialty: "neurology".to_string(),
            is_default: true,
            is_system,
        }
    }

    #[tokio::test]
    async fn test_non_admin_cannot_create_system_prompt() {
        let service = PromptService::new(lazy_pool());
        let result = service
            .create(&regular_user(), create_dto(true, "ok"))
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_broken_template() {
        let service = PromptService::new(lazy_pool());
        let result = service
            .create(&regular_user(), create_dto(false, "{% for x in %}"))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_rejects_broken_template_before_lookup() {
        let service = PromptService::new(lazy_pool());
        let dto = UpdatePromptDto {
            title: None,
            content: Some("{{ unclosed".to_string()),
            specialty: None,
            is_default: None,
        };
        let result = service.update(&regular_user(), Uuid::new_v4(), dto).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_check_prompt_specialty() {
        let prompt = Prompt {
            id: Uuid::new_v4(),
            title: "Echo".to_string(),
            content: "c".to_string(),
            specialty: "cardiology".to_string(),
            is_system: true,
            is_default: true,
            user_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(check_prompt_specialty(&prompt, "cardiology").is_ok());
        assert!(matches!(
            check_prompt_specialty(&prompt, "radiology"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_pick_prefers_user_default_then_system_default() {
        let me = regular_user().user_id;
        let latest_system = stored(None, false, 0);
        let system_default = stored(None, true, 30);
        let my_default = stored(Some(me), true, 60);

        let picked = pick_generation_prompt(
            me,
            vec![latest_system.clone(), system_default.clone(), my_default.clone()],
        );
        assert_eq!(picked.map(|p| p.id), Some(my_default.id));

        let picked = pick_generation_prompt(me, vec![latest_system, system_default.clone()]);
        assert_eq!(picked.map(|p| p.id), Some(system_default.id));
    }

    #[test]
    fn test_pick_falls_back_to_latest_system_prompt() {
        let me = regular_user().user_id;
        let older = stored(None, false, 90);
        let newer = stored(None, false, 5);
        let picked = pick_generation_prompt(me, vec![older, newer.clone()]);
        assert_eq!(picked.map(|p| p.id), Some(newer.id));
    }

    #[test]
    fn test_pick_ignores_other_users_and_non_default_own_prompts() {
        let me = regular_user().user_id;
        let someone_elses_default = stored(Some(Uuid::new_v4()), true, 0);
        let my_draft = stored(Some(me), false, 0);
        assert!(pick_generation_prompt(me, vec![someone_elses_default, my_draft]).is_none());
    }

    fn user_prompt(title: &str, is_default: bool) -> CreatePromptDto {
        CreatePromptDto {
            title: title.to_string(),
            content: "You are a neurologist.".to_string(),
            specialty: "neurology".to_string(),
            is_default,
            is_system: false,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn test_new_default_clears_previous_in_same_scope(pool: sqlx::PgPool) {
        let service = PromptService::new(pool.clone());
        let doctor = insert_user(&pool, UserRole::User).await;
        let other = insert_user(&pool, UserRole::User).await;

        let first = service.create(&doctor, user_prompt("First", true)).await.unwrap();
        let theirs = service.create(&other, user_prompt("Theirs", true)).await.unwrap();
        let second = service.create(&doctor, user_prompt("Second", true)).await.unwrap();

        assert!(second.is_default);
        assert!(!service.get(&doctor, first.id).await.unwrap().is_default);
        assert!(service.get(&other, theirs.id).await.unwrap().is_default);

        let promoted = service
            .update(
                &doctor,
                first.id,
                UpdatePromptDto {
                    title: None,
                    content: None,
                    specialty: None,
                    is_default: Some(true),
                },
            )
            .await
            .unwrap();
        assert!(promoted.is_default);
        assert!(!service.get(&doctor, second.id).await.unwrap().is_default);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn test_resolve_order_against_database(pool: sqlx::PgPool) {
        let service = PromptService::new(pool.clone());
        let doctor = insert_user(&pool, UserRole::User).await;
        let admin = insert_user(&pool, UserRole::Admin).await;

        // No stored prompt for the specialty: built-in template
        assert!(service
            .resolve_for_generation(&doctor, "neurology", None)
            .await
            .unwrap()
            .is_none());

        let mut latest = create_dto(true, "Latest system");
        latest.is_default = false;
        let latest = service.create(&admin, latest).await.unwrap();
        let resolved = service.resolve_for_generation(&doctor, "neurology", None).await.unwrap();
        assert_eq!(resolved.map(|p| p.id), Some(latest.id));

        let system_default = service.create(&admin, create_dto(true, "System default")).await.unwrap();
        let resolved = service.resolve_for_generation(&doctor, "neurology", None).await.unwrap();
        assert_eq!(resolved.map(|p| p.id), Some(system_default.id));

        let mine = service.create(&doctor, user_prompt("Mine", true)).await.unwrap();
        let resolved = service.resolve_for_generation(&doctor, "neurology", None).await.unwrap();
        assert_eq!(resolved.map(|p| p.id), Some(mine.id));

        // Another user's default never applies to this caller
        let resolved = service.resolve_for_generation(&admin_user(), "neurology", None).await.unwrap();
        assert_eq!(resolved.map(|p| p.id), Some(system_default.id));
    }
}
