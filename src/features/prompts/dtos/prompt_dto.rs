use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::prompts::models::Prompt;
use crate::shared::constants::MAX_PROMPT_CONTENT_CHARS;
use crate::shared::types::{default_page, default_page_size, page_window};
use crate::shared::validation::{validate_not_blank, validate_specialty};

/// Which prompts a listing covers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PromptScope {
    /// System prompts plus the caller's own
    #[default]
    All,
    System,
    Mine,
}

impl PromptScope {
    /// Extra filter; `$1` is the caller's user id
    pub fn as_sql(&self) -> &'static str {
        match self {
            PromptScope::All => "TRUE",
            PromptScope::System => "is_system",
            PromptScope::Mine => "user_id = $1",
        }
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct PromptQueryParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,

    /// Items per page
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,

    /// Filter by specialty key
    pub specialty: Option<String>,

    /// Search in title or content
    pub search: Option<String>,

    #[serde(default)]
    pub scope: PromptScope,
}

impl PromptQueryParams {
    pub fn offset(&self) -> i64 {
        page_window(self.page, self.page_size).1
    }

    pub fn limit(&self) -> i64 {
        page_window(self.page, self.page_size).0
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePromptDto {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: String,

    /// System prompt text; may use `{{ specialty }}`, `{{ specialty_name }}` and `{{ date }}`
    #[validate(
        length(min = 1, max = MAX_PROMPT_CONTENT_CHARS),
        custom(function = "validate_not_blank")
    )]
    pub content: String,

    #[validate(custom(function = "validate_specialty"))]
    pub specialty: String,

    #[serde(default)]
    pub is_default: bool,

    /// Admin only
    #[serde(default)]
    pub is_system: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePromptDto {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: Option<String>,

    #[validate(
        length(min = 1, max = MAX_PROMPT_CONTENT_CHARS),
        custom(function = "validate_not_blank")
    )]
    pub content: Option<String>,

    #[validate(custom(function = "validate_specialty"))]
    pub specialty: Option<String>,

    pub is_default: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PromptResponseDto {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub specialty: String,
    pub is_system: bool,
    pub is_default: bool,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Prompt> for PromptResponseDto {
    fn from(p: Prompt) -> Self {
        Self {
            id: p.id,
            title: p.title,
            content: p.content,
            specialty: p.specialty,
            is_system: p.is_system,
            is_default: p.is_default,
            user_id: p.user_id,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_dto(specialty: &str, content: &str) -> CreatePromptDto {
        CreatePromptDto {
            title: "Chest X-ray".to_string(),
            content: content.to_string(),
            specialty: specialty.to_string(),
            is_default: false,
            is_system: false,
        }
    }

    #[test]
    fn test_create_dto_valid() {
        assert!(create_dto("radiology", "You are a radiologist.").validate().is_ok());
    }

    #[test]
    fn test_create_dto_unknown_specialty() {
        let errors = create_dto("astrology", "text").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("specialty"));
    }

    #[test]
    fn test_create_dto_blank_content() {
        let errors = create_dto("radiology", "   ").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("content"));
    }

    #[test]
    fn test_update_dto_skips_absent_fields() {
        let dto = UpdatePromptDto {
            title: None,
            content: None,
            specialty: Some("cardiology".to_string()),
            is_default: Some(true),
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_query_scope_parses_lowercase() {
        let params: PromptQueryParams =
            serde_json::from_value(serde_json::json!({"scope": "mine"})).unwrap();
        assert_eq!(params.scope, PromptScope::Mine);
        assert_eq!(params.page, 1);
        assert_eq!(params.limit(), 10);
    }
}
