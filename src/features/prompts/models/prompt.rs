use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Specialty-keyed system prompt template.
///
/// System prompts have no owner; user prompts belong to `user_id`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Prompt {
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
