use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub title: String,
    /// Clinician input the report was generated from
    pub findings: String,
    pub content: String,
    pub specialty: String,
    /// NULL once the originating prompt is deleted
    pub prompt_id: Option<Uuid>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload shared by explicit creation and generation
#[derive(Debug, Clone)]
pub struct NewReport {
    pub title: String,
    pub findings: String,
    pub content: String,
    pub specialty: String,
    pub prompt_id: Option<Uuid>,
    pub user_id: Uuid,
}
