use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::reports::models::Report;
use crate::shared::constants::MAX_REPORT_CONTENT_CHARS;
use crate::shared::types::{default_page, default_page_size, page_window};
use crate::shared::validation::{validate_not_blank, validate_specialty};

// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Desc,
    Asc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportSortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
}

impl ReportSortField {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ReportSortField::CreatedAt => "created_at",
            ReportSortField::UpdatedAt => "updated_at",
            ReportSortField::Title => "LOWER(title)",
        }
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct ReportQueryParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,

    /// Items per page
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,

    /// Search in title, findings or content
    pub search: Option<String>,

    /// Filter by specialty key
    pub specialty: Option<String>,

    /// Sort column (default: created_at)
    #[serde(default)]
    pub sort_by: ReportSortField,

    /// Sort direction (default: desc)
    #[serde(default)]
    pub sort: SortDirection,
}

impl ReportQueryParams {
    pub fn offset(&self) -> i64 {
        page_window(self.page, self.page_size).1
    }

    pub fn limit(&self) -> i64 {
        page_window(self.page, self.page_size).0
    }

    pub fn order_by(&self) -> String {
        format!("{} {}, id {}", self.sort_by.as_sql(), self.sort.as_sql(), self.sort.as_sql())
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReportDto {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: String,

    #[validate(length(max = MAX_REPORT_CONTENT_CHARS))]
    #[serde(default)]
    pub findings: String,

    #[validate(
        length(min = 1, max = MAX_REPORT_CONTENT_CHARS),
        custom(function = "validate_not_blank")
    )]
    pub content: String,

    #[validate(custom(function = "validate_specialty"))]
    pub specialty: String,

    pub prompt_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateReportDto {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: Option<String>,

    #[validate(length(max = MAX_REPORT_CONTENT_CHARS))]
    pub findings: Option<String>,

    #[validate(length(min = 1, max = MAX_REPORT_CONTENT_CHARS))]
    pub content: Option<String>,

    #[validate(custom(function = "validate_specialty"))]
    pub specialty: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefineReportDto {
    /// What to change, e.g. "shorten the impression"
    #[validate(length(min = 1, max = 2000), custom(function = "validate_not_blank"))]
    pub instruction: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Markdown,
    Text,
    Html,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "text/markdown; charset=utf-8",
            ExportFormat::Text => "text/plain; charset=utf-8",
            ExportFormat::Html => "text/html; charset=utf-8",
        }
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct ExportQueryParams {
    /// markdown (default), text or html
    #[serde(default)]
    pub format: ExportFormat,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReportResponseDto {
    pub id: Uuid,
    pub title: String,
    pub findings: String,
    pub content: String,
    pub specialty: String,
    pub prompt_id: Option<Uuid>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Report> for ReportResponseDto {
    fn from(r: Report) -> Self {
        Self {
            id: r.id,
            title: r.title,
            findings: r.findings,
            content: r.content,
            specialty: r.specialty,
            prompt_id: r.prompt_id,
            user_id: r.user_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults() {
        let params: ReportQueryParams = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(params.sort_by, ReportSortField::CreatedAt);
        assert_eq!(params.sort, SortDirection::Desc);
        assert_eq!(params.order_by(), "created_at DESC, id DESC");
    }

    #[test]
    fn test_query_sort_by_title_asc() {
        let params: ReportQueryParams = serde_json::from_value(serde_json::json!({
            "sort_by": "title",
            "sort": "asc",
            "page": 2,
            "page_size": 25
        }))
        .unwrap();
        assert_eq!(params.order_by(), "LOWER(title) ASC, id ASC");
        assert_eq!(params.offset(), 25);
    }

    #[test]
    fn test_unknown_sort_field_rejected() {
        let result: Result<ReportQueryParams, _> =
            serde_json::from_value(serde_json::json!({"sort_by": "user_id; DROP TABLE reports"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_refine_instruction_required() {
        let dto = RefineReportDto {
            instruction: "  ".to_string(),
        };
        assert!(dto.validate().is_err());
    }
}
