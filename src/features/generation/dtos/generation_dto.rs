use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::shared::validation::{validate_not_blank, validate_specialty};

fn default_save() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct GenerateReportDto {
    /// Dictated or typed clinical findings
    #[validate(length(min = 1, max = 20000), custom(function = "validate_not_blank"))]
    pub findings: String,

    #[validate(custom(function = "validate_specialty"))]
    pub specialty: String,

    /// Explicit prompt; otherwise the default for the specialty is used
    pub prompt_id: Option<Uuid>,

    /// Report title; derived from the output when absent
    #[validate(length(max = 200))]
    pub title: Option<String>,

    /// Persist the finished report (default true)
    #[serde(default = "default_save")]
    pub save: bool,
}
