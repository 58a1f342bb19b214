use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::auth::model::UserRole;
use crate::features::users::models::User;
use crate::shared::types::{default_page, default_page_size, page_window};
use crate::shared::validation::validate_not_blank;

/// Public view of an account
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponseDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponseDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct UserQueryParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,

    /// Items per page
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,

    /// Case-insensitive search in name or email
    pub search: Option<String>,
}

impl UserQueryParams {
    pub fn offset(&self) -> i64 {
        page_window(self.page, self.page_size).1
    }

    pub fn limit(&self) -> i64 {
        page_window(self.page, self.page_size).0
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileDto {
    #[validate(
        length(min = 1, max = 100, message = "Name must be 1-100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRoleDto {
    pub role: UserRole,
}
