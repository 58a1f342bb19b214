use axum::{
    extract::State,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::{AppJson, AppPath, AppQuery, ValidatedJson};
use crate::features::auth::guards::RequireAdmin;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::users::dtos::{
    UpdateProfileDto, UpdateUserRoleDto, UserQueryParams, UserResponseDto,
};
use crate::features::users::services::UserService;
use crate::shared::types::{ApiResponse, Meta};

/// Update the current user's display name
#[utoipa::path(
    patch,
    path = "/api/users/me",
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn update_me(
    user: AuthenticatedUser,
    State(service): State<Arc<UserService>>,
    ValidatedJson(dto): ValidatedJson<UpdateProfileDto>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let updated = service.update_name(user.user_id, &dto.name).await?;
    Ok(Json(ApiResponse::success(Some(updated.into()), None, None)))
}

/// List users (admin only)
#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(UserQueryParams),
    responses(
        (status = 200, description = "Users retrieved", body = ApiResponse<Vec<UserResponseDto>>),
        (status = 403, description = "Forbidden - admin only")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<UserService>>,
    AppQuery(params): AppQuery<UserQueryParams>,
) -> Result<Json<ApiResponse<Vec<UserResponseDto>>>> {
    let (users, total) = service.list(&params).await?;
    Ok(Json(ApiResponse::success(
        Some(users),
        None,
        Some(Meta { total }),
    )))
}

/// Change a user's role (admin only)
#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRoleDto,
    responses(
        (status = 200, description = "Role updated", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Admins cannot demote themselves"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "User not found")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn update_user_role(
    RequireAdmin(admin): RequireAdmin,
    State(service): State<Arc<UserService>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(dto): AppJson<UpdateUserRoleDto>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let updated = service.update_role(admin.user_id, id, dto.role).await?;
    Ok(Json(ApiResponse::success(Some(updated.into()), None, None)))
}
