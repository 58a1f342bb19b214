use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::{AppPath, AppQuery, ValidatedJson};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::prompts::dtos::{
    CreatePromptDto, PromptQueryParams, PromptResponseDto, UpdatePromptDto,
};
use crate::features::prompts::services::PromptService;
use crate::shared::types::{ApiResponse, Meta};

/// Create a prompt template (system prompts: admin only)
#[utoipa::path(
    post,
    path = "/api/prompts",
    request_body = CreatePromptDto,
    responses(
        (status = 201, description = "Prompt created successfully", body = ApiResponse<PromptResponseDto>),
        (status = 400, description = "Validation error or invalid template"),
        (status = 403, description = "System prompts are admin only"),
        (status = 409, description = "Concurrent default prompt conflict")
    ),
    tag = "prompts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_prompt(
    user: AuthenticatedUser,
    State(service): State<Arc<PromptService>>,
    ValidatedJson(dto): ValidatedJson<CreatePromptDto>,
) -> Result<(StatusCode, Json<ApiResponse<PromptResponseDto>>)> {
    let prompt = service.create(&user, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(prompt.into()), None, None)),
    ))
}

/// Get a prompt by ID
#[utoipa::path(
    get,
    path = "/api/prompts/{id}",
    params(
        ("id" = Uuid, Path, description = "Prompt ID")
    ),
    responses(
        (status = 200, description = "Prompt retrieved successfully", body = ApiResponse<PromptResponseDto>),
        (status = 404, description = "Prompt not found")
    ),
    tag = "prompts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_prompt(
    user: AuthenticatedUser,
    State(service): State<Arc<PromptService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<PromptResponseDto>>> {
    let prompt = service.get(&user, id).await?;
    Ok(Json(ApiResponse::success(Some(prompt.into()), None, None)))
}

/// List system prompts and the caller's own prompts
#[utoipa::path(
    get,
    path = "/api/prompts",
    params(PromptQueryParams),
    responses(
        (status = 200, description = "Prompts retrieved successfully", body = ApiResponse<Vec<PromptResponseDto>>)
    ),
    tag = "prompts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_prompts(
    user: AuthenticatedUser,
    State(service): State<Arc<PromptService>>,
    AppQuery(params): AppQuery<PromptQueryParams>,
) -> Result<Json<ApiResponse<Vec<PromptResponseDto>>>> {
    let (prompts, total) = service.list(&user, &params).await?;
    Ok(Json(ApiResponse::success(
        Some(prompts),
        None,
        Some(Meta { total }),
    )))
}

/// Update a prompt
#[utoipa::path(
    put,
    path = "/api/prompts/{id}",
    params(
        ("id" = Uuid, Path, description = "Prompt ID")
    ),
    request_body = UpdatePromptDto,
    responses(
        (status = 200, description = "Prompt updated successfully", body = ApiResponse<PromptResponseDto>),
        (status = 400, description = "Validation error or invalid template"),
        (status = 403, description = "System prompts are admin only"),
        (status = 404, description = "Prompt not found")
    ),
    tag = "prompts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_prompt(
    user: AuthenticatedUser,
    State(service): State<Arc<PromptService>>,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdatePromptDto>,
) -> Result<Json<ApiResponse<PromptResponseDto>>> {
    let prompt = service.update(&user, id, dto).await?;
    Ok(Json(ApiResponse::success(Some(prompt.into()), None, None)))
}

/// Delete a prompt. Reports created from it are kept.
#[utoipa::path(
    delete,
    path = "/api/prompts/{id}",
    params(
        ("id" = Uuid, Path, description = "Prompt ID")
    ),
    responses(
        (status = 200, description = "Prompt deleted successfully"),
        (status = 403, description = "System prompts are admin only"),
        (status = 404, description = "Prompt not found")
    ),
    tag = "prompts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_prompt(
    user: AuthenticatedUser,
    State(service): State<Arc<PromptService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(&user, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Prompt deleted successfully".to_string()),
        None,
    )))
}
