use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::{AppPath, AppQuery, ValidatedJson};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::reports::dtos::{
    CreateReportDto, ExportQueryParams, RefineReportDto, ReportQueryParams, ReportResponseDto,
    UpdateReportDto,
};
use crate::features::reports::services::{export, ReportService};
use crate::shared::types::{ApiResponse, Meta};

/// List the caller's reports
#[utoipa::path(
    get,
    path = "/api/reports",
    params(ReportQueryParams),
    responses(
        (status = 200, description = "Reports retrieved successfully", body = ApiResponse<Vec<ReportResponseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "reports",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_reports(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    AppQuery(params): AppQuery<ReportQueryParams>,
) -> Result<Json<ApiResponse<Vec<ReportResponseDto>>>> {
    let (reports, total) = service.list(&user, &params).await?;
    Ok(Json(ApiResponse::success(
        Some(reports),
        None,
        Some(Meta { total }),
    )))
}

/// Save a report
#[utoipa::path(
    post,
    path = "/api/reports",
    request_body = CreateReportDto,
    responses(
        (status = 201, description = "Report created successfully", body = ApiResponse<ReportResponseDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "reports",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_report(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    ValidatedJson(dto): ValidatedJson<CreateReportDto>,
) -> Result<(StatusCode, Json<ApiResponse<ReportResponseDto>>)> {
    let report = service.create(&user, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(report.into()), None, None)),
    ))
}

/// Get a report by ID
#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Report retrieved successfully", body = ApiResponse<ReportResponseDto>),
        (status = 404, description = "Report not found")
    ),
    tag = "reports",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_report(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    let report = service.get(&user, id).await?;
    Ok(Json(ApiResponse::success(Some(report.into()), None, None)))
}

/// Update a report
#[utoipa::path(
    put,
    path = "/api/reports/{id}",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    request_body = UpdateReportDto,
    responses(
        (status = 200, description = "Report updated successfully", body = ApiResponse<ReportResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Report not found")
    ),
    tag = "reports",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_report(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateReportDto>,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    let report = service.update(&user, id, dto).await?;
    Ok(Json(ApiResponse::success(Some(report.into()), None, None)))
}

/// Delete a report
#[utoipa::path(
    delete,
    path = "/api/reports/{id}",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Report deleted successfully"),
        (status = 404, description = "Report not found")
    ),
    tag = "reports",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_report(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(&user, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Report deleted successfully".to_string()),
        None,
    )))
}

/// Export a report as markdown, plain text or HTML
#[utoipa::path(
    get,
    path = "/api/reports/{id}/export",
    params(
        ("id" = Uuid, Path, description = "Report ID"),
        ExportQueryParams
    ),
    responses(
        (status = 200, description = "Rendered report", content_type = "text/plain", body = String),
        (status = 404, description = "Report not found")
    ),
    tag = "reports",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn export_report(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    AppPath(id): AppPath<Uuid>,
    AppQuery(params): AppQuery<ExportQueryParams>,
) -> Result<Response> {
    let report = service.get(&user, id).await?;
    let body = export::render(&report, params.format);

    Ok((
        [(header::CONTENT_TYPE, params.format.content_type())],
        body,
    )
        .into_response())
}

/// Rewrite a report's content with the LLM following an instruction
#[utoipa::path(
    post,
    path = "/api/reports/{id}/refine",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    request_body = RefineReportDto,
    responses(
        (status = 200, description = "Report refined", body = ApiResponse<ReportResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Report not found"),
        (status = 429, description = "LLM provider rate limit"),
        (status = 502, description = "LLM provider error")
    ),
    tag = "reports",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn refine_report(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(dto): ValidatedJson<RefineReportDto>,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    let report = service.refine(&user, id, &dto.instruction).await?;
    Ok(Json(ApiResponse::success(Some(report.into()), None, None)))
}
