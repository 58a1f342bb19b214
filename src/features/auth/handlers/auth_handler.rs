use crate::core::error::Result;
use crate::core::extractor::ValidatedJson;
use crate::features::auth::dtos::{AuthResponseDto, LoginRequestDto, RegisterRequestDto};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::services::AuthService;
use crate::features::users::dtos::UserResponseDto;
use crate::shared::types::ApiResponse;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    Json,
};
use std::sync::Arc;

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequestDto,
    responses(
        (status = 201, description = "User registered successfully", body = ApiResponse<AuthResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already registered")
    ),
    tag = "auth"
)]
pub async fn register(
    State(service): State<Arc<AuthService>>,
    ValidatedJson(dto): ValidatedJson<RegisterRequestDto>,
) -> Result<Response> {
    let auth_response = service.register(dto).await?;
    let cookie = service.session_cookie(&auth_response.access_token);

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(ApiResponse::success(Some(auth_response), None, None)),
    )
        .into_response())
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequestDto,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(service): State<Arc<AuthService>>,
    ValidatedJson(dto): ValidatedJson<LoginRequestDto>,
) -> Result<Response> {
    let auth_response = service.login(dto).await?;
    let cookie = service.session_cookie(&auth_response.access_token);

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(ApiResponse::success(Some(auth_response), None, None)),
    )
        .into_response())
}

/// Clear the session cookie
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session cookie cleared")
    ),
    tag = "auth"
)]
pub async fn logout(State(service): State<Arc<AuthService>>) -> Response {
    (
        AppendHeaders([(header::SET_COOKIE, service.expired_cookie())]),
        Json(ApiResponse::<()>::success(
            None,
            Some("Signed out".to_string()),
            None,
        )),
    )
        .into_response()
}

/// Get current authenticated user info
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user retrieved successfully", body = ApiResponse<UserResponseDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_me(
    user: AuthenticatedUser,
    State(service): State<Arc<AuthService>>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let user_data = service.get_current_user(&user).await?;
    Ok(Json(ApiResponse::success(Some(user_data), None, None)))
}
