use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::shared::prompts::TemplateError;
use crate::shared::types::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// Upstream provider throttled us; the message is shown to the user as-is
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
            AppError::RateLimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Message safe to show to the client. Database and internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Database(_) => "Database error occurred".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::Conflict(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::ExternalServiceError(msg)
            | AppError::RateLimitExceeded(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(e) => tracing::error!("Database error: {:?}", e),
            AppError::Internal(msg) => tracing::error!("Internal error: {}", msg),
            AppError::ExternalServiceError(msg) => {
                tracing::error!("External service error: {}", msg)
            }
            AppError::RateLimitExceeded(msg) => tracing::warn!("Upstream rate limit: {}", msg),
            _ => {}
        }

        let message = self.public_message();
        let errors = match &self {
            AppError::Validation(msg) => Some(vec![msg.clone()]),
            _ => None,
        };

        let body = Json(ApiResponse::<()>::error(Some(message), errors));

        (self.status_code(), body).into_response()
    }
}

impl From<TemplateError> for AppError {
    fn from(e: TemplateError) -> Self {
        match e {
            TemplateError::Syntax(msg) => AppError::Validation(format!("Invalid template: {}", msg)),
            TemplateError::RenderError(msg) => {
                AppError::BadRequest(format!("Prompt template failed to render: {}", msg))
            }
            TemplateError::NotFound(name) => {
                AppError::Internal(format!("Template '{}' not found", name))
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_rate_limit_message_is_verbatim() {
        let msg = "Rate limit reached for gpt-4o in organization org-x on tokens per min";
        let response = AppError::RateLimitExceeded(msg.to_string()).into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], msg);
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response = AppError::Internal("secret stack trace".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_validation_error_fills_errors() {
        let response = AppError::Validation("findings: too long".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["errors"][0], "findings: too long");
    }

    #[test]
    fn test_template_syntax_is_validation_error() {
        let err: AppError = TemplateError::Syntax("unexpected end".to_string()).into();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::PayloadTooLarge(String::new()).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            AppError::ExternalServiceError(String::new()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Forbidden(String::new()).status_code(),
            StatusCode::FORBIDDEN
        );
    }
}
