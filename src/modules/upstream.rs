//! Error mapping shared by the outbound API clients.

use reqwest::StatusCode;
use serde::Deserialize;

use crate::core::error::AppError;

/// Longest upstream body echoed into an error message
const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Extract `error.message` from an OpenAI-style error body, else the raw text
pub fn upstream_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect(),
    }
}

/// Map a non-2xx upstream response to an [`AppError`].
///
/// 429 keeps the provider's message verbatim so the user sees exactly what
/// limit was hit.
pub fn map_status(service: &str, status: StatusCode, body: &str) -> AppError {
    let message = upstream_message(body);
    if status == StatusCode::TOO_MANY_REQUESTS {
        return AppError::RateLimitExceeded(message);
    }
    AppError::ExternalServiceError(format!("{} returned {}: {}", service, status.as_u16(), message))
}

/// Map a transport-level failure (connect, timeout, body read)
pub fn map_transport(service: &str, err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::ExternalServiceError(format!("{} request timed out", service))
    } else {
        AppError::ExternalServiceError(format!("{} request failed: {}", service, err))
    }
}

/// Read the body of a failed response and map it
pub async fn error_from_response(service: &str, response: reqwest::Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    tracing::error!("{} returned {}: {}", service, status, body);
    map_status(service, status, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_keeps_provider_message() {
        let body = r#"{"error":{"message":"Rate limit reached for requests","type":"requests"}}"#;
        match map_status("LLM API", StatusCode::TOO_MANY_REQUESTS, body) {
            AppError::RateLimitExceeded(msg) => assert_eq!(msg, "Rate limit reached for requests"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_other_status_is_external_error() {
        match map_status("LLM API", StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") {
            AppError::ExternalServiceError(msg) => {
                assert_eq!(msg, "LLM API returned 500: upstream exploded")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_long_plain_body_is_truncated() {
        let body = "x".repeat(2000);
        assert_eq!(upstream_message(&body).len(), MAX_ERROR_BODY_CHARS);
    }
}
