use crate::core::error::AppError;
use crate::features::auth::JwtValidator;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::prelude::*;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// MakeSpan that tags every request span with its request id
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

/// Wildcard origins get no credentials. An explicit origin list allows the
/// session cookie, which needs concrete method and header lists.
pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    if allowed_origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-request-id"),
        ])
        .allow_credentials(true)
}

pub fn basic_auth_middleware(
    valid_credentials: Arc<String>,
) -> impl Fn(
    Request,
    Next,
)
    -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, Response>> + Send>>
       + Clone {
    move |req: Request, next: Next| {
        let credentials = valid_credentials.clone();
        Box::pin(async move {
            let authorized = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Basic "))
                .and_then(|encoded| BASE64_STANDARD.decode(encoded).ok())
                .and_then(|decoded| String::from_utf8(decoded).ok())
                .is_some_and(|creds| creds == *credentials);

            if authorized {
                return Ok(next.run(req).await);
            }

            Err((
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"Swagger UI\"")],
                "Unauthorized",
            )
                .into_response())
        })
    }
}

/// Pull the session token from `Authorization: Bearer` or, failing that, the session cookie.
pub fn extract_session_token<'a>(
    headers: &'a HeaderMap,
    cookie_name: &str,
) -> Result<Option<&'a str>, AppError> {
    if let Some(auth_header) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Unauthorized("Invalid authorization header format".to_string())
        })?;
        return Ok(Some(token.trim()));
    }

    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty());

    Ok(from_cookie)
}

pub async fn auth_middleware(
    State(validator): State<Arc<JwtValidator>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_session_token(req.headers(), validator.cookie_name())?
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    let user = validator.validate_token(token)?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::model::{AuthenticatedUser, UserRole};
    use crate::shared::test_helpers::{test_auth_config, test_token_service};
    use axum::{routing::get, Json, Router};
    use axum_test::TestServer;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_extract_bearer_token() {
        let h = headers(&[(header::AUTHORIZATION, "Bearer abc.def.ghi")]);
        assert_eq!(
            extract_session_token(&h, "medreport_session").unwrap(),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn test_extract_cookie_token_among_others() {
        let h = headers(&[(
            header::COOKIE,
            "theme=dark; medreport_session=tok123; other=1",
        )]);
        assert_eq!(
            extract_session_token(&h, "medreport_session").unwrap(),
            Some("tok123")
        );
    }

    #[test]
    fn test_bearer_takes_precedence_over_cookie() {
        let h = headers(&[
            (header::AUTHORIZATION, "Bearer from-header"),
            (header::COOKIE, "medreport_session=from-cookie"),
        ]);
        assert_eq!(
            extract_session_token(&h, "medreport_session").unwrap(),
            Some("from-header")
        );
    }

    #[test]
    fn test_non_bearer_scheme_rejected() {
        let h = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")]);
        assert!(extract_session_token(&h, "medreport_session").is_err());
    }

    #[test]
    fn test_empty_cookie_is_missing() {
        let h = headers(&[(header::COOKIE, "medreport_session=")]);
        assert_eq!(extract_session_token(&h, "medreport_session").unwrap(), None);
    }

    async fn whoami(user: AuthenticatedUser) -> Json<serde_json::Value> {
        Json(serde_json::json!({ "email": user.email }))
    }

    fn protected_server() -> TestServer {
        let validator = Arc::new(JwtValidator::new(&test_auth_config()));
        let app = Router::new()
            .route("/whoami", get(whoami))
            .route_layer(axum::middleware::from_fn_with_state(
                validator,
                auth_middleware,
            ));
        TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn test_protected_route_requires_token() {
        let server = protected_server();
        let response = server.get("/whoami").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_protected_route_rejects_garbage_token() {
        let server = protected_server();
        let response = server
            .get("/whoami")
            .authorization_bearer("not-a-jwt")
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_protected_route_accepts_issued_token() {
        let server = protected_server();
        let user = AuthenticatedUser {
            user_id: Uuid::new_v4(),
            email: "doc@example.com".to_string(),
            role: UserRole::User,
        };
        let issued = test_token_service().issue(&user).unwrap();

        let response = server
            .get("/whoami")
            .authorization_bearer(issued.token)
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["email"], "doc@example.com");
    }

    fn cors_server(origins: &[&str]) -> TestServer {
        let app = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(cors_layer(origins.iter().map(|o| o.to_string()).collect()));
        TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn test_cors_explicit_origins_allow_credentials() {
        let server = cors_server(&["https://app.example.com"]);
        let response = server
            .get("/ping")
            .add_header(header::ORIGIN, HeaderValue::from_static("https://app.example.com"))
            .await;
        response.assert_status_ok();
        let h = response.headers();
        assert_eq!(
            h.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://app.example.com"
        );
        assert_eq!(h.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(), "true");
    }

    #[tokio::test]
    async fn test_cors_wildcard_has_no_credentials() {
        let server = cors_server(&["*"]);
        let response = server
            .get("/ping")
            .add_header(header::ORIGIN, HeaderValue::from_static("https://any.example.com"))
            .await;
        let h = response.headers();
        assert_eq!(h.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
        assert!(h.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
    }
}
