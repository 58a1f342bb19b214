//! Request extractors that answer with the `ApiResponse` error envelope.
//!
//! axum's own `Json`, `Query` and `Path` reject with plain-text bodies; the
//! wrappers here route every rejection through [`AppError`] instead.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Request,
    },
    http::{request::Parts, StatusCode},
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;

/// JSON body
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// JSON body that must also pass its `validator` rules
pub struct ValidatedJson<T>(pub T);

/// Query string
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// Path parameters, e.g. a resource UUID
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let AppJson(value) = AppJson::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::PayloadTooLarge("Request body is too large".to_string());
        }
        match rejection {
            JsonRejection::JsonDataError(err) => {
                AppError::BadRequest(format!("Invalid JSON data: {}", err.body_text()))
            }
            JsonRejection::JsonSyntaxError(err) => {
                AppError::BadRequest(format!("Invalid JSON syntax: {}", err.body_text()))
            }
            JsonRejection::MissingJsonContentType(_) => AppError::BadRequest(
                "Expected request with `Content-Type: application/json`".to_string(),
            ),
            other => AppError::BadRequest(format!("Unreadable request body: {}", other.body_text())),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(format!("Invalid query parameters: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(err) => {
                AppError::BadRequest(format!("Invalid path parameter: {}", err.body_text()))
            }
            // Route and handler disagree; not the client's fault
            other => AppError::Internal(other.body_text()),
        }
    }
}

/// One `field: message` entry per failed rule, sorted by field
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut lines: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => format!("{}: {}", field, msg),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();
        lines.sort();
        AppError::Validation(lines.join("; "))
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::DefaultBodyLimit,
        routing::{get, post},
        Json, Router,
    };
    use axum_test::TestServer;
    use serde::Deserialize;
    use serde_json::{json, Value};
    use uuid::Uuid;

    #[derive(Deserialize)]
    #[serde(rename_all = "snake_case")]
    enum Order {
        Asc,
        Desc,
    }

    #[derive(Deserialize)]
    struct Listing {
        order: Order,
    }

    #[derive(Deserialize, Validate)]
    struct Note {
        #[validate(length(min = 3, message = "Too short"))]
        text: String,
    }

    async fn by_id(AppPath(id): AppPath<Uuid>) -> Json<Value> {
        Json(json!({ "id": id }))
    }

    async fn listing(AppQuery(q): AppQuery<Listing>) -> Json<Value> {
        let order = match q.order {
            Order::Asc => "asc",
            Order::Desc => "desc",
        };
        Json(json!({ "order": order }))
    }

    async fn note(ValidatedJson(n): ValidatedJson<Note>) -> Json<Value> {
        Json(json!({ "text": n.text }))
    }

    fn server() -> TestServer {
        let app = Router::new()
            .route("/items/{id}", get(by_id))
            .route("/items", get(listing))
            .route("/notes", post(note))
            .layer(DefaultBodyLimit::max(64));
        TestServer::new(app).unwrap()
    }

    fn assert_envelope(body: &Value, needle: &str) {
        assert_eq!(body["success"], false);
        assert!(body["data"].is_null());
        let message = body["message"].as_str().unwrap();
        assert!(message.contains(needle), "{} should mention {}", message, needle);
    }

    #[tokio::test]
    async fn test_non_uuid_path_uses_envelope() {
        let response = server().get("/items/not-a-uuid").await;
        response.assert_status_bad_request();
        assert_envelope(&response.json(), "Invalid path parameter");

        let id = Uuid::new_v4();
        let ok = server().get(&format!("/items/{}", id)).await;
        ok.assert_status_ok();
    }

    #[tokio::test]
    async fn test_bad_query_value_uses_envelope() {
        let response = server()
            .get("/items")
            .add_query_param("order", "sideways")
            .await;
        response.assert_status_bad_request();
        assert_envelope(&response.json(), "Invalid query parameters");

        let ok = server().get("/items").add_query_param("order", "desc").await;
        ok.assert_status_ok();
        assert_eq!(ok.json::<Value>()["order"], "desc");
    }

    #[tokio::test]
    async fn test_validation_failures_fill_errors() {
        let response = server().post("/notes").json(&json!({ "text": "ab" })).await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"][0], "text: Too short");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let response = server()
            .post("/notes")
            .content_type("application/json")
            .bytes("{\"text\":".into())
            .await;
        response.assert_status_bad_request();
        assert_envelope(&response.json(), "Invalid JSON");
    }

    #[tokio::test]
    async fn test_oversized_body_is_payload_too_large() {
        let response = server()
            .post("/notes")
            .json(&json!({ "text": "x".repeat(200) }))
            .await;
        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(response.json::<Value>()["success"], false);
    }
}
