//! Role guards for handlers.
//!
//! The auth middleware puts an [`AuthenticatedUser`] into request extensions;
//! guards read it back and reject with 401/403 before the handler body runs.

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Only allows users with the ADMIN role.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireAdmin(user): RequireAdmin) { ... }
/// ```
pub struct RequireAdmin(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))?;

        if !user.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        Ok(RequireAdmin(user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{admin_user, regular_user, with_user};
    use axum::{http::StatusCode, routing::get, Router};
    use axum_test::TestServer;

    async fn admin_only(RequireAdmin(user): RequireAdmin) -> String {
        user.email
    }

    fn router() -> Router {
        Router::new().route("/admin", get(admin_only))
    }

    #[tokio::test]
    async fn test_admin_passes() {
        let server = TestServer::new(with_user(router(), admin_user())).unwrap();
        let response = server.get("/admin").await;
        response.assert_status_ok();
        response.assert_text(admin_user().email);
    }

    #[tokio::test]
    async fn test_regular_user_forbidden() {
        let server = TestServer::new(with_user(router(), regular_user())).unwrap();
        server
            .get("/admin")
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_anonymous_unauthorized() {
        let server = TestServer::new(router()).unwrap();
        server
            .get("/admin")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
