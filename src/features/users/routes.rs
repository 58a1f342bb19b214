use crate::features::users::handlers;
use crate::features::users::services::UserService;
use axum::{
    routing::{get, patch},
    Router,
};
use std::sync::Arc;

pub fn routes(service: Arc<UserService>) -> Router {
    Router::new()
        .route("/api/users/me", patch(handlers::update_me))
        .with_state(service)
}

/// Admin-only account management
pub fn admin_routes(service: Arc<UserService>) -> Router {
    Router::new()
        .route("/api/admin/users", get(handlers::list_users))
        .route(
            "/api/admin/users/{id}/role",
            patch(handlers::update_user_role),
        )
        .with_state(service)
}
