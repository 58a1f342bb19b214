use crate::features::specialties::handlers;
use axum::{routing::get, Router};

pub fn routes() -> Router {
    Router::new().route("/api/specialties", get(handlers::list_specialties))
}
