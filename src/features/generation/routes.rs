use axum::{routing::post, Router};
use std::sync::Arc;

use crate::features::generation::{handlers, services::GenerationService};

/// Streaming generation route (authenticated)
pub fn routes(service: Arc<GenerationService>) -> Router {
    Router::new()
        .route("/api/generate", post(handlers::generate_report))
        .with_state(service)
}
