use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::reports::{handlers, services::ReportService};

/// Report routes (authenticated; owner or admin per report)
pub fn routes(service: Arc<ReportService>) -> Router {
    Router::new()
        .route(
            "/api/reports",
            get(handlers::list_reports).post(handlers::create_report),
        )
        .route(
            "/api/reports/{id}",
            get(handlers::get_report)
                .put(handlers::update_report)
                .delete(handlers::delete_report),
        )
        .route("/api/reports/{id}/export", get(handlers::export_report))
        .route("/api/reports/{id}/refine", post(handlers::refine_report))
        .with_state(service)
}
