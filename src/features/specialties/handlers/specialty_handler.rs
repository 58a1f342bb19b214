use axum::Json;

use crate::features::specialties::registry::{self, Specialty};
use crate::shared::types::ApiResponse;

/// List supported medical specialties
#[utoipa::path(
    get,
    path = "/api/specialties",
    responses(
        (status = 200, description = "Specialty registry", body = ApiResponse<Vec<Specialty>>)
    ),
    tag = "specialties"
)]
pub async fn list_specialties() -> Json<ApiResponse<Vec<Specialty>>> {
    Json(ApiResponse::success(Some(registry::all()), None, None))
}
