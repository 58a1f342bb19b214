use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::generation::{dtos as generation_dtos, handlers as generation_handlers};
use crate::features::prompts::{dtos as prompts_dtos, handlers as prompts_handlers};
use crate::features::reports::{dtos as reports_dtos, handlers as reports_handlers};
use crate::features::specialties::{handlers as specialties_handlers, registry::Specialty};
use crate::features::transcription::{
    dtos as transcription_dtos, handlers as transcription_handlers,
};
use crate::features::users::{dtos as users_dtos, handlers as users_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::register,
        auth::handlers::login,
        auth::handlers::logout,
        auth::handlers::get_me,
        // Users
        users_handlers::update_me,
        users_handlers::list_users,
        users_handlers::update_user_role,
        // Specialties (public)
        specialties_handlers::list_specialties,
        // Prompts
        prompts_handlers::create_prompt,
        prompts_handlers::get_prompt,
        prompts_handlers::list_prompts,
        prompts_handlers::update_prompt,
        prompts_handlers::delete_prompt,
        // Reports
        reports_handlers::list_reports,
        reports_handlers::create_report,
        reports_handlers::get_report,
        reports_handlers::update_report,
        reports_handlers::delete_report,
        reports_handlers::export_report,
        reports_handlers::refine_report,
        // Generation
        generation_handlers::generate_report,
        // Transcription
        transcription_handlers::transcribe_audio,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Auth
            auth::model::UserRole,
            auth::model::AuthenticatedUser,
            auth::dtos::RegisterRequestDto,
            auth::dtos::LoginRequestDto,
            auth::dtos::AuthResponseDto,
            ApiResponse<auth::dtos::AuthResponseDto>,
            // Users
            users_dtos::UserResponseDto,
            users_dtos::UpdateProfileDto,
            users_dtos::UpdateUserRoleDto,
            ApiResponse<users_dtos::UserResponseDto>,
            ApiResponse<Vec<users_dtos::UserResponseDto>>,
            // Specialties
            Specialty,
            ApiResponse<Vec<Specialty>>,
            // Prompts
            prompts_dtos::PromptScope,
            prompts_dtos::CreatePromptDto,
            prompts_dtos::UpdatePromptDto,
            prompts_dtos::PromptResponseDto,
            ApiResponse<prompts_dtos::PromptResponseDto>,
            ApiResponse<Vec<prompts_dtos::PromptResponseDto>>,
            // Reports
            reports_dtos::SortDirection,
            reports_dtos::ReportSortField,
            reports_dtos::ExportFormat,
            reports_dtos::CreateReportDto,
            reports_dtos::UpdateReportDto,
            reports_dtos::RefineReportDto,
            reports_dtos::ReportResponseDto,
            ApiResponse<reports_dtos::ReportResponseDto>,
            ApiResponse<Vec<reports_dtos::ReportResponseDto>>,
            // Generation
            generation_dtos::GenerateReportDto,
            // Transcription
            transcription_dtos::TranscribeAudioDto,
            transcription_dtos::CorrectionDto,
            transcription_dtos::TranscriptionResponseDto,
            ApiResponse<transcription_dtos::TranscriptionResponseDto>,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and session"),
        (name = "users", description = "User accounts and roles"),
        (name = "specialties", description = "Medical specialty registry (public)"),
        (name = "prompts", description = "System and personal prompt templates"),
        (name = "reports", description = "Saved reports, export and refinement"),
        (name = "generation", description = "Streaming report generation (SSE)"),
        (name = "transcription", description = "Dictation transcription with medical spelling correction"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "MedReport API",
        version = "0.1.0",
        description = "API documentation for MedReport",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
