//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models, services};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Wheel-Tracking Test Server",
        version = "0.3.0",
        description = "API server for tracking asphalt wheel-tracking hardware test runs: run submission, results, per-pass measurements, and generated artifacts"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Account endpoints
        services::account::signup,
        services::account::login,
        services::account::logout,
        services::account::get_current_user,
        // Run endpoints
        services::upload::create_run,
        api::test_runs::list_runs,
        api::test_runs::get_run,
        // Artifact browser
        api::artifacts::list_artifacts,
        // Admin console
        api::admin::list_runs,
        api::admin::update_run,
        api::admin::delete_run,
        api::admin::create_result,
        api::admin::list_results,
        api::admin::update_result,
        api::admin::delete_result,
        api::admin::create_measurement,
        api::admin::list_measurements,
        api::admin::update_measurement,
        api::admin::delete_measurement,
        api::admin::create_artifact,
        api::admin::list_artifacts,
        api::admin::update_artifact,
        api::admin::delete_artifact,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            models::Pagination,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Accounts
            models::UserRole,
            models::SignupRequest,
            models::LoginRequest,
            models::UserResponse,
            // Runs
            models::RunStatus,
            models::InputFileType,
            models::RunSummary,
            models::RunListResponse,
            models::RunDetailResponse,
            models::AdminUpdateRunRequest,
            // Results
            models::RatingClass,
            models::CreateResultRequest,
            models::UpdateResultRequest,
            models::ResultResponse,
            api::admin::ResultListResponse,
            // Measurements
            models::CreateMeasurementRequest,
            models::UpdateMeasurementRequest,
            models::MeasurementResponse,
            api::admin::MeasurementListResponse,
            // Artifacts
            models::ArtifactKind,
            models::CreateArtifactRequest,
            models::UpdateArtifactRequest,
            models::ArtifactResponse,
            api::artifacts::ArtifactListResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Signup, login, and session management"),
        (name = "Runs", description = "Test run submission and browsing"),
        (name = "Artifacts", description = "Generated artifact browser"),
        (name = "Admin", description = "Administrative console")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add the session cookie security scheme.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Cookie(
                        utoipa::openapi::security::ApiKeyValue::new(
                            crate::config::SESSION_COOKIE,
                        ),
                    ),
                ),
            );
        }
    }
}
