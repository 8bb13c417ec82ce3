//! Test run API handlers: listing and detail for authenticated callers.

use actix_web::{HttpResponse, get, web};
use uuid::Uuid;

use crate::auth::SessionAuth;
use crate::db::{DbPool, RunFilters};
use crate::error::{AppError, AppResult};
use crate::models::{
    ArtifactResponse, ListRunsQuery, Pagination, ResultResponse, RunDetailResponse,
    RunListResponse, RunStatus, RunSummary,
};

/// Configure test run routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_runs).service(get_run);
}

/// List the caller's test runs, newest first.
///
/// Members see only their own runs. Admins see all runs and may narrow
/// to one owner with `user_id`.
#[utoipa::path(
    get,
    path = "/api/v1/runs",
    tag = "Runs",
    params(
        ("status" = Option<String>, Query, description = "Filter by status (pending, running, completed, failed)"),
        ("created_after" = Option<String>, Query, description = "Only runs created at or after this RFC 3339 instant"),
        ("created_before" = Option<String>, Query, description = "Only runs created before this RFC 3339 instant"),
        ("user_id" = Option<Uuid>, Query, description = "Owner filter (admin only)"),
        ("page" = Option<u32>, Query, description = "Page number (default 1)"),
        ("limit" = Option<u32>, Query, description = "Page size (default 50, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated run list", body = RunListResponse),
        (status = 400, description = "Invalid filter", body = crate::error::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse),
    )
)]
#[get("/runs")]
pub async fn list_runs(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    query: web::Query<ListRunsQuery>,
    owner: web::Query<OwnerFilter>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let status = query.status_filter()?;

    // Members are scoped to their own runs regardless of the query.
    let user_id = if auth.is_admin() {
        owner.user_id
    } else {
        Some(auth.user.id)
    };

    let filters = RunFilters {
        user_id,
        status,
        created_after: query.created_after,
        created_before: query.created_before,
        limit: query.pagination().clamped_limit() as u64,
        offset: query.pagination().offset() as u64,
        ..Default::default()
    };

    let (runs, total) = pool.list_runs(&filters).await?;

    Ok(HttpResponse::Ok().json(RunListResponse {
        runs: runs.into_iter().map(RunSummary::from).collect(),
        pagination: Pagination::new(
            query.pagination().page(),
            query.pagination().clamped_limit(),
            total,
        ),
    }))
}

/// Owner filter, honored for admin callers only.
#[derive(Debug, serde::Deserialize)]
pub struct OwnerFilter {
    pub user_id: Option<Uuid>,
}

/// Full detail for one run.
///
/// Returns the run metadata with its aggregated result (if analysis has
/// produced one), that result's artifacts, and measurements ordered by
/// ascending pass count. A run owned by someone else is reported as 404
/// to non-admin callers.
#[utoipa::path(
    get,
    path = "/api/v1/runs/{id}",
    tag = "Runs",
    params(
        ("id" = Uuid, Path, description = "Test run ID"),
    ),
    responses(
        (status = 200, description = "Run detail", body = RunDetailResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse),
    )
)]
#[get("/runs/{id}")]
pub async fn get_run(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let run_id = path.into_inner();

    let run = pool
        .get_run_by_id(run_id)
        .await?
        .filter(|run| auth.is_admin() || run.user_id == auth.user.id)
        .ok_or_else(|| AppError::NotFound(format!("Test run {}", run_id)))?;

    let result = match pool.get_result_by_run(run_id).await? {
        Some(model) => {
            let artifacts = pool
                .list_artifacts_for_result(model.id)
                .await?
                .into_iter()
                .map(ArtifactResponse::from)
                .collect();
            Some(ResultResponse::from_model(model, artifacts))
        }
        None => None,
    };

    let measurements = pool
        .list_measurements_for_run(run_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(HttpResponse::Ok().json(RunDetailResponse {
        id: run.id,
        user_id: run.user_id,
        specimen: run.specimen,
        binder_grade: run.binder_grade,
        file_type: run.file_type,
        allowed_rut_depth: run.allowed_rut_depth,
        notes: run.notes,
        file_path: run.file_path,
        status: RunStatus::from_code(run.status).unwrap_or(RunStatus::Pending),
        errors: run.errors,
        analysis_version: run.analysis_version,
        created_at: run.created_at,
        updated_at: run.updated_at,
        result,
        measurements,
    }))
}
