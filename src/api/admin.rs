//! Administrative console endpoints.
//!
//! Full CRUD over runs, results, measurements, and artifacts for callers
//! with the admin role. All writes re-validate field constraints before
//! touching the database. The analysis pipeline is not part of this
//! service, so these endpoints are the only way a run leaves PENDING or
//! gains an aggregated result.

use actix_web::{HttpResponse, delete, get, patch, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::SessionAuth;
use crate::config::Config;
use crate::db::{self, DbPool, ResultFilters, RunFilters};
use crate::error::{AppError, AppResult};
use crate::models::{
    AdminListRunsQuery, AdminUpdateRunRequest, ArtifactKind, ArtifactResponse,
    CreateArtifactRequest, CreateMeasurementRequest, CreateResultRequest, InputFileType,
    MeasurementResponse, Pagination, PaginationParams, ResultResponse, RunListResponse, RunStatus,
    RunSummary, UpdateArtifactRequest, UpdateMeasurementRequest, UpdateResultRequest,
};

/// Configure admin routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .service(list_runs)
            .service(update_run)
            .service(delete_run)
            .service(create_result)
            .service(list_results)
            .service(update_result)
            .service(delete_result)
            .service(create_measurement)
            .service(list_measurements)
            .service(update_measurement)
            .service(delete_measurement)
            .service(create_artifact)
            .service(list_artifacts)
            .service(update_artifact)
            .service(delete_artifact),
    );
}

fn require_admin(auth: &SessionAuth) -> AppResult<()> {
    if auth.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Administrator role required".to_string(),
        ))
    }
}

// ---- Runs ----

/// Browse all runs with search and filters.
///
/// Search matches substrings of specimen, binder grade, notes, and the
/// owner's username.
#[utoipa::path(
    get,
    path = "/api/v1/admin/runs",
    tag = "Admin",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("file_type" = Option<String>, Query, description = "Filter by input file type"),
        ("user_id" = Option<Uuid>, Query, description = "Filter by owner"),
        ("search" = Option<String>, Query, description = "Substring search"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("limit" = Option<u32>, Query, description = "Page size"),
    ),
    responses(
        (status = 200, description = "Paginated run list", body = RunListResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
    )
)]
#[get("/runs")]
pub async fn list_runs(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    query: web::Query<AdminListRunsQuery>,
) -> AppResult<HttpResponse> {
    require_admin(&auth)?;
    let query = query.into_inner();

    let status = match query.status.as_deref() {
        None => None,
        Some(s) => Some(
            RunStatus::parse(s)
                .ok_or_else(|| AppError::InvalidInput(format!("Unknown status '{}'", s)))?,
        ),
    };

    let file_type = match query.file_type.as_deref() {
        None => None,
        Some(s) => Some(
            InputFileType::parse(s)
                .ok_or_else(|| AppError::InvalidInput(format!("Unknown file_type '{}'", s)))?
                .as_str()
                .to_string(),
        ),
    };

    // Username search terms resolve to owner IDs up front so the run
    // query stays a single-table filter.
    let search_user_ids = match query.search.as_deref() {
        Some(s) if !s.trim().is_empty() => {
            db::users::find_ids_by_username_fragment(pool.connection(), s.trim()).await?
        }
        _ => Vec::new(),
    };

    let filters = RunFilters {
        user_id: query.user_id,
        status,
        file_type,
        search: query.search.as_deref().map(|s| s.trim().to_string()),
        search_user_ids,
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

/// Edit run fields. Timestamps are server-managed and not editable.
#[utoipa::path(
    patch,
    path = "/api/v1/admin/runs/{id}",
    tag = "Admin",
    request_body = AdminUpdateRunRequest,
    responses(
        (status = 200, description = "Updated run", body = RunSummary),
        (status = 400, description = "Validation failure", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse),
    )
)]
#[patch("/runs/{id}")]
pub async fn update_run(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<AdminUpdateRunRequest>,
) -> AppResult<HttpResponse> {
    require_admin(&auth)?;
    let update = body.into_inner();
    update.validate()?;

    let run = pool.update_run(path.into_inner(), &update).await?;

    info!("Run updated by admin {}: id={}", auth.user.username, run.id);

    Ok(HttpResponse::Ok().json(RunSummary::from(run)))
}

/// Delete a run and everything under it.
///
/// The database cascade removes the result, measurements, and artifacts;
/// the stored data file directory is removed best-effort afterwards.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/runs/{id}",
    tag = "Admin",
    responses(
        (status = 204, description = "Run deleted"),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse),
    )
)]
#[delete("/runs/{id}")]
pub async fn delete_run(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    require_admin(&auth)?;
    let run_id = path.into_inner();

    if !pool.delete_run(run_id).await? {
        return Err(AppError::NotFound(format!("Test run {}", run_id)));
    }

    let run_dir = config.data_dir.join("runs").join(run_id.to_string());
    if let Err(e) = tokio::fs::remove_dir_all(&run_dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove data for run {}: {}", run_id, e);
        }
    }

    info!("Run deleted by admin {}: id={}", auth.user.username, run_id);

    Ok(HttpResponse::NoContent().finish())
}

// ---- Results ----

/// Query parameters for the admin result browser.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminListResultsQuery {
    pub test_run_id: Option<Uuid>,
    /// Rating classification filter ("excellent", "good", "fair", "poor").
    pub rating_classification: Option<String>,
    /// Page number (default 1).
    pub page: Option<u32>,
    /// Page size (default 50, max 100).
    pub limit: Option<u32>,
}

impl AdminListResultsQuery {
    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Paginated result list response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResultListResponse {
    pub results: Vec<ResultResponse>,
    pub pagination: Pagination,
}

/// Attach an aggregated result to a run. At most one per run.
#[utoipa::path(
    post,
    path = "/api/v1/admin/results",
    tag = "Admin",
    request_body = CreateResultRequest,
    responses(
        (status = 201, description = "Result created", body = ResultResponse),
        (status = 400, description = "Validation failure", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Run already has a result", body = crate::error::ErrorResponse),
    )
)]
#[post("/results")]
pub async fn create_result(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    body: web::Json<CreateResultRequest>,
) -> AppResult<HttpResponse> {
    require_admin(&auth)?;
    let req = body.into_inner();
    req.validate()?;

    if pool.get_run_by_id(req.test_run_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Test run {}", req.test_run_id)));
    }

    let result = pool.insert_result(&req).await?;

    Ok(HttpResponse::Created().json(ResultResponse::from_model(result, Vec::new())))
}

/// Browse aggregated results.
#[utoipa::path(
    get,
    path = "/api/v1/admin/results",
    tag = "Admin",
    params(
        ("test_run_id" = Option<Uuid>, Query, description = "Filter by run"),
        ("rating_classification" = Option<String>, Query, description = "Filter by classification"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("limit" = Option<u32>, Query, description = "Page size"),
    ),
    responses(
        (status = 200, description = "Paginated result list", body = ResultListResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
    )
)]
#[get("/results")]
pub async fn list_results(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    query: web::Query<AdminListResultsQuery>,
) -> AppResult<HttpResponse> {
    require_admin(&auth)?;
    let query = query.into_inner();

    let rating_classification = match query.rating_classification.as_deref() {
        None => None,
        Some(s) => Some(crate::models::RatingClass::parse(s).ok_or_else(|| {
            AppError::InvalidInput(format!("Unknown rating classification '{}'", s))
        })?),
    };

    let filters = ResultFilters {
        test_run_id: query.test_run_id,
        rating_classification,
        limit: query.pagination().clamped_limit() as u64,
        offset: query.pagination().offset() as u64,
    };

    let (results, total) = pool.list_results(&filters).await?;

    let mut responses = Vec::with_capacity(results.len());
    for model in results {
        let artifacts = pool
            .list_artifacts_for_result(model.id)
            .await?
            .into_iter()
            .map(ArtifactResponse::from)
            .collect();
        responses.push(ResultResponse::from_model(model, artifacts));
    }

    Ok(HttpResponse::Ok().json(ResultListResponse {
        results: responses,
        pagination: Pagination::new(
            query.pagination().page(),
            query.pagination().clamped_limit(),
            total,
        ),
    }))
}

/// Edit result fields. The run reference is read-only.
#[utoipa::path(
    patch,
    path = "/api/v1/admin/results/{id}",
    tag = "Admin",
    request_body = UpdateResultRequest,
    responses(
        (status = 200, description = "Updated result", body = ResultResponse),
        (status = 400, description = "Validation failure", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "Result not found", body = crate::error::ErrorResponse),
    )
)]
#[patch("/results/{id}")]
pub async fn update_result(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateResultRequest>,
) -> AppResult<HttpResponse> {
    require_admin(&auth)?;
    let update = body.into_inner();
    update.validate()?;

    let result = pool.update_result(path.into_inner(), &update).await?;
    let artifacts = pool
        .list_artifacts_for_result(result.id)
        .await?
        .into_iter()
        .map(ArtifactResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(ResultResponse::from_model(result, artifacts)))
}

/// Delete a result. Its artifacts go with it via FK cascade.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/results/{id}",
    tag = "Admin",
    responses(
        (status = 204, description = "Result deleted"),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "Result not found", body = crate::error::ErrorResponse),
    )
)]
#[delete("/results/{id}")]
pub async fn delete_result(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    require_admin(&auth)?;
    let id = path.into_inner();

    if !pool.delete_result(id).await? {
        return Err(AppError::NotFound(format!("Test result {}", id)));
    }

    Ok(HttpResponse::NoContent().finish())
}

// ---- Measurements ----

/// Query parameters for the admin measurement browser.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminListMeasurementsQuery {
    pub test_run_id: Option<Uuid>,
    /// Page number (default 1).
    pub page: Option<u32>,
    /// Page size (default 50, max 100).
    pub limit: Option<u32>,
}

impl AdminListMeasurementsQuery {
    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Paginated measurement list response.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeasurementListResponse {
    pub measurements: Vec<MeasurementResponse>,
    pub pagination: Pagination,
}

/// Add a per-pass measurement to a run.
#[utoipa::path(
    post,
    path = "/api/v1/admin/measurements",
    tag = "Admin",
    request_body = CreateMeasurementRequest,
    responses(
        (status = 201, description = "Measurement created", body = MeasurementResponse),
        (status = 400, description = "Validation failure", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse),
    )
)]
#[post("/measurements")]
pub async fn create_measurement(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    body: web::Json<CreateMeasurementRequest>,
) -> AppResult<HttpResponse> {
    require_admin(&auth)?;
    let req = body.into_inner();
    req.validate()?;

    if pool.get_run_by_id(req.test_run_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Test run {}", req.test_run_id)));
    }

    let measurement = pool.insert_measurement(&req).await?;

    Ok(HttpResponse::Created().json(MeasurementResponse::from(measurement)))
}

/// Browse per-pass measurements.
#[utoipa::path(
    get,
    path = "/api/v1/admin/measurements",
    tag = "Admin",
    params(
        ("test_run_id" = Option<Uuid>, Query, description = "Filter by run"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("limit" = Option<u32>, Query, description = "Page size"),
    ),
    responses(
        (status = 200, description = "Paginated measurement list", body = MeasurementListResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
    )
)]
#[get("/measurements")]
pub async fn list_measurements(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    query: web::Query<AdminListMeasurementsQuery>,
) -> AppResult<HttpResponse> {
    require_admin(&auth)?;
    let query = query.into_inner();

    let (measurements, total) = pool
        .list_measurements(
            query.test_run_id,
            query.pagination().clamped_limit() as u64,
            query.pagination().offset() as u64,
        )
        .await?;

    Ok(HttpResponse::Ok().json(MeasurementListResponse {
        measurements: measurements
            .into_iter()
            .map(MeasurementResponse::from)
            .collect(),
        pagination: Pagination::new(
            query.pagination().page(),
            query.pagination().clamped_limit(),
            total,
        ),
    }))
}

/// Edit measurement fields. The run reference is read-only.
#[utoipa::path(
    patch,
    path = "/api/v1/admin/measurements/{id}",
    tag = "Admin",
    request_body = UpdateMeasurementRequest,
    responses(
        (status = 200, description = "Updated measurement", body = MeasurementResponse),
        (status = 400, description = "Validation failure", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "Measurement not found", body = crate::error::ErrorResponse),
    )
)]
#[patch("/measurements/{id}")]
pub async fn update_measurement(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
    body: web::Json<UpdateMeasurementRequest>,
) -> AppResult<HttpResponse> {
    require_admin(&auth)?;
    let update = body.into_inner();
    update.validate()?;

    let measurement = pool.update_measurement(path.into_inner(), &update).await?;

    Ok(HttpResponse::Ok().json(MeasurementResponse::from(measurement)))
}

/// Delete a measurement.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/measurements/{id}",
    tag = "Admin",
    responses(
        (status = 204, description = "Measurement deleted"),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "Measurement not found", body = crate::error::ErrorResponse),
    )
)]
#[delete("/measurements/{id}")]
pub async fn delete_measurement(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    require_admin(&auth)?;
    let id = path.into_inner();

    if !pool.delete_measurement(id).await? {
        return Err(AppError::NotFound(format!("Measurement {}", id)));
    }

    Ok(HttpResponse::NoContent().finish())
}

// ---- Artifacts ----

/// Query parameters for the admin artifact browser.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminListArtifactsQuery {
    pub test_result_id: Option<Uuid>,
    /// Kind filter ("image", "video", "report", "log").
    pub kind: Option<String>,
    /// Page number (default 1).
    pub page: Option<u32>,
    /// Page size (default 50, max 100).
    pub limit: Option<u32>,
}

impl AdminListArtifactsQuery {
    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Attach an artifact to a result.
#[utoipa::path(
    post,
    path = "/api/v1/admin/artifacts",
    tag = "Admin",
    request_body = CreateArtifactRequest,
    responses(
        (status = 201, description = "Artifact created", body = ArtifactResponse),
        (status = 400, description = "Validation failure", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "Result not found", body = crate::error::ErrorResponse),
    )
)]
#[post("/artifacts")]
pub async fn create_artifact(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    body: web::Json<CreateArtifactRequest>,
) -> AppResult<HttpResponse> {
    require_admin(&auth)?;
    let req = body.into_inner();
    req.validate()?;

    if pool.get_result_by_id(req.test_result_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Test result {}",
            req.test_result_id
        )));
    }

    let artifact = pool.insert_artifact(&req).await?;

    Ok(HttpResponse::Created().json(ArtifactResponse::from(artifact)))
}

/// Browse artifacts across all results.
#[utoipa::path(
    get,
    path = "/api/v1/admin/artifacts",
    tag = "Admin",
    params(
        ("test_result_id" = Option<Uuid>, Query, description = "Filter by result"),
        ("kind" = Option<String>, Query, description = "Filter by kind"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("limit" = Option<u32>, Query, description = "Page size"),
    ),
    responses(
        (status = 200, description = "Paginated artifact list", body = crate::api::artifacts::ArtifactListResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
    )
)]
#[get("/artifacts")]
pub async fn list_artifacts(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    query: web::Query<AdminListArtifactsQuery>,
) -> AppResult<HttpResponse> {
    require_admin(&auth)?;
    let query = query.into_inner();

    let kind = match query.kind.as_deref() {
        None => None,
        Some(s) => Some(
            ArtifactKind::parse(s)
                .ok_or_else(|| AppError::InvalidInput(format!("Unknown artifact kind '{}'", s)))?,
        ),
    };

    let limit = query.pagination().clamped_limit() as u64;
    let offset = query.pagination().offset() as u64;

    let (artifacts, total) = match query.test_result_id {
        Some(result_id) => pool.list_artifacts(&[result_id], kind, limit, offset).await?,
        None => pool.list_all_artifacts(kind, limit, offset).await?,
    };

    Ok(
        HttpResponse::Ok().json(crate::api::artifacts::ArtifactListResponse {
            artifacts: artifacts.into_iter().map(ArtifactResponse::from).collect(),
            pagination: Pagination::new(
                query.pagination().page(),
                query.pagination().clamped_limit(),
                total,
            ),
        }),
    )
}

/// Edit artifact fields. The result reference is read-only.
#[utoipa::path(
    patch,
    path = "/api/v1/admin/artifacts/{id}",
    tag = "Admin",
    request_body = UpdateArtifactRequest,
    responses(
        (status = 200, description = "Updated artifact", body = ArtifactResponse),
        (status = 400, description = "Validation failure", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "Artifact not found", body = crate::error::ErrorResponse),
    )
)]
#[patch("/artifacts/{id}")]
pub async fn update_artifact(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateArtifactRequest>,
) -> AppResult<HttpResponse> {
    require_admin(&auth)?;
    let update = body.into_inner();
    update.validate()?;

    let artifact = pool.update_artifact(path.into_inner(), &update).await?;

    Ok(HttpResponse::Ok().json(ArtifactResponse::from(artifact)))
}

/// Delete an artifact.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/artifacts/{id}",
    tag = "Admin",
    responses(
        (status = 204, description = "Artifact deleted"),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "Artifact not found", body = crate::error::ErrorResponse),
    )
)]
#[delete("/artifacts/{id}")]
pub async fn delete_artifact(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    require_admin(&auth)?;
    let id = path.into_inner();

    if !pool.delete_artifact(id).await? {
        return Err(AppError::NotFound(format!("Artifact {}", id)));
    }

    Ok(HttpResponse::NoContent().finish())
}
