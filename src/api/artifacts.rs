//! Artifact browser: generated files attached to the caller's results.

use actix_web::{HttpResponse, get, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::SessionAuth;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{ArtifactKind, ArtifactResponse, Pagination, PaginationParams};

/// Configure artifact routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_artifacts);
}

/// Query parameters for the artifact browser.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListArtifactsQuery {
    /// Kind filter ("image", "video", "report", "log").
    pub kind: Option<String>,
    /// Page number (default 1).
    pub page: Option<u32>,
    /// Page size (default 50, max 100).
    pub limit: Option<u32>,
}

impl ListArtifactsQuery {
    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Paginated artifact list response.
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct ArtifactListResponse {
    pub artifacts: Vec<ArtifactResponse>,
    pub pagination: Pagination,
}

/// Browse artifacts attached to the caller's runs, newest first.
///
/// Members see artifacts from their own runs only.
#[utoipa::path(
    get,
    path = "/api/v1/artifacts",
    tag = "Artifacts",
    params(
        ("kind" = Option<String>, Query, description = "Filter by kind (image, video, report, log)"),
        ("page" = Option<u32>, Query, description = "Page number (default 1)"),
        ("limit" = Option<u32>, Query, description = "Page size (default 50, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated artifact list", body = ArtifactListResponse),
        (status = 400, description = "Invalid filter", body = crate::error::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse),
    )
)]
#[get("/artifacts")]
pub async fn list_artifacts(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    query: web::Query<ListArtifactsQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();

    let kind = match query.kind.as_deref() {
        None => None,
        Some(s) => Some(
            ArtifactKind::parse(s)
                .ok_or_else(|| AppError::InvalidInput(format!("Unknown artifact kind '{}'", s)))?,
        ),
    };

    // Scope to results under the caller's runs.
    let run_ids = pool.run_ids_for_user(auth.user.id).await?;
    let result_ids = pool.result_ids_for_runs(&run_ids).await?;

    let (artifacts, total) = pool
        .list_artifacts(
            &result_ids,
            kind,
            query.pagination().clamped_limit() as u64,
            query.pagination().offset() as u64,
        )
        .await?;

    Ok(HttpResponse::Ok().json(ArtifactListResponse {
        artifacts: artifacts.into_iter().map(ArtifactResponse::from).collect(),
        pagination: Pagination::new(
            query.pagination().page(),
            query.pagination().clamped_limit(),
            total,
        ),
    }))
}
