//! Database queries for test artifacts.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::test_artifact::{self as artifact, ActiveModel, Entity as Artifact};
use crate::error::{AppError, AppResult};
use crate::models::{ArtifactKind, CreateArtifactRequest, UpdateArtifactRequest};

use super::DbPool;

impl DbPool {
    /// Attach an artifact to a result.
    pub async fn insert_artifact(&self, req: &CreateArtifactRequest) -> AppResult<artifact::Model> {
        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            test_result_id: Set(req.test_result_id),
            kind: Set(req.kind.as_str().to_string()),
            path: Set(req.path.clone()),
            created_at: Set(Utc::now()),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert artifact: {}", e)))?;

        Ok(result)
    }

    /// Get an artifact by ID.
    pub async fn get_artifact_by_id(&self, id: Uuid) -> AppResult<Option<artifact::Model>> {
        let result = Artifact::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get artifact: {}", e)))?;

        Ok(result)
    }

    /// All artifacts attached to a result.
    pub async fn list_artifacts_for_result(
        &self,
        result_id: Uuid,
    ) -> AppResult<Vec<artifact::Model>> {
        let results = Artifact::find()
            .filter(artifact::Column::TestResultId.eq(result_id))
            .order_by_asc(artifact::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list artifacts: {}", e)))?;

        Ok(results)
    }

    /// Paginated artifact browser over a set of results, optionally
    /// narrowed to one kind. Newest first.
    pub async fn list_artifacts(
        &self,
        result_ids: &[Uuid],
        kind: Option<ArtifactKind>,
        limit: u64,
        offset: u64,
    ) -> AppResult<(Vec<artifact::Model>, u64)> {
        if result_ids.is_empty() {
            return Ok((Vec::new(), 0));
        }

        let mut select =
            Artifact::find().filter(artifact::Column::TestResultId.is_in(result_ids.to_vec()));

        if let Some(kind) = kind {
            select = select.filter(artifact::Column::Kind.eq(kind.as_str()));
        }

        let total = select
            .clone()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count artifacts: {}", e)))?;

        let results = select
            .order_by_desc(artifact::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list artifacts: {}", e)))?;

        Ok((results, total))
    }

    /// Unscoped artifact browser for the admin console, newest first.
    pub async fn list_all_artifacts(
        &self,
        kind: Option<ArtifactKind>,
        limit: u64,
        offset: u64,
    ) -> AppResult<(Vec<artifact::Model>, u64)> {
        let mut select = Artifact::find();

        if let Some(kind) = kind {
            select = select.filter(artifact::Column::Kind.eq(kind.as_str()));
        }

        let total = select
            .clone()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count artifacts: {}", e)))?;

        let results = select
            .order_by_desc(artifact::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list artifacts: {}", e)))?;

        Ok((results, total))
    }

    /// Apply an admin field-level edit to an artifact; the result
    /// reference is read-only.
    pub async fn update_artifact(
        &self,
        id: Uuid,
        update: &UpdateArtifactRequest,
    ) -> AppResult<artifact::Model> {
        let existing = self
            .get_artifact_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Artifact {}", id)))?;

        let mut active: ActiveModel = existing.into();

        if let Some(kind) = update.kind {
            active.kind = Set(kind.as_str().to_string());
        }
        if let Some(ref path) = update.path {
            active.path = Set(path.clone());
        }

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update artifact: {}", e)))?;

        Ok(result)
    }

    /// Hard-delete an artifact. Returns whether a row was deleted.
    pub async fn delete_artifact(&self, id: Uuid) -> AppResult<bool> {
        let result = Artifact::delete_by_id(id)
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete artifact: {}", e)))?;

        Ok(result.rows_affected > 0)
    }

    /// IDs of all results belonging to the given runs (artifact browser
    /// scoping for member callers).
    pub async fn result_ids_for_runs(&self, run_ids: &[Uuid]) -> AppResult<Vec<Uuid>> {
        if run_ids.is_empty() {
            return Ok(Vec::new());
        }

        use crate::entity::test_result::{self as result, Entity as TestResult};

        let results = TestResult::find()
            .filter(result::Column::TestRunId.is_in(run_ids.to_vec()))
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list results for runs: {}", e)))?;

        Ok(results.into_iter().map(|r| r.id).collect())
    }
}
