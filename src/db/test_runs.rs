//! Database queries for test runs.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::test_run::{self as run, ActiveModel, Entity as TestRun};
use crate::error::{AppError, AppResult};
use crate::models::{AdminUpdateRunRequest, CreateRunInput, RunStatus};

use super::DbPool;

/// Filters for listing runs. `user_id` is mandatory for member listings
/// and optional for the admin browser.
#[derive(Debug, Default)]
pub struct RunFilters {
    pub user_id: Option<Uuid>,
    pub user_ids: Option<Vec<Uuid>>,
    pub status: Option<RunStatus>,
    pub file_type: Option<String>,
    pub search: Option<String>,
    pub search_user_ids: Vec<Uuid>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub limit: u64,
    pub offset: u64,
}

impl DbPool {
    /// Insert a new test run. The caller has already validated the input;
    /// status and analysis_version are server-assigned.
    pub async fn insert_run(
        &self,
        id: Uuid,
        user_id: Uuid,
        input: &CreateRunInput,
        file_path: &str,
    ) -> AppResult<run::Model> {
        let now = Utc::now();

        let model = ActiveModel {
            id: Set(id),
            user_id: Set(user_id),
            specimen: Set(input.specimen.clone()),
            binder_grade: Set(input.binder_grade.clone()),
            file_type: Set(input.file_type.as_str().to_string()),
            allowed_rut_depth: Set(input.allowed_rut_depth),
            notes: Set(input.notes.clone()),
            file_path: Set(file_path.to_string()),
            status: Set(RunStatus::Pending.code()),
            errors: Set(None),
            analysis_version: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert test run: {}", e)))?;

        Ok(result)
    }

    /// Get a test run by ID.
    pub async fn get_run_by_id(&self, id: Uuid) -> AppResult<Option<run::Model>> {
        let result = TestRun::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get test run: {}", e)))?;

        Ok(result)
    }

    /// List runs with filtering, newest first. Returns the page and the
    /// total matching count.
    pub async fn list_runs(&self, filters: &RunFilters) -> AppResult<(Vec<run::Model>, u64)> {
        let mut select = TestRun::find();

        if let Some(user_id) = filters.user_id {
            select = select.filter(run::Column::UserId.eq(user_id));
        }

        if let Some(ref user_ids) = filters.user_ids {
            select = select.filter(run::Column::UserId.is_in(user_ids.clone()));
        }

        if let Some(status) = filters.status {
            select = select.filter(run::Column::Status.eq(status.code()));
        }

        if let Some(ref file_type) = filters.file_type {
            select = select.filter(run::Column::FileType.eq(file_type.clone()));
        }

        if let Some(after) = filters.created_after {
            select = select.filter(run::Column::CreatedAt.gte(after));
        }

        if let Some(before) = filters.created_before {
            select = select.filter(run::Column::CreatedAt.lt(before));
        }

        // Substring search over specimen, binder grade, notes, and owner
        // username (owner IDs pre-resolved by the caller).
        if let Some(ref search) = filters.search {
            let mut cond = Condition::any()
                .add(run::Column::Specimen.contains(search))
                .add(run::Column::BinderGrade.contains(search))
                .add(run::Column::Notes.contains(search));
            if !filters.search_user_ids.is_empty() {
                cond = cond.add(run::Column::UserId.is_in(filters.search_user_ids.clone()));
            }
            select = select.filter(cond);
        }

        // Count total before pagination
        let total = select
            .clone()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count test runs: {}", e)))?;

        let runs = select
            .order_by_desc(run::Column::CreatedAt)
            .offset(filters.offset)
            .limit(filters.limit)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list test runs: {}", e)))?;

        Ok((runs, total))
    }

    /// Apply an admin field-level edit. Absent fields are left unchanged.
    pub async fn update_run(
        &self,
        id: Uuid,
        update: &AdminUpdateRunRequest,
    ) -> AppResult<run::Model> {
        let existing = self
            .get_run_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test run {}", id)))?;

        let mut active: ActiveModel = existing.into();

        if let Some(ref specimen) = update.specimen {
            active.specimen = Set(specimen.clone());
        }
        if let Some(ref binder_grade) = update.binder_grade {
            active.binder_grade = Set(binder_grade.clone());
        }
        if let Some(depth) = update.allowed_rut_depth {
            active.allowed_rut_depth = Set(depth);
        }
        if let Some(ref notes) = update.notes {
            active.notes = Set(notes.clone());
        }
        if let Some(status) = update.status {
            active.status = Set(status.code());
        }
        if let Some(ref errors) = update.errors {
            active.errors = Set(errors.clone());
        }
        if let Some(version) = update.analysis_version {
            active.analysis_version = Set(version);
        }
        active.updated_at = Set(Utc::now());

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update test run: {}", e)))?;

        Ok(result)
    }

    /// Hard-delete a run. Results, measurements, and artifacts go with it
    /// via FK cascade. Returns whether a row was deleted.
    pub async fn delete_run(&self, id: Uuid) -> AppResult<bool> {
        let result = TestRun::delete_by_id(id)
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete test run: {}", e)))?;

        Ok(result.rows_affected > 0)
    }

    /// IDs of all runs owned by a user (artifact browser scoping).
    pub async fn run_ids_for_user(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let runs = TestRun::find()
            .filter(run::Column::UserId.eq(user_id))
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list runs for user: {}", e)))?;

        Ok(runs.into_iter().map(|r| r.id).collect())
    }
}
