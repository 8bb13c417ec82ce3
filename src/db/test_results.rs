//! Database queries for aggregated test results.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::test_result::{self as result, ActiveModel, Entity as TestResult};
use crate::error::{AppError, AppResult};
use crate::models::{CreateResultRequest, RatingClass, UpdateResultRequest};

use super::DbPool;

/// Filters for the admin result browser.
#[derive(Debug, Default)]
pub struct ResultFilters {
    pub test_run_id: Option<Uuid>,
    pub rating_classification: Option<RatingClass>,
    pub limit: u64,
    pub offset: u64,
}

impl DbPool {
    /// Insert the aggregated result for a run. At most one result per run;
    /// a second insert is rejected up front, and the unique index on
    /// test_run_id backstops concurrent inserts.
    pub async fn insert_result(&self, req: &CreateResultRequest) -> AppResult<result::Model> {
        if self.get_result_by_run(req.test_run_id).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Test run {} already has a result",
                req.test_run_id
            )));
        }

        let now = Utc::now();
        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            test_run_id: Set(req.test_run_id),
            passes_total: Set(req.passes_total),
            rut_depth_5000: Set(req.rut_depth_5000),
            rut_depth_10000: Set(req.rut_depth_10000),
            rut_depth_15000: Set(req.rut_depth_15000),
            rut_depth_20000: Set(req.rut_depth_20000),
            rut_depth_final: Set(req.rut_depth_final),
            passes_to_failure: Set(req.passes_to_failure),
            inflection_pass: Set(req.inflection_pass),
            test_duration_ms: Set(req.test_duration_ms),
            rating: Set(req.rating),
            rating_classification: Set(req.rating_classification.code()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| match e.sql_err() {
                Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(
                    format!("Test run {} already has a result", req.test_run_id),
                ),
                _ => AppError::Database(format!("Failed to insert test result: {}", e)),
            })?;

        Ok(result)
    }

    /// Get a result by its own ID.
    pub async fn get_result_by_id(&self, id: Uuid) -> AppResult<Option<result::Model>> {
        let result = TestResult::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get test result: {}", e)))?;

        Ok(result)
    }

    /// Get the result belonging to a run, if any.
    pub async fn get_result_by_run(&self, run_id: Uuid) -> AppResult<Option<result::Model>> {
        let result = TestResult::find()
            .filter(result::Column::TestRunId.eq(run_id))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get test result: {}", e)))?;

        Ok(result)
    }

    /// List results for the admin browser, newest first.
    pub async fn list_results(
        &self,
        filters: &ResultFilters,
    ) -> AppResult<(Vec<result::Model>, u64)> {
        let mut select = TestResult::find();

        if let Some(run_id) = filters.test_run_id {
            select = select.filter(result::Column::TestRunId.eq(run_id));
        }

        if let Some(class) = filters.rating_classification {
            select = select.filter(result::Column::RatingClassification.eq(class.code()));
        }

        let total = select
            .clone()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count test results: {}", e)))?;

        let results = select
            .order_by_desc(result::Column::CreatedAt)
            .offset(filters.offset)
            .limit(filters.limit)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list test results: {}", e)))?;

        Ok((results, total))
    }

    /// Apply an admin field-level edit. Absent fields are left unchanged;
    /// the run reference is read-only.
    pub async fn update_result(
        &self,
        id: Uuid,
        update: &UpdateResultRequest,
    ) -> AppResult<result::Model> {
        let existing = self
            .get_result_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test result {}", id)))?;

        let mut active: ActiveModel = existing.into();

        if let Some(v) = update.passes_total {
            active.passes_total = Set(v);
        }
        if let Some(v) = update.rut_depth_5000 {
            active.rut_depth_5000 = Set(v);
        }
        if let Some(v) = update.rut_depth_10000 {
            active.rut_depth_10000 = Set(v);
        }
        if let Some(v) = update.rut_depth_15000 {
            active.rut_depth_15000 = Set(v);
        }
        if let Some(v) = update.rut_depth_20000 {
            active.rut_depth_20000 = Set(v);
        }
        if let Some(v) = update.rut_depth_final {
            active.rut_depth_final = Set(Some(v));
        }
        if let Some(v) = update.passes_to_failure {
            active.passes_to_failure = Set(Some(v));
        }
        if let Some(v) = update.inflection_pass {
            active.inflection_pass = Set(Some(v));
        }
        if let Some(v) = update.test_duration_ms {
            active.test_duration_ms = Set(v);
        }
        if let Some(v) = update.rating {
            active.rating = Set(v);
        }
        if let Some(class) = update.rating_classification {
            active.rating_classification = Set(class.code());
        }
        active.updated_at = Set(Utc::now());

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update test result: {}", e)))?;

        Ok(result)
    }

    /// Hard-delete a result; its artifacts cascade. Returns whether a row
    /// was deleted.
    pub async fn delete_result(&self, id: Uuid) -> AppResult<bool> {
        let result = TestResult::delete_by_id(id)
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete test result: {}", e)))?;

        Ok(result.rows_affected > 0)
    }
}
