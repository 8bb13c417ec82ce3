//! Database queries for per-pass measurements.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::test_measurement::{self as measurement, ActiveModel, Entity as Measurement};
use crate::error::{AppError, AppResult};
use crate::models::{CreateMeasurementRequest, UpdateMeasurementRequest};

use super::DbPool;

impl DbPool {
    /// Insert a measurement for a run.
    pub async fn insert_measurement(
        &self,
        req: &CreateMeasurementRequest,
    ) -> AppResult<measurement::Model> {
        let model = ActiveModel {
            test_run_id: Set(req.test_run_id),
            pass_count: Set(req.pass_count),
            rut_depth_mm: Set(req.rut_depth_mm),
            ref_depth_mm: Set(req.ref_depth_mm),
            ..Default::default()
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert measurement: {}", e)))?;

        Ok(result)
    }

    /// Get a measurement by ID.
    pub async fn get_measurement_by_id(&self, id: i64) -> AppResult<Option<measurement::Model>> {
        let result = Measurement::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get measurement: {}", e)))?;

        Ok(result)
    }

    /// All measurements for a run, ordered by ascending pass count.
    pub async fn list_measurements_for_run(
        &self,
        run_id: Uuid,
    ) -> AppResult<Vec<measurement::Model>> {
        let results = Measurement::find()
            .filter(measurement::Column::TestRunId.eq(run_id))
            .order_by_asc(measurement::Column::PassCount)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list measurements: {}", e)))?;

        Ok(results)
    }

    /// Paginated measurement listing for the admin browser, ordered by
    /// run then ascending pass count.
    pub async fn list_measurements(
        &self,
        run_id: Option<Uuid>,
        limit: u64,
        offset: u64,
    ) -> AppResult<(Vec<measurement::Model>, u64)> {
        let mut select = Measurement::find();

        if let Some(run_id) = run_id {
            select = select.filter(measurement::Column::TestRunId.eq(run_id));
        }

        let total = select
            .clone()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count measurements: {}", e)))?;

        let results = select
            .order_by_asc(measurement::Column::TestRunId)
            .order_by_asc(measurement::Column::PassCount)
            .offset(offset)
            .limit(limit)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list measurements: {}", e)))?;

        Ok((results, total))
    }

    /// Apply an admin field-level edit to a measurement.
    pub async fn update_measurement(
        &self,
        id: i64,
        update: &UpdateMeasurementRequest,
    ) -> AppResult<measurement::Model> {
        let existing = self
            .get_measurement_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Measurement {}", id)))?;

        let mut active: ActiveModel = existing.into();

        if let Some(v) = update.pass_count {
            active.pass_count = Set(v);
        }
        if let Some(v) = update.rut_depth_mm {
            active.rut_depth_mm = Set(v);
        }
        if let Some(v) = update.ref_depth_mm {
            active.ref_depth_mm = Set(Some(v));
        }

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update measurement: {}", e)))?;

        Ok(result)
    }

    /// Hard-delete a measurement. Returns whether a row was deleted.
    pub async fn delete_measurement(&self, id: i64) -> AppResult<bool> {
        let result = Measurement::delete_by_id(id)
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete measurement: {}", e)))?;

        Ok(result.rows_affected > 0)
    }
}
