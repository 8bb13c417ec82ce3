//! Per-pass measurement models and DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Request to record a measurement for a run (admin console).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateMeasurementRequest {
    pub test_run_id: Uuid,
    pub pass_count: i32,
    pub rut_depth_mm: f64,
    pub ref_depth_mm: Option<f64>,
}

impl CreateMeasurementRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.pass_count < 0 {
            return Err(AppError::InvalidInput(
                "pass_count must be non-negative".to_string(),
            ));
        }
        if !self.rut_depth_mm.is_finite() || self.rut_depth_mm < 0.0 {
            return Err(AppError::InvalidInput(
                "rut_depth_mm must be a non-negative number".to_string(),
            ));
        }
        if let Some(v) = self.ref_depth_mm {
            if !v.is_finite() || v < 0.0 {
                return Err(AppError::InvalidInput(
                    "ref_depth_mm must be a non-negative number".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Admin field-level edit of a measurement; absent fields are left unchanged.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateMeasurementRequest {
    pub pass_count: Option<i32>,
    pub rut_depth_mm: Option<f64>,
    pub ref_depth_mm: Option<f64>,
}

impl UpdateMeasurementRequest {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(v) = self.pass_count {
            if v < 0 {
                return Err(AppError::InvalidInput(
                    "pass_count must be non-negative".to_string(),
                ));
            }
        }
        for (name, value) in [
            ("rut_depth_mm", self.rut_depth_mm),
            ("ref_depth_mm", self.ref_depth_mm),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(AppError::InvalidInput(format!(
                        "{} must be a non-negative number",
                        name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// A single recorded pass measurement.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeasurementResponse {
    pub id: i64,
    pub test_run_id: Uuid,
    pub pass_count: i32,
    pub rut_depth_mm: f64,
    pub ref_depth_mm: Option<f64>,
}

impl From<crate::entity::test_measurement::Model> for MeasurementResponse {
    fn from(m: crate::entity::test_measurement::Model) -> Self {
        MeasurementResponse {
            id: m.id,
            test_run_id: m.test_run_id,
            pass_count: m.pass_count,
            rut_depth_mm: m.rut_depth_mm,
            ref_depth_mm: m.ref_depth_mm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurement_valid() {
        let req = CreateMeasurementRequest {
            test_run_id: Uuid::now_v7(),
            pass_count: 5000,
            rut_depth_mm: 1.8,
            ref_depth_mm: Some(0.2),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_measurement_rejects_negative_pass_count() {
        let req = CreateMeasurementRequest {
            test_run_id: Uuid::now_v7(),
            pass_count: -1,
            rut_depth_mm: 1.8,
            ref_depth_mm: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_measurement_rejects_negative_depth() {
        let req = CreateMeasurementRequest {
            test_run_id: Uuid::now_v7(),
            pass_count: 100,
            rut_depth_mm: -0.1,
            ref_depth_mm: None,
        };
        assert!(req.validate().is_err());
    }
}
