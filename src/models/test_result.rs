//! Aggregated test result models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::artifact::ArtifactResponse;

/// Bucketed rating category for a completed test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RatingClass {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl RatingClass {
    /// Integer code stored in the database.
    pub fn code(&self) -> i16 {
        match self {
            Self::Excellent => 1,
            Self::Good => 2,
            Self::Fair => 3,
            Self::Poor => 4,
        }
    }

    /// Parse from the stored integer code.
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::Excellent),
            2 => Some(Self::Good),
            3 => Some(Self::Fair),
            4 => Some(Self::Poor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "excellent" => Some(Self::Excellent),
            "good" => Some(Self::Good),
            "fair" => Some(Self::Fair),
            "poor" => Some(Self::Poor),
            _ => None,
        }
    }
}

impl std::fmt::Display for RatingClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request to create the aggregated result for a run (admin console).
///
/// The analysis pipeline that would produce these numbers is not part of
/// this server; rows are entered and corrected administratively.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateResultRequest {
    pub test_run_id: Uuid,
    pub passes_total: i64,
    pub rut_depth_5000: f64,
    pub rut_depth_10000: f64,
    pub rut_depth_15000: f64,
    pub rut_depth_20000: f64,
    pub rut_depth_final: Option<f64>,
    pub passes_to_failure: Option<f64>,
    pub inflection_pass: Option<i64>,
    pub test_duration_ms: i64,
    pub rating: f64,
    pub rating_classification: RatingClass,
}

fn check_non_negative(name: &'static str, value: f64) -> AppResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::InvalidInput(format!(
            "{} must be a non-negative number",
            name
        )));
    }
    Ok(())
}

impl CreateResultRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.passes_total < 0 {
            return Err(AppError::InvalidInput(
                "passes_total must be non-negative".to_string(),
            ));
        }
        check_non_negative("rut_depth_5000", self.rut_depth_5000)?;
        check_non_negative("rut_depth_10000", self.rut_depth_10000)?;
        check_non_negative("rut_depth_15000", self.rut_depth_15000)?;
        check_non_negative("rut_depth_20000", self.rut_depth_20000)?;
        if let Some(v) = self.rut_depth_final {
            check_non_negative("rut_depth_final", v)?;
        }
        if let Some(v) = self.passes_to_failure {
            check_non_negative("passes_to_failure", v)?;
        }
        if let Some(v) = self.inflection_pass {
            if v < 0 {
                return Err(AppError::InvalidInput(
                    "inflection_pass must be non-negative".to_string(),
                ));
            }
        }
        if self.test_duration_ms < 0 {
            return Err(AppError::InvalidInput(
                "test_duration_ms must be non-negative".to_string(),
            ));
        }
        if !self.rating.is_finite() {
            return Err(AppError::InvalidInput(
                "rating must be a finite number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Admin field-level edit of a result; absent fields are left unchanged.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateResultRequest {
    pub passes_total: Option<i64>,
    pub rut_depth_5000: Option<f64>,
    pub rut_depth_10000: Option<f64>,
    pub rut_depth_15000: Option<f64>,
    pub rut_depth_20000: Option<f64>,
    pub rut_depth_final: Option<f64>,
    pub passes_to_failure: Option<f64>,
    pub inflection_pass: Option<i64>,
    pub test_duration_ms: Option<i64>,
    pub rating: Option<f64>,
    pub rating_classification: Option<RatingClass>,
}

impl UpdateResultRequest {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(v) = self.passes_total {
            if v < 0 {
                return Err(AppError::InvalidInput(
                    "passes_total must be non-negative".to_string(),
                ));
            }
        }
        for (name, value) in [
            ("rut_depth_5000", self.rut_depth_5000),
            ("rut_depth_10000", self.rut_depth_10000),
            ("rut_depth_15000", self.rut_depth_15000),
            ("rut_depth_20000", self.rut_depth_20000),
            ("rut_depth_final", self.rut_depth_final),
            ("passes_to_failure", self.passes_to_failure),
        ] {
            if let Some(v) = value {
                check_non_negative(name, v)?;
            }
        }
        if let Some(v) = self.inflection_pass {
            if v < 0 {
                return Err(AppError::InvalidInput(
                    "inflection_pass must be non-negative".to_string(),
                ));
            }
        }
        if let Some(v) = self.test_duration_ms {
            if v < 0 {
                return Err(AppError::InvalidInput(
                    "test_duration_ms must be non-negative".to_string(),
                ));
            }
        }
        if let Some(v) = self.rating {
            if !v.is_finite() {
                return Err(AppError::InvalidInput(
                    "rating must be a finite number".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Aggregated result for a run, with its artifacts.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResultResponse {
    pub id: Uuid,
    pub test_run_id: Uuid,
    pub passes_total: i64,
    pub rut_depth_5000: f64,
    pub rut_depth_10000: f64,
    pub rut_depth_15000: f64,
    pub rut_depth_20000: f64,
    pub rut_depth_final: Option<f64>,
    pub passes_to_failure: Option<f64>,
    pub inflection_pass: Option<i64>,
    pub test_duration_ms: i64,
    pub rating: f64,
    pub rating_classification: RatingClass,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub artifacts: Vec<ArtifactResponse>,
}

impl ResultResponse {
    /// Build from an entity row plus its artifacts.
    pub fn from_model(
        m: crate::entity::test_result::Model,
        artifacts: Vec<ArtifactResponse>,
    ) -> Self {
        ResultResponse {
            id: m.id,
            test_run_id: m.test_run_id,
            passes_total: m.passes_total,
            rut_depth_5000: m.rut_depth_5000,
            rut_depth_10000: m.rut_depth_10000,
            rut_depth_15000: m.rut_depth_15000,
            rut_depth_20000: m.rut_depth_20000,
            rut_depth_final: m.rut_depth_final,
            passes_to_failure: m.passes_to_failure,
            inflection_pass: m.inflection_pass,
            test_duration_ms: m.test_duration_ms,
            rating: m.rating,
            rating_classification: RatingClass::from_code(m.rating_classification)
                .unwrap_or(RatingClass::Poor),
            created_at: m.created_at,
            updated_at: m.updated_at,
            artifacts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateResultRequest {
        CreateResultRequest {
            test_run_id: Uuid::now_v7(),
            passes_total: 20000,
            rut_depth_5000: 1.2,
            rut_depth_10000: 2.1,
            rut_depth_15000: 2.9,
            rut_depth_20000: 3.4,
            rut_depth_final: Some(3.5),
            passes_to_failure: None,
            inflection_pass: Some(12000),
            test_duration_ms: 7_200_000,
            rating: 87.5,
            rating_classification: RatingClass::Good,
        }
    }

    #[test]
    fn test_rating_class_codes_round_trip() {
        for class in [
            RatingClass::Excellent,
            RatingClass::Good,
            RatingClass::Fair,
            RatingClass::Poor,
        ] {
            assert_eq!(RatingClass::from_code(class.code()), Some(class));
            assert_eq!(RatingClass::parse(class.as_str()), Some(class));
        }
        assert_eq!(RatingClass::from_code(0), None);
        assert_eq!(RatingClass::from_code(5), None);
    }

    #[test]
    fn test_create_result_valid() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn test_create_result_rejects_negative_milestone() {
        let mut req = valid_request();
        req.rut_depth_10000 = -0.5;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_result_rejects_negative_passes() {
        let mut req = valid_request();
        req.passes_total = -1;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_result_rejects_infinite_rating() {
        let req = UpdateResultRequest {
            passes_total: None,
            rut_depth_5000: None,
            rut_depth_10000: None,
            rut_depth_15000: None,
            rut_depth_20000: None,
            rut_depth_final: None,
            passes_to_failure: None,
            inflection_pass: None,
            test_duration_ms: None,
            rating: Some(f64::INFINITY),
            rating_classification: None,
        };
        assert!(req.validate().is_err());
    }
}
