//! Test run domain models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::measurement::MeasurementResponse;
use crate::models::test_result::ResultResponse;
use crate::models::{Pagination, PaginationParams};

/// Test run lifecycle status.
///
/// Runs are created as `Pending`; the remaining states belong to the
/// analysis pipeline, which is out of scope here and reachable only
/// through administrative edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    /// Integer code stored in the database.
    pub fn code(&self) -> i16 {
        match self {
            Self::Pending => 1,
            Self::Running => 2,
            Self::Completed => 3,
            Self::Failed => 4,
        }
    }

    /// Parse from the stored integer code.
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::Pending),
            2 => Some(Self::Running),
            3 => Some(Self::Completed),
            4 => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input file type for a test run.
///
/// A closed set of variants instead of a free-text field; adding a format
/// means adding a variant here plus extending the CHECK constraint in a
/// follow-up migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InputFileType {
    Csv,
    Xlsx,
    Json,
}

impl InputFileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Json => "json",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Expected filename extension for uploads of this type.
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

impl std::fmt::Display for InputFileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validated input for creating a test run, parsed from the multipart form.
#[derive(Debug, Clone)]
pub struct CreateRunInput {
    pub specimen: String,
    pub binder_grade: String,
    pub file_type: InputFileType,
    pub allowed_rut_depth: f64,
    pub notes: Option<String>,
}

impl CreateRunInput {
    /// Validate field constraints. Failures are reported to the caller
    /// and nothing is persisted.
    pub fn validate(&self) -> AppResult<()> {
        if self.specimen.trim().is_empty() {
            return Err(AppError::InvalidInput("specimen is required".to_string()));
        }
        if self.specimen.len() > 255 {
            return Err(AppError::InvalidInput(
                "specimen must be at most 255 characters".to_string(),
            ));
        }
        if self.binder_grade.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "binder_grade is required".to_string(),
            ));
        }
        if self.binder_grade.len() > 100 {
            return Err(AppError::InvalidInput(
                "binder_grade must be at most 100 characters".to_string(),
            ));
        }
        if !self.allowed_rut_depth.is_finite() || self.allowed_rut_depth < 0.0 {
            return Err(AppError::InvalidInput(
                "allowed_rut_depth must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Query parameters for listing the caller's runs.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ListRunsQuery {
    /// Status filter ("pending", "running", "completed", "failed").
    pub status: Option<String>,
    /// Only runs created at or after this instant.
    pub created_after: Option<DateTime<Utc>>,
    /// Only runs created before this instant.
    pub created_before: Option<DateTime<Utc>>,
    /// Page number (default 1).
    pub page: Option<u32>,
    /// Page size (default 50, max 100).
    pub limit: Option<u32>,
}

impl ListRunsQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            limit: self.limit,
        }
    }

    /// Resolve the status filter to a stored code, rejecting unknown values.
    pub fn status_filter(&self) -> AppResult<Option<RunStatus>> {
        match self.status.as_deref() {
            None => Ok(None),
            Some(s) => RunStatus::parse(s)
                .map(Some)
                .ok_or_else(|| AppError::InvalidInput(format!("Unknown status '{}'", s))),
        }
    }
}

/// Query parameters for the admin run browser.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AdminListRunsQuery {
    /// Status filter ("pending", "running", "completed", "failed").
    pub status: Option<String>,
    /// File type filter ("csv", "xlsx", "json").
    pub file_type: Option<String>,
    /// Restrict to a single owner.
    pub user_id: Option<Uuid>,
    /// Substring search over specimen, binder grade, and notes.
    pub search: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    /// Page number (default 1).
    pub page: Option<u32>,
    /// Page size (default 50, max 100).
    pub limit: Option<u32>,
}

impl AdminListRunsQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Marks a present field, keeping `null` distinguishable from absence.
fn clearable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Admin field-level edit of a run. Timestamps are server-managed and
/// not editable; absent fields are left unchanged. For the nullable
/// columns (`notes`, `errors`), an explicit `null` clears the value
/// while an absent field keeps it.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AdminUpdateRunRequest {
    pub specimen: Option<String>,
    pub binder_grade: Option<String>,
    pub allowed_rut_depth: Option<f64>,
    #[serde(default, deserialize_with = "clearable")]
    pub notes: Option<Option<String>>,
    pub status: Option<RunStatus>,
    #[serde(default, deserialize_with = "clearable")]
    pub errors: Option<Option<String>>,
    pub analysis_version: Option<i32>,
}

impl AdminUpdateRunRequest {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(ref s) = self.specimen {
            if s.trim().is_empty() || s.len() > 255 {
                return Err(AppError::InvalidInput(
                    "specimen must be 1-255 characters".to_string(),
                ));
            }
        }
        if let Some(ref b) = self.binder_grade {
            if b.trim().is_empty() || b.len() > 100 {
                return Err(AppError::InvalidInput(
                    "binder_grade must be 1-100 characters".to_string(),
                ));
            }
        }
        if let Some(depth) = self.allowed_rut_depth {
            if !depth.is_finite() || depth < 0.0 {
                return Err(AppError::InvalidInput(
                    "allowed_rut_depth must be a non-negative number".to_string(),
                ));
            }
        }
        if let Some(v) = self.analysis_version {
            if v < 1 {
                return Err(AppError::InvalidInput(
                    "analysis_version must be at least 1".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Summary of a test run for list views.
#[derive(Debug, Serialize, ToSchema)]
pub struct RunSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub specimen: String,
    pub binder_grade: String,
    pub file_type: String,
    pub allowed_rut_depth: f64,
    pub status: RunStatus,
    pub analysis_version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entity::test_run::Model> for RunSummary {
    fn from(m: crate::entity::test_run::Model) -> Self {
        RunSummary {
            id: m.id,
            user_id: m.user_id,
            specimen: m.specimen,
            binder_grade: m.binder_grade,
            file_type: m.file_type,
            allowed_rut_depth: m.allowed_rut_depth,
            status: RunStatus::from_code(m.status).unwrap_or(RunStatus::Pending),
            analysis_version: m.analysis_version,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Paginated run list response.
#[derive(Debug, Serialize, ToSchema)]
pub struct RunListResponse {
    pub runs: Vec<RunSummary>,
    pub pagination: Pagination,
}

/// Full detail for one run: metadata plus nested result, artifacts, and
/// measurements ordered by ascending pass count.
#[derive(Debug, Serialize, ToSchema)]
pub struct RunDetailResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub specimen: String,
    pub binder_grade: String,
    pub file_type: String,
    pub allowed_rut_depth: f64,
    pub notes: Option<String>,
    pub file_path: String,
    pub status: RunStatus,
    pub errors: Option<String>,
    pub analysis_version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub result: Option<ResultResponse>,
    pub measurements: Vec<MeasurementResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> CreateRunInput {
        CreateRunInput {
            specimen: "S1".to_string(),
            binder_grade: "PG64-22".to_string(),
            file_type: InputFileType::Csv,
            allowed_rut_depth: 6.0,
            notes: None,
        }
    }

    #[test]
    fn test_status_codes_round_trip() {
        for status in [
            RunStatus::Pending,
            RunStatus::Running,
            RunStatus::Completed,
            RunStatus::Failed,
        ] {
            assert_eq!(RunStatus::from_code(status.code()), Some(status));
            assert_eq!(RunStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RunStatus::from_code(0), None);
        assert_eq!(RunStatus::from_code(5), None);
        assert_eq!(RunStatus::parse("done"), None);
    }

    #[test]
    fn test_file_type_is_closed() {
        assert_eq!(InputFileType::parse("csv"), Some(InputFileType::Csv));
        assert_eq!(InputFileType::parse("xlsx"), Some(InputFileType::Xlsx));
        assert_eq!(InputFileType::parse("json"), Some(InputFileType::Json));
        assert_eq!(InputFileType::parse("txt"), None);
        assert_eq!(InputFileType::parse("CSV"), None);
    }

    #[test]
    fn test_create_input_valid() {
        assert!(valid_input().validate().is_ok());
    }

    #[test]
    fn test_create_input_rejects_negative_rut_depth() {
        let mut input = valid_input();
        input.allowed_rut_depth = -0.1;
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_create_input_rejects_nan_rut_depth() {
        let mut input = valid_input();
        input.allowed_rut_depth = f64::NAN;
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_create_input_rejects_missing_specimen() {
        let mut input = valid_input();
        input.specimen = "  ".to_string();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_admin_update_rejects_negative_depth() {
        let req = AdminUpdateRunRequest {
            specimen: None,
            binder_grade: None,
            allowed_rut_depth: Some(-1.0),
            notes: None,
            status: None,
            errors: None,
            analysis_version: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_admin_update_distinguishes_null_from_absent() {
        let req: AdminUpdateRunRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.notes, None);
        assert_eq!(req.errors, None);

        let req: AdminUpdateRunRequest =
            serde_json::from_str(r#"{"notes": null, "errors": null}"#).unwrap();
        assert_eq!(req.notes, Some(None));
        assert_eq!(req.errors, Some(None));

        let req: AdminUpdateRunRequest =
            serde_json::from_str(r#"{"notes": "rerun after calibration"}"#).unwrap();
        assert_eq!(req.notes, Some(Some("rerun after calibration".to_string())));
        assert_eq!(req.errors, None);
    }
}
