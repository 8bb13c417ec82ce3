//! Domain models for the wheel-tracking test server.

use utoipa::ToSchema;

pub mod artifact;
pub mod measurement;
pub mod test_result;
pub mod test_run;
pub mod user;

// Re-export commonly used types
pub use artifact::{ArtifactKind, ArtifactResponse, CreateArtifactRequest, UpdateArtifactRequest};
pub use measurement::{CreateMeasurementRequest, MeasurementResponse, UpdateMeasurementRequest};
pub use test_result::{
    CreateResultRequest, RatingClass, ResultResponse, UpdateResultRequest,
};
pub use test_run::{
    AdminListRunsQuery, AdminUpdateRunRequest, CreateRunInput, InputFileType, ListRunsQuery,
    RunDetailResponse, RunListResponse, RunStatus, RunSummary,
};
pub use user::{LoginRequest, SignupRequest, UserResponse, UserRole};

/// Pagination parameters.
#[derive(Debug, Clone, serde::Deserialize, ToSchema)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    50
}

impl PaginationParams {
    /// Calculate the offset for database queries. Saturates instead of
    /// overflowing for out-of-range page numbers.
    pub fn offset(&self) -> u32 {
        let page = self.page.unwrap_or(default_page()).max(1);
        let limit = self.clamped_limit();
        page.saturating_sub(1).saturating_mul(limit)
    }

    /// Clamp limit to maximum allowed value.
    pub fn clamped_limit(&self) -> u32 {
        self.limit.unwrap_or(default_limit()).clamp(1, 100)
    }

    /// The effective page number.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(default_page()).max(1)
    }
}

/// Pagination metadata for responses.
#[derive(Debug, Clone, serde::Serialize, ToSchema)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Pagination {
    /// Create pagination metadata.
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            ((total as f64) / (limit as f64)).ceil() as u32
        };

        Pagination {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_offset() {
        let params = PaginationParams {
            page: Some(3),
            limit: Some(20),
        };
        assert_eq!(params.offset(), 40);
        assert_eq!(params.clamped_limit(), 20);
    }

    #[test]
    fn test_pagination_offset_saturates_on_huge_page() {
        let params = PaginationParams {
            page: Some(u32::MAX),
            limit: Some(100),
        };
        assert_eq!(params.offset(), u32::MAX);
    }

    #[test]
    fn test_pagination_limit_clamped() {
        let params = PaginationParams {
            page: None,
            limit: Some(100_000),
        };
        assert_eq!(params.clamped_limit(), 100);
    }

    #[test]
    fn test_pagination_total_pages() {
        assert_eq!(Pagination::new(1, 10, 0).total_pages, 0);
        assert_eq!(Pagination::new(1, 10, 10).total_pages, 1);
        assert_eq!(Pagination::new(1, 10, 11).total_pages, 2);
    }
}
