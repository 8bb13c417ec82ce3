//! Artifact models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Kind of generated artifact attached to a test result.
///
/// A closed set of variants instead of a free-text field; adding a kind
/// means adding a variant here plus extending the CHECK constraint in a
/// follow-up migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Image,
    Video,
    Report,
    Log,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Report => "report",
            Self::Log => "log",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "report" => Some(Self::Report),
            "log" => Some(Self::Log),
            _ => None,
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request to attach an artifact to a result (admin console).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateArtifactRequest {
    pub test_result_id: Uuid,
    pub kind: ArtifactKind,
    /// File path or URL to the artifact.
    pub path: String,
}

impl CreateArtifactRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.path.trim().is_empty() {
            return Err(AppError::InvalidInput("path is required".to_string()));
        }
        if self.path.len() > 500 {
            return Err(AppError::InvalidInput(
                "path must be at most 500 characters".to_string(),
            ));
        }
        Ok(())
    }
}

/// Admin field-level edit of an artifact; absent fields are left unchanged.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateArtifactRequest {
    pub kind: Option<ArtifactKind>,
    pub path: Option<String>,
}

impl UpdateArtifactRequest {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(ref p) = self.path {
            if p.trim().is_empty() || p.len() > 500 {
                return Err(AppError::InvalidInput(
                    "path must be 1-500 characters".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// An artifact row for browse and detail views.
#[derive(Debug, Serialize, ToSchema)]
pub struct ArtifactResponse {
    pub id: Uuid,
    pub test_result_id: Uuid,
    pub kind: ArtifactKind,
    pub path: String,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::test_artifact::Model> for ArtifactResponse {
    fn from(m: crate::entity::test_artifact::Model) -> Self {
        ArtifactResponse {
            id: m.id,
            test_result_id: m.test_result_id,
            kind: ArtifactKind::parse(&m.kind).unwrap_or(ArtifactKind::Report),
            path: m.path,
            created_at: m.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_kind_is_closed() {
        assert_eq!(ArtifactKind::parse("image"), Some(ArtifactKind::Image));
        assert_eq!(ArtifactKind::parse("video"), Some(ArtifactKind::Video));
        assert_eq!(ArtifactKind::parse("report"), Some(ArtifactKind::Report));
        assert_eq!(ArtifactKind::parse("log"), Some(ArtifactKind::Log));
        assert_eq!(ArtifactKind::parse("archive"), None);
    }

    #[test]
    fn test_create_artifact_rejects_empty_path() {
        let req = CreateArtifactRequest {
            test_result_id: Uuid::now_v7(),
            kind: ArtifactKind::Image,
            path: "".to_string(),
        };
        assert!(req.validate().is_err());
    }
}
