//! Aggregated test result entity. At most one row per test run,
//! enforced by a unique index on `test_run_id`.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "test_results")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
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
    /// Classification code, see `models::RatingClass` (EXCELLENT=1 .. POOR=4).
    pub rating_classification: i16,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::test_run::Entity",
        from = "Column::TestRunId",
        to = "super::test_run::Column::Id",
        on_delete = "Cascade"
    )]
    TestRun,
    #[sea_orm(has_many = "super::test_artifact::Entity")]
    Artifacts,
}

impl Related<super::test_run::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TestRun.def()
    }
}

impl Related<super::test_artifact::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Artifacts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
