//! Test run entity: one row per initiated wheel-tracking test.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "test_runs")]
pub struct Model {
    /// UUIDv7 for time-ordered sorting.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub specimen: String,
    pub binder_grade: String,
    /// Closed enum, see `models::InputFileType` ("csv", "xlsx", "json").
    pub file_type: String,
    pub allowed_rut_depth: f64,
    pub notes: Option<String>,
    /// Path of the stored test data file, relative to the data directory.
    pub file_path: String,
    /// Status code, see `models::RunStatus` (PENDING=1 .. FAILED=4).
    pub status: i16,
    pub errors: Option<String>,
    pub analysis_version: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::test_result::Entity")]
    Results,
    #[sea_orm(has_many = "super::test_measurement::Entity")]
    Measurements,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::test_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Results.def()
    }
}

impl Related<super::test_measurement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Measurements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
