//! TestCaseResult entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "test_case_results")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub build_result_id: Uuid,
    pub class_name: String,
    pub test_name: String,
    pub status: String,
    /// Unrecognized source status token, upper-cased
    pub raw_status: Option<String>,
    #[sea_orm(column_type = "Double", nullable)]
    pub duration_seconds: Option<f64>,
    pub error_message: Option<String>,
    pub stack_trace: Option<String>,
    /// Extraction order within the build
    pub sequence: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::build_result::Entity",
        from = "Column::BuildResultId",
        to = "super::build_result::Column::Id",
        on_delete = "Cascade"
    )]
    BuildResult,
}

impl Related<super::build_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BuildResult.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
