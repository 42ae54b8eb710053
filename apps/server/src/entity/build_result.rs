//! BuildResult entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "build_results")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub job_name: String,
    pub build_number: String,
    /// SUCCESS, FAILURE, UNSTABLE, ABORTED, IN_PROGRESS, UNKNOWN
    pub build_status: String,
    pub build_url: Option<String>,
    pub build_timestamp: Option<DateTimeUtc>,
    pub total_tests: Option<i32>,
    pub passed_tests: Option<i32>,
    pub failed_tests: Option<i32>,
    pub skipped_tests: Option<i32>,
    pub pass_percentage: i32,
    pub job_frequency: String,
    pub bugs_identified: Option<String>,
    pub failure_reasons: Option<String>,
    pub automation_tester_id: Option<i64>,
    pub manual_tester_id: Option<i64>,
    pub project_id: Option<i64>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::test_case_result::Entity")]
    TestCaseResults,
}

impl Related<super::test_case_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TestCaseResults.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
