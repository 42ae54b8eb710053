//! Database queries for build results.

use chrono::Utc;
use sea_orm::sea_query::{NullOrdering, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, IntoActiveModel, Order,
    QueryFilter, QueryOrder, QuerySelect, Set, Statement, TransactionTrait,
};
use uuid::Uuid;

use crate::entity::build_result::{self, ActiveModel, Entity as BuildResultEntity};
use crate::error::{AppError, AppResult};
use crate::models::{pass_percentage, BuildNotes, BuildResult, NewBuildResult, NewTestCase};

use super::test_case_results::replace_test_cases;
use super::DbPool;

const LATEST_PER_JOB_SQL: &str = r#"
    SELECT DISTINCT ON (job_name) *
    FROM build_results
    ORDER BY job_name, id DESC
"#;

impl DbPool {
    /// Find a build by its compound identity.
    pub async fn find_build_by_job_and_number(
        &self,
        job_name: &str,
        build_number: &str,
    ) -> AppResult<Option<BuildResult>> {
        let result = BuildResultEntity::find()
            .filter(build_result::Column::JobName.eq(job_name))
            .filter(build_result::Column::BuildNumber.eq(build_number))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to find build result: {}", e)))?;

        Ok(result.map(BuildResult::from))
    }

    /// Insert a build or overwrite its sync-owned columns, then replace its
    /// test cases, in one transaction.
    ///
    /// Notes and tester/project associations are left untouched on conflict.
    /// An existing row is locked first, so overlapping saves of the same build
    /// apply one after the other instead of interleaving their case writes.
    pub async fn save_build_result(
        &self,
        build: NewBuildResult,
        cases: Vec<NewTestCase>,
    ) -> AppResult<(BuildResult, usize)> {
        let txn = self
            .connection()
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        BuildResultEntity::find()
            .filter(build_result::Column::JobName.eq(build.job_name.as_str()))
            .filter(build_result::Column::BuildNumber.eq(build.build_number.as_str()))
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to lock build result: {}", e)))?;

        let stored = upsert_build(&txn, build).await?;
        let written = replace_test_cases(&txn, stored.id, cases).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit build result: {}", e)))?;

        Ok((stored.into(), written))
    }

    /// Most recent build of every job (greatest id within each job).
    pub async fn get_latest_build_results(&self) -> AppResult<Vec<BuildResult>> {
        let result = BuildResultEntity::find()
            .from_raw_sql(Statement::from_string(DbBackend::Postgres, LATEST_PER_JOB_SQL))
            .all(self.connection())
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to get latest build results: {}", e))
            })?;

        Ok(result.into_iter().map(BuildResult::from).collect())
    }

    /// Most recent build of one job by build timestamp.
    pub async fn get_latest_build_result_for_job(
        &self,
        job_name: &str,
    ) -> AppResult<Option<BuildResult>> {
        let result = BuildResultEntity::find()
            .filter(build_result::Column::JobName.eq(job_name))
            .order_by_with_nulls(
                build_result::Column::BuildTimestamp,
                Order::Desc,
                NullOrdering::Last,
            )
            .order_by_desc(build_result::Column::Id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get latest build result: {}", e)))?;

        Ok(result.map(BuildResult::from))
    }

    /// Get a build by ID.
    pub async fn get_build_result_by_id(&self, id: Uuid) -> AppResult<Option<BuildResult>> {
        let result = BuildResultEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get build result: {}", e)))?;

        Ok(result.map(BuildResult::from))
    }

    /// Set operator notes. Returns `None` if the build does not exist.
    pub async fn update_build_notes(
        &self,
        id: Uuid,
        notes: BuildNotes,
    ) -> AppResult<Option<BuildResult>> {
        let Some(existing) = BuildResultEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get build result: {}", e)))?
        else {
            return Ok(None);
        };

        let percentage = pass_percentage(existing.passed_tests, existing.total_tests);
        let mut model = existing.into_active_model();
        model.bugs_identified = Set(Some(notes.bugs_identified.unwrap_or_default()));
        model.failure_reasons = Set(Some(notes.failure_reasons.unwrap_or_default()));
        model.pass_percentage = Set(percentage);
        model.updated_at = Set(Utc::now());

        let result = model
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update build notes: {}", e)))?;

        Ok(Some(result.into()))
    }

    /// Distinct job frequency labels, sorted.
    pub async fn get_distinct_frequencies(&self) -> AppResult<Vec<String>> {
        let result = BuildResultEntity::find()
            .select_only()
            .column(build_result::Column::JobFrequency)
            .distinct()
            .order_by_asc(build_result::Column::JobFrequency)
            .into_tuple::<String>()
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list frequencies: {}", e)))?;

        Ok(result)
    }
}

/// `INSERT ... ON CONFLICT (job_name, build_number) DO UPDATE` of the sync-owned columns.
async fn upsert_build<C: ConnectionTrait>(
    db: &C,
    build: NewBuildResult,
) -> AppResult<build_result::Model> {
    let now = Utc::now();
    let percentage = build.pass_percentage();

    let model = ActiveModel {
        id: Set(Uuid::now_v7()),
        job_name: Set(build.job_name),
        build_number: Set(build.build_number),
        build_status: Set(build.build_status.as_str().to_string()),
        build_url: Set(build.build_url),
        build_timestamp: Set(build.build_timestamp),
        total_tests: Set(build.total_tests),
        passed_tests: Set(build.passed_tests),
        failed_tests: Set(build.failed_tests),
        skipped_tests: Set(build.skipped_tests),
        pass_percentage: Set(percentage),
        job_frequency: Set(build.job_frequency.as_str().to_string()),
        bugs_identified: Set(None),
        failure_reasons: Set(None),
        automation_tester_id: Set(None),
        manual_tester_id: Set(None),
        project_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let on_conflict = OnConflict::columns([
        build_result::Column::JobName,
        build_result::Column::BuildNumber,
    ])
    .update_columns([
        build_result::Column::BuildStatus,
        build_result::Column::BuildUrl,
        build_result::Column::BuildTimestamp,
        build_result::Column::TotalTests,
        build_result::Column::PassedTests,
        build_result::Column::FailedTests,
        build_result::Column::SkippedTests,
        build_result::Column::PassPercentage,
        build_result::Column::JobFrequency,
        build_result::Column::UpdatedAt,
    ])
    .to_owned();

    BuildResultEntity::insert(model)
        .on_conflict(on_conflict)
        .exec_with_returning(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to upsert build result: {}", e)))
}
