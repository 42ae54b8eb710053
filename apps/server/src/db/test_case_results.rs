//! Database queries for test case results.

use chrono::Utc;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::test_case_result::{self, ActiveModel, Entity as TestCaseEntity};
use crate::error::{AppError, AppResult};
use crate::models::{NewTestCase, TestCaseResult};

use super::DbPool;

/// Rows per INSERT statement, well under the Postgres bind parameter limit.
const INSERT_CHUNK_SIZE: usize = 500;

/// Delete every test case of a build, then insert `cases` in extraction order.
///
/// Runs on the caller's connection; callers pass a transaction so the
/// replace is atomic. Returns the number of rows inserted.
pub(super) async fn replace_test_cases<C: ConnectionTrait>(
    db: &C,
    build_result_id: Uuid,
    cases: Vec<NewTestCase>,
) -> AppResult<usize> {
    TestCaseEntity::delete_many()
        .filter(test_case_result::Column::BuildResultId.eq(build_result_id))
        .exec(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to delete test cases: {}", e)))?;

    let count = cases.len();
    let now = Utc::now();
    let mut models = cases
        .into_iter()
        .enumerate()
        .map(|(sequence, case)| ActiveModel {
            id: Set(Uuid::now_v7()),
            build_result_id: Set(build_result_id),
            class_name: Set(case.class_name),
            test_name: Set(case.test_name),
            status: Set(case.status.as_str().to_string()),
            raw_status: Set(case.raw_status),
            duration_seconds: Set(case.duration_seconds),
            error_message: Set(case.error_message),
            stack_trace: Set(case.stack_trace),
            sequence: Set(sequence as i32),
            created_at: Set(now),
        })
        .peekable();

    while models.peek().is_some() {
        let chunk: Vec<ActiveModel> = models.by_ref().take(INSERT_CHUNK_SIZE).collect();
        TestCaseEntity::insert_many(chunk)
            .exec(db)
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert test cases: {}", e)))?;
    }

    Ok(count)
}

impl DbPool {
    /// Test cases of a build in extraction order.
    pub async fn get_test_case_results(
        &self,
        build_result_id: Uuid,
    ) -> AppResult<Vec<TestCaseResult>> {
        let result = TestCaseEntity::find()
            .filter(test_case_result::Column::BuildResultId.eq(build_result_id))
            .order_by_asc(test_case_result::Column::Sequence)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get test cases: {}", e)))?;

        Ok(result.into_iter().map(TestCaseResult::from).collect())
    }
}
