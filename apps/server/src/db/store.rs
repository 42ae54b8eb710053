//! Storage abstraction used by the sync pipeline.

use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{BuildNotes, BuildResult, NewBuildResult, NewTestCase, TestCaseResult};

use super::DbPool;

/// Persistence operations needed to sync and query build results.
#[async_trait::async_trait]
pub trait ResultStore: Send + Sync {
    async fn find_build(&self, job_name: &str, build_number: &str)
        -> AppResult<Option<BuildResult>>;

    /// Insert or update the build by `(job_name, build_number)` and replace
    /// all of its test cases with `cases`, atomically.
    ///
    /// Returns the stored build and the number of test cases written.
    async fn save_build(
        &self,
        build: NewBuildResult,
        cases: Vec<NewTestCase>,
    ) -> AppResult<(BuildResult, usize)>;

    async fn latest_builds_per_job(&self) -> AppResult<Vec<BuildResult>>;

    async fn latest_build_for_job(&self, job_name: &str) -> AppResult<Option<BuildResult>>;

    async fn get_build(&self, id: Uuid) -> AppResult<Option<BuildResult>>;

    async fn test_cases_for_build(&self, build_result_id: Uuid) -> AppResult<Vec<TestCaseResult>>;

    async fn update_notes(&self, id: Uuid, notes: BuildNotes) -> AppResult<Option<BuildResult>>;

    async fn list_frequencies(&self) -> AppResult<Vec<String>>;
}

#[async_trait::async_trait]
impl ResultStore for DbPool {
    async fn find_build(
        &self,
        job_name: &str,
        build_number: &str,
    ) -> AppResult<Option<BuildResult>> {
        self.find_build_by_job_and_number(job_name, build_number)
            .await
    }

    async fn save_build(
        &self,
        build: NewBuildResult,
        cases: Vec<NewTestCase>,
    ) -> AppResult<(BuildResult, usize)> {
        self.save_build_result(build, cases).await
    }

    async fn latest_builds_per_job(&self) -> AppResult<Vec<BuildResult>> {
        self.get_latest_build_results().await
    }

    async fn latest_build_for_job(&self, job_name: &str) -> AppResult<Option<BuildResult>> {
        self.get_latest_build_result_for_job(job_name).await
    }

    async fn get_build(&self, id: Uuid) -> AppResult<Option<BuildResult>> {
        self.get_build_result_by_id(id).await
    }

    async fn test_cases_for_build(&self, build_result_id: Uuid) -> AppResult<Vec<TestCaseResult>> {
        self.get_test_case_results(build_result_id).await
    }

    async fn update_notes(&self, id: Uuid, notes: BuildNotes) -> AppResult<Option<BuildResult>> {
        self.update_build_notes(id, notes).await
    }

    async fn list_frequencies(&self) -> AppResult<Vec<String>> {
        self.get_distinct_frequencies().await
    }
}
