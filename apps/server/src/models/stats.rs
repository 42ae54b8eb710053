//! Aggregate statistics over the latest build of every job.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatistics {
    pub total_jobs: i64,
    pub successful_jobs: i64,
    pub failed_jobs: i64,
    pub total_tests: i64,
    pub passed_tests: i64,
    pub failed_tests: i64,
}
