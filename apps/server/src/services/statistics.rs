//! Statistics over the latest-per-job window.

use crate::models::{BuildResult, BuildStatus, SyncStatistics};

/// Reduce the latest build of each job to fleet-wide totals. Null counts add nothing.
pub fn reduce_statistics(latest: &[BuildResult]) -> SyncStatistics {
    latest
        .iter()
        .fold(SyncStatistics::default(), |mut stats, build| {
            stats.total_jobs += 1;
            match build.build_status {
                BuildStatus::Success => stats.successful_jobs += 1,
                BuildStatus::Failure => stats.failed_jobs += 1,
                _ => {}
            }
            stats.total_tests += i64::from(build.total_tests.unwrap_or(0));
            stats.passed_tests += i64::from(build.passed_tests.unwrap_or(0));
            stats.failed_tests += i64::from(build.failed_tests.unwrap_or(0));
            stats
        })
}
