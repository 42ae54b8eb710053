//! Domain models for CI build results.

pub mod build_result;
pub mod stats;
pub mod test_case;

// Re-export commonly used types
pub use build_result::{
    pass_percentage, BuildNotes, BuildResult, BuildStatus, JobFrequency, NewBuildResult,
};
pub use stats::SyncStatistics;
pub use test_case::{normalize_status, NewTestCase, TestCaseCounts, TestCaseResult, TestStatus};
