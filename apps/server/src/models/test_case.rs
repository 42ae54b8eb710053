//! Test case models and status normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::test_case_result;

/// Canonical test execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
    Unknown,
}

impl TestStatus {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Parse from the stored representation.
    pub fn parse(s: &str) -> Self {
        match s {
            "PASSED" => Self::Passed,
            "FAILED" => Self::Failed,
            "SKIPPED" => Self::Skipped,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Map a source-specific status token to the canonical status.
///
/// Matching is case-insensitive. Returns the upper-cased token alongside
/// `Unknown` when the token is non-empty but not recognized, so it can be kept
/// for diagnostics.
pub fn normalize_status(token: Option<&str>) -> (TestStatus, Option<String>) {
    let upper = match token.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_uppercase(),
        _ => return (TestStatus::Unknown, None),
    };

    let status = match upper.as_str() {
        "PASS" | "PASSED" | "FIXED" => TestStatus::Passed,
        "FAIL" | "FAILED" | "REGRESSION" => TestStatus::Failed,
        "SKIP" | "SKIPPED" => TestStatus::Skipped,
        _ => return (TestStatus::Unknown, Some(upper)),
    };

    (status, None)
}

/// A test case extracted from a build, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTestCase {
    pub class_name: String,
    pub test_name: String,
    pub status: TestStatus,
    /// Original token when `status` is `Unknown`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_status: Option<String>,
    pub duration_seconds: Option<f64>,
    pub error_message: Option<String>,
    pub stack_trace: Option<String>,
}

impl NewTestCase {
    pub const UNKNOWN_NAME: &'static str = "Unknown";

    /// Create a test case, substituting `Unknown` for blank names.
    pub fn new(class_name: Option<&str>, test_name: Option<&str>, status: TestStatus) -> Self {
        Self {
            class_name: name_or_unknown(class_name),
            test_name: name_or_unknown(test_name),
            status,
            raw_status: None,
            duration_seconds: None,
            error_message: None,
            stack_trace: None,
        }
    }
}

fn name_or_unknown(name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => NewTestCase::UNKNOWN_NAME.to_string(),
    }
}

/// A stored test case result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseResult {
    pub id: Uuid,
    pub build_result_id: Uuid,
    pub class_name: String,
    pub test_name: String,
    pub status: TestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_status: Option<String>,
    pub duration_seconds: Option<f64>,
    pub error_message: Option<String>,
    pub stack_trace: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<test_case_result::Model> for TestCaseResult {
    fn from(m: test_case_result::Model) -> Self {
        Self {
            id: m.id,
            build_result_id: m.build_result_id,
            class_name: m.class_name,
            test_name: m.test_name,
            status: TestStatus::parse(&m.status),
            raw_status: m.raw_status,
            duration_seconds: m.duration_seconds,
            error_message: m.error_message,
            stack_trace: m.stack_trace,
            created_at: m.created_at,
        }
    }
}

impl From<TestCaseResult> for NewTestCase {
    fn from(stored: TestCaseResult) -> Self {
        Self {
            class_name: stored.class_name,
            test_name: stored.test_name,
            status: stored.status,
            raw_status: stored.raw_status,
            duration_seconds: stored.duration_seconds,
            error_message: stored.error_message,
            stack_trace: stored.stack_trace,
        }
    }
}

/// Per-status tally over a list of test cases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TestCaseCounts {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl TestCaseCounts {
    pub fn tally<'a>(statuses: impl IntoIterator<Item = &'a TestStatus>) -> Self {
        let mut counts = Self::default();
        for status in statuses {
            counts.total += 1;
            match status {
                TestStatus::Passed => counts.passed += 1,
                TestStatus::Failed => counts.failed += 1,
                TestStatus::Skipped => counts.skipped += 1,
                TestStatus::Unknown => {}
            }
        }
        counts
    }
}
