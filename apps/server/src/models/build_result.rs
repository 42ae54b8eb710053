//! Build result domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::build_result;

/// Outcome of a CI build as reported by Jenkins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildStatus {
    Success,
    Failure,
    Unstable,
    Aborted,
    InProgress,
    Unknown,
}

impl BuildStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Unstable => "UNSTABLE",
            Self::Aborted => "ABORTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Map the Jenkins `result` field. A null result means the build is still running.
    pub fn from_jenkins(result: Option<&str>) -> Self {
        match result {
            None => Self::InProgress,
            Some(r) => Self::parse(r),
        }
    }

    /// Parse from string representation.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "SUCCESS" => Self::Success,
            "FAILURE" => Self::Failure,
            "UNSTABLE" => Self::Unstable,
            "ABORTED" => Self::Aborted,
            "IN_PROGRESS" => Self::InProgress,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How often a job runs, guessed from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobFrequency {
    Hourly,
    Daily,
    Weekly,
    Monthly,
    #[serde(rename = "On Demand")]
    OnDemand,
    Continuous,
    Unknown,
}

impl JobFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "Hourly",
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::OnDemand => "On Demand",
            Self::Continuous => "Continuous",
            Self::Unknown => "Unknown",
        }
    }

    /// Classify a job by case-insensitive keywords in its name. First rule wins.
    pub fn infer(job_name: &str) -> Self {
        let name = job_name.to_lowercase();
        let has = |keys: &[&str]| keys.iter().any(|k| name.contains(k));

        if has(&["hourly"]) {
            Self::Hourly
        } else if has(&["daily", "nightly"]) {
            Self::Daily
        } else if has(&["weekly"]) {
            Self::Weekly
        } else if has(&["monthly"]) {
            Self::Monthly
        } else if has(&["manual", "ondemand", "trigger"]) {
            Self::OnDemand
        } else if has(&["continuous", "ci", "commit"]) {
            Self::Continuous
        } else {
            Self::Unknown
        }
    }
}

impl std::fmt::Display for JobFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rounded (half-up) pass rate in percent; 0 when there are no tests.
pub fn pass_percentage(passed: Option<i32>, total: Option<i32>) -> i32 {
    let total = i64::from(total.unwrap_or(0));
    if total <= 0 {
        return 0;
    }
    let passed = i64::from(passed.unwrap_or(0));
    ((100 * passed + total / 2) / total) as i32
}

/// Build fields owned by the sync pipeline, written on every upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBuildResult {
    pub job_name: String,
    pub build_number: String,
    pub build_status: BuildStatus,
    pub build_url: Option<String>,
    pub build_timestamp: Option<DateTime<Utc>>,
    pub total_tests: Option<i32>,
    pub passed_tests: Option<i32>,
    pub failed_tests: Option<i32>,
    pub skipped_tests: Option<i32>,
    pub job_frequency: JobFrequency,
}

impl NewBuildResult {
    pub fn pass_percentage(&self) -> i32 {
        pass_percentage(self.passed_tests, self.total_tests)
    }
}

/// Operator-entered annotations on a build.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildNotes {
    pub bugs_identified: Option<String>,
    pub failure_reasons: Option<String>,
}

/// A stored build result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResult {
    pub id: Uuid,
    pub job_name: String,
    pub build_number: String,
    pub build_status: BuildStatus,
    pub build_url: Option<String>,
    pub build_timestamp: Option<DateTime<Utc>>,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<build_result::Model> for BuildResult {
    fn from(m: build_result::Model) -> Self {
        Self {
            id: m.id,
            job_name: m.job_name,
            build_number: m.build_number,
            build_status: BuildStatus::parse(&m.build_status),
            build_url: m.build_url,
            build_timestamp: m.build_timestamp,
            total_tests: m.total_tests,
            passed_tests: m.passed_tests,
            failed_tests: m.failed_tests,
            skipped_tests: m.skipped_tests,
            pass_percentage: m.pass_percentage,
            job_frequency: m.job_frequency,
            bugs_identified: m.bugs_identified,
            failure_reasons: m.failure_reasons,
            automation_tester_id: m.automation_tester_id,
            manual_tester_id: m.manual_tester_id,
            project_id: m.project_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
