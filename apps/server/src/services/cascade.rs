//! Ordered fallback over the test case sources of a build.
//!
//! Sources are tried in `TestCaseSource::CASCADE` order and the first
//! non-empty result wins. A source that fails is logged and skipped.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::AppResult;
use crate::models::NewTestCase;

use super::artifact_locator::locate_result_artifacts;
use super::jenkins_client::JenkinsClient;
use super::json_report::parse_test_report;
use super::log_scanner::scan_console_log;
use super::xml_results::parse_result_xml;

/// Where a build's test cases were extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestCaseSource {
    /// TestNG/Surefire XML files among the build artifacts
    ResultArtifacts,
    /// Jenkins `testReport` JSON
    TestReport,
    /// Console output scan
    ConsoleLog,
}

impl TestCaseSource {
    /// Sources in priority order.
    pub const CASCADE: [TestCaseSource; 3] = [
        TestCaseSource::ResultArtifacts,
        TestCaseSource::TestReport,
        TestCaseSource::ConsoleLog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResultArtifacts => "result_artifacts",
            Self::TestReport => "test_report",
            Self::ConsoleLog => "console_log",
        }
    }
}

impl std::fmt::Display for TestCaseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of running the cascade for one build.
#[derive(Debug, Clone, Default)]
pub struct CascadeOutcome {
    /// Winning source; `None` when every source came up empty
    pub source: Option<TestCaseSource>,
    pub test_cases: Vec<NewTestCase>,
}

/// Extracts test cases for a build from the best available source.
pub struct TestCaseCascade {
    client: Arc<JenkinsClient>,
    log_fallback_class: String,
}

impl TestCaseCascade {
    pub fn new(client: Arc<JenkinsClient>, log_fallback_class: impl Into<String>) -> Self {
        Self {
            client,
            log_fallback_class: log_fallback_class.into(),
        }
    }

    /// Run every source in order until one yields test cases.
    pub async fn run(&self, job_name: &str, build_number: i64) -> CascadeOutcome {
        for source in TestCaseSource::CASCADE {
            match self.extract(source, job_name, build_number).await {
                Ok(cases) if !cases.is_empty() => {
                    info!(
                        "Extracted {} test case(s) for {} #{} from {}",
                        cases.len(),
                        job_name,
                        build_number,
                        source
                    );
                    return CascadeOutcome {
                        source: Some(source),
                        test_cases: cases,
                    };
                }
                Ok(_) => debug!(
                    "No test cases from {} for {} #{}",
                    source, job_name, build_number
                ),
                Err(e) => warn!(
                    "Source {} failed for {} #{}: {}",
                    source, job_name, build_number, e
                ),
            }
        }

        info!(
            "No individual test cases could be extracted for {} #{}",
            job_name, build_number
        );
        CascadeOutcome::default()
    }

    /// Extract from a single source.
    pub async fn extract(
        &self,
        source: TestCaseSource,
        job_name: &str,
        build_number: i64,
    ) -> AppResult<Vec<NewTestCase>> {
        match source {
            TestCaseSource::ResultArtifacts => {
                Ok(self.extract_result_artifacts(job_name, build_number).await)
            }
            TestCaseSource::TestReport => {
                let report = self.client.test_report(job_name, build_number).await?;
                Ok(parse_test_report(&report))
            }
            TestCaseSource::ConsoleLog => {
                let console = self.client.console_text(job_name, build_number).await?;
                Ok(scan_console_log(&console, &self.log_fallback_class))
            }
        }
    }

    /// Parse every candidate file, skipping the ones that fail.
    async fn extract_result_artifacts(&self, job_name: &str, build_number: i64) -> Vec<NewTestCase> {
        let paths = locate_result_artifacts(&self.client, job_name, build_number).await;
        let mut cases = Vec::new();

        for path in paths {
            let parsed = match self
                .client
                .download_artifact(job_name, build_number, &path)
                .await
            {
                Ok(content) => parse_result_xml(&content),
                Err(e) => Err(e),
            };

            match parsed {
                Ok(found) => {
                    debug!("{} test case(s) in {}", found.len(), path);
                    cases.extend(found);
                }
                Err(e) => warn!(
                    "Skipping artifact {} for {} #{}: {}",
                    path, job_name, build_number, e
                ),
            }
        }

        cases
    }
}
