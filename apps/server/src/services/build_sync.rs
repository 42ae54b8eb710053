//! Per-job sync of the latest completed build.
//!
//! A sync moves through `SyncState` in order:
//! `New -> MetadataFetched -> {Skipped | CountsFetched} -> CasesFetched -> Persisted`.
//! Any error aborts the sync in its current state and is reported in the
//! returned `SyncOutcome` rather than propagated. The build row and its test
//! cases are written together at the end, so an aborted sync leaves the stored
//! build untouched and the next pass retries it.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::db::ResultStore;
use crate::error::AppResult;
use crate::models::{JobFrequency, NewBuildResult};

use super::cascade::{TestCaseCascade, TestCaseSource};
use super::jenkins_client::JenkinsClient;
use super::json_report::report_counts;

/// Progress of a single build sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncState {
    /// No completed build to sync
    New,
    MetadataFetched,
    /// Stored status already matches; nothing written
    Skipped,
    CountsFetched,
    CasesFetched,
    Persisted,
}

/// What happened when syncing one job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub job_name: String,
    pub build_number: Option<String>,
    pub state: SyncState,
    pub build_result_id: Option<Uuid>,
    pub test_case_count: Option<usize>,
    pub source: Option<TestCaseSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncOutcome {
    fn new(job_name: &str) -> Self {
        Self {
            job_name: job_name.to_string(),
            build_number: None,
            state: SyncState::New,
            build_result_id: None,
            test_case_count: None,
            source: None,
            error: None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Aggregate test counts for a build. Any field may be unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildCounts {
    pub total: Option<i32>,
    pub passed: Option<i32>,
    pub failed: Option<i32>,
    pub skipped: Option<i32>,
}

impl BuildCounts {
    /// From TestNG totals; passed is derived and never negative.
    pub fn from_testng(total: i32, failed: Option<i32>, skipped: Option<i32>) -> Self {
        let failed = failed.unwrap_or(0);
        let skipped = skipped.unwrap_or(0);
        Self {
            total: Some(total),
            passed: Some((total - failed - skipped).max(0)),
            failed: Some(failed),
            skipped: Some(skipped),
        }
    }

    /// From per-status counts; total is their sum.
    pub fn from_report(passed: i32, failed: i32, skipped: i32) -> Self {
        Self {
            total: Some(passed + failed + skipped),
            passed: Some(passed),
            failed: Some(failed),
            skipped: Some(skipped),
        }
    }
}

/// Syncs a job's latest completed build into the result store.
pub struct BuildSyncer {
    client: Arc<JenkinsClient>,
    store: Arc<dyn ResultStore>,
    cascade: TestCaseCascade,
}

impl BuildSyncer {
    pub fn new(
        client: Arc<JenkinsClient>,
        store: Arc<dyn ResultStore>,
        log_fallback_class: impl Into<String>,
    ) -> Self {
        let cascade = TestCaseCascade::new(client.clone(), log_fallback_class);
        Self {
            client,
            store,
            cascade,
        }
    }

    pub fn cascade(&self) -> &TestCaseCascade {
        &self.cascade
    }

    /// Sync one job. Never fails; errors are recorded in the outcome.
    pub async fn sync_job(&self, job_name: &str) -> SyncOutcome {
        let mut outcome = SyncOutcome::new(job_name);

        if let Err(e) = self.advance(job_name, &mut outcome).await {
            error!(
                "Sync of {} #{} aborted in state {:?}: {}",
                job_name,
                outcome.build_number.as_deref().unwrap_or("?"),
                outcome.state,
                e
            );
            outcome.error = Some(e.to_string());
        }

        outcome
    }

    async fn advance(&self, job_name: &str, outcome: &mut SyncOutcome) -> AppResult<()> {
        let Some(build) = self.client.latest_completed_build(job_name).await? else {
            debug!("No completed build for {}", job_name);
            return Ok(());
        };

        let build_number = build.number.to_string();
        let status = build.status();
        outcome.build_number = Some(build_number.clone());
        outcome.state = SyncState::MetadataFetched;

        if let Some(existing) = self.store.find_build(job_name, &build_number).await?
            && existing.build_status == status
        {
            info!(
                "{} #{} unchanged ({}), skipping",
                job_name, build_number, status
            );
            outcome.build_result_id = Some(existing.id);
            outcome.state = SyncState::Skipped;
            return Ok(());
        }

        let counts = self.fetch_counts(job_name, build.number).await;
        outcome.state = SyncState::CountsFetched;

        let extracted = self.cascade.run(job_name, build.number).await;
        outcome.source = extracted.source;
        outcome.state = SyncState::CasesFetched;

        let (stored, written) = self
            .store
            .save_build(
                NewBuildResult {
                    job_name: job_name.to_string(),
                    build_number: build_number.clone(),
                    build_status: status,
                    build_url: build.url.clone(),
                    build_timestamp: build.started_at(),
                    total_tests: counts.total,
                    passed_tests: counts.passed,
                    failed_tests: counts.failed,
                    skipped_tests: counts.skipped,
                    job_frequency: JobFrequency::infer(job_name),
                },
                extracted.test_cases,
            )
            .await?;
        outcome.build_result_id = Some(stored.id);
        outcome.test_case_count = Some(written);
        outcome.state = SyncState::Persisted;

        info!(
            "Synced {} #{} ({}): {} test case(s)",
            job_name, build_number, status, written
        );
        Ok(())
    }

    /// Aggregate counts from the TestNG endpoint, falling back to the test report.
    pub async fn fetch_counts(&self, job_name: &str, build_number: i64) -> BuildCounts {
        match self.client.testng_counts(job_name, build_number).await {
            Ok(counts) => {
                if let Some(total) = counts.total {
                    return BuildCounts::from_testng(total, counts.fail_count, counts.skip_count);
                }
            }
            Err(e) => debug!(
                "TestNG counts unavailable for {} #{}: {}",
                job_name, build_number, e
            ),
        }

        match self.client.test_report(job_name, build_number).await {
            Ok(report) => {
                if let Some((passed, failed, skipped)) = report_counts(&report) {
                    return BuildCounts::from_report(passed, failed, skipped);
                }
            }
            Err(e) => debug!(
                "Test report unavailable for {} #{}: {}",
                job_name, build_number, e
            ),
        }

        warn!("No aggregate counts for {} #{}", job_name, build_number);
        BuildCounts::default()
    }
}
