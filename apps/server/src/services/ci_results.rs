//! Entry points for syncing and querying CI build results.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::db::ResultStore;
use crate::error::{AppError, AppResult};
use crate::models::{
    BuildNotes, BuildResult, NewTestCase, SyncStatistics, TestCaseCounts, TestCaseResult,
};

use super::build_sync::{BuildSyncer, SyncOutcome};
use super::fleet_sync::{FleetSync, FleetSyncReport};
use super::jenkins_client::JenkinsClient;
use super::statistics::reduce_statistics;

/// Test cases of one build with per-status counts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedTestCases {
    pub job_name: String,
    pub build_number: String,
    /// `stored`, a cascade source name, or `none`
    pub source: String,
    #[serde(flatten)]
    pub counts: TestCaseCounts,
    pub test_cases: Vec<NewTestCase>,
}

/// Sync and query service over one Jenkins server and one result store.
pub struct CiResultsService {
    client: Arc<JenkinsClient>,
    store: Arc<dyn ResultStore>,
    syncer: Arc<BuildSyncer>,
    fleet: Arc<FleetSync>,
}

impl CiResultsService {
    pub fn new(
        client: Arc<JenkinsClient>,
        store: Arc<dyn ResultStore>,
        log_fallback_class: impl Into<String>,
        concurrency: usize,
    ) -> Self {
        let syncer = Arc::new(BuildSyncer::new(
            client.clone(),
            store.clone(),
            log_fallback_class,
        ));
        let fleet = Arc::new(FleetSync::new(client.clone(), syncer.clone(), concurrency));
        Self {
            client,
            store,
            syncer,
            fleet,
        }
    }

    /// Build the service from configuration.
    pub fn from_config(config: &Config, store: Arc<dyn ResultStore>) -> AppResult<Self> {
        let client = Arc::new(JenkinsClient::new(&config.jenkins)?);
        Ok(Self::new(
            client,
            store,
            config.sync.log_fallback_class.clone(),
            config.sync.concurrency,
        ))
    }

    pub fn fleet(&self) -> Arc<FleetSync> {
        self.fleet.clone()
    }

    /// Sync the latest completed build of every job.
    pub async fn sync_all_jobs(&self) -> AppResult<FleetSyncReport> {
        self.fleet.run().await
    }

    /// Sync the latest completed build of one job.
    pub async fn sync_job(&self, job_name: &str) -> SyncOutcome {
        self.syncer.sync_job(job_name).await
    }

    /// Latest stored build of every job.
    pub async fn get_latest_results(&self) -> AppResult<Vec<BuildResult>> {
        self.store.latest_builds_per_job().await
    }

    pub async fn get_statistics(&self) -> AppResult<SyncStatistics> {
        let latest = self.store.latest_builds_per_job().await?;
        Ok(reduce_statistics(&latest))
    }

    /// Stored test cases of a build.
    pub async fn get_test_cases(&self, build_result_id: Uuid) -> AppResult<Vec<TestCaseResult>> {
        if self.store.get_build(build_result_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Build result {}",
                build_result_id
            )));
        }
        self.store.test_cases_for_build(build_result_id).await
    }

    /// Stored build of a job with the most recent build timestamp.
    pub async fn get_latest_result_by_job(&self, job_name: &str) -> AppResult<BuildResult> {
        self.store
            .latest_build_for_job(job_name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Build result for job {}", job_name)))
    }

    /// Record operator notes on a build.
    pub async fn update_notes(&self, id: Uuid, notes: BuildNotes) -> AppResult<BuildResult> {
        let updated = self
            .store
            .update_notes(id, notes)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Build result {}", id)))?;
        info!("Updated notes on {} #{}", updated.job_name, updated.build_number);
        Ok(updated)
    }

    /// Distinct job frequency labels across stored builds.
    pub async fn list_frequencies(&self) -> AppResult<Vec<String>> {
        self.store.list_frequencies().await
    }

    /// True when the Jenkins server answers.
    pub async fn test_connection(&self) -> bool {
        match self.client.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Jenkins connection test failed: {}", e);
                false
            }
        }
    }

    /// Test cases of a build: stored ones if any, otherwise extracted live without persisting.
    pub async fn get_detailed_test_cases(
        &self,
        job_name: &str,
        build_number: &str,
    ) -> AppResult<DetailedTestCases> {
        if let Some(build) = self.store.find_build(job_name, build_number).await? {
            let stored = self.store.test_cases_for_build(build.id).await?;
            if !stored.is_empty() {
                let test_cases: Vec<NewTestCase> =
                    stored.into_iter().map(NewTestCase::from).collect();
                return Ok(detailed(job_name, build_number, "stored", test_cases));
            }
        }

        let number: i64 = build_number.trim().parse().map_err(|_| {
            AppError::InvalidInput(format!("Build number must be numeric: {}", build_number))
        })?;

        let outcome = self.syncer.cascade().run(job_name, number).await;
        let source = outcome.source.map(|s| s.as_str()).unwrap_or("none");
        Ok(detailed(job_name, build_number, source, outcome.test_cases))
    }
}

fn detailed(
    job_name: &str,
    build_number: &str,
    source: &str,
    test_cases: Vec<NewTestCase>,
) -> DetailedTestCases {
    DetailedTestCases {
        job_name: job_name.to_string(),
        build_number: build_number.to_string(),
        source: source.to_string(),
        counts: TestCaseCounts::tally(test_cases.iter().map(|c| &c.status)),
        test_cases,
    }
}
