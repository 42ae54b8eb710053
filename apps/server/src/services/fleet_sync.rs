//! Sync of every job known to Jenkins, plus the periodic background task.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::error::AppResult;

use super::build_sync::{BuildSyncer, SyncOutcome, SyncState};
use super::jenkins_client::JenkinsClient;

/// Summary of one fleet pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetSyncReport {
    /// Always "completed"; per-job failures are listed in `outcomes`
    pub status: &'static str,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub job_count: usize,
    pub persisted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcomes: Vec<SyncOutcome>,
}

/// Runs `BuildSyncer` over all jobs with bounded concurrency.
pub struct FleetSync {
    client: Arc<JenkinsClient>,
    syncer: Arc<BuildSyncer>,
    concurrency: usize,
}

impl FleetSync {
    pub fn new(client: Arc<JenkinsClient>, syncer: Arc<BuildSyncer>, concurrency: usize) -> Self {
        Self {
            client,
            syncer,
            concurrency: concurrency.max(1),
        }
    }

    /// Sync every job once. Fails only if the job list cannot be fetched.
    pub async fn run(&self) -> AppResult<FleetSyncReport> {
        let started_at = Utc::now();
        let jobs = self.client.list_job_names().await?;
        info!(
            "Starting fleet sync of {} job(s) (concurrency {})",
            jobs.len(),
            self.concurrency
        );

        let syncer = &self.syncer;
        let outcomes: Vec<SyncOutcome> = futures_util::stream::iter(jobs)
            .map(|job| async move { syncer.sync_job(&job).await })
            .buffered(self.concurrency)
            .collect()
            .await;

        let count = |state: SyncState| outcomes.iter().filter(|o| o.state == state).count();
        let persisted = count(SyncState::Persisted);
        let skipped = count(SyncState::Skipped);
        let failed = outcomes.iter().filter(|o| o.is_failure()).count();

        let report = FleetSyncReport {
            status: "completed",
            started_at,
            finished_at: Utc::now(),
            job_count: outcomes.len(),
            persisted,
            skipped,
            failed,
            outcomes,
        };

        if report.failed > 0 {
            warn!(
                "Fleet sync completed with {} failed job(s) of {}",
                report.failed, report.job_count
            );
        } else {
            info!(
                "Fleet sync completed: {} persisted, {} skipped",
                report.persisted, report.skipped
            );
        }

        Ok(report)
    }
}

/// Start the periodic fleet sync task.
///
/// The first pass runs immediately, then once per `period`.
pub fn start_sync_task(fleet: Arc<FleetSync>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting sync service (interval: {} seconds)", period.as_secs());

        let mut ticker = interval(period);

        loop {
            ticker.tick().await;

            if let Err(e) = fleet.run().await {
                error!("Fleet sync error: {}", e);
            }
        }
    })
}
