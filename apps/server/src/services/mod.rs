//! Business logic services.

pub mod artifact_locator;
pub mod build_sync;
pub mod cascade;
pub mod ci_results;
pub mod fleet_sync;
pub mod jenkins_client;
pub mod json_report;
pub mod log_scanner;
pub mod sanitize;
pub mod statistics;
pub mod xml_results;

pub use build_sync::{BuildSyncer, SyncOutcome, SyncState};
pub use cascade::{CascadeOutcome, TestCaseCascade, TestCaseSource};
pub use ci_results::{CiResultsService, DetailedTestCases};
pub use fleet_sync::{start_sync_task, FleetSync, FleetSyncReport};
pub use jenkins_client::JenkinsClient;
