//! E2E tests: syncing a single job.

use std::sync::Arc;

use base64::Engine;
use secrecy::SecretString;
use serde_json::json;

use ci_results_lib::db::ResultStore;
use ci_results_lib::models::{BuildNotes, BuildStatus, TestStatus};
use ci_results_lib::services::{BuildSyncer, JenkinsClient, SyncState, TestCaseSource};

use super::memory_store::MemoryStore;
use super::mock_jenkins::{BUILD_TIMESTAMP_MS, MockJenkins};
use super::test_helpers::*;

/// Serve a TestNG results file for `job` #`number` through the manifest.
fn serve_testng(mock: &MockJenkins, job: &str, number: i64) {
    mock.artifacts(
        job,
        number,
        &[("testng-results.xml", "target/surefire-reports/testng-results.xml")],
    );
    mock.artifact(
        job,
        number,
        "target/surefire-reports/testng-results.xml",
        TESTNG_BOOM_XML,
    );
}

/// (1) New completed build with counts and XML results is persisted.
#[actix_rt::test]
async fn test_new_build_is_persisted() {
    let mock = MockJenkins::start().await;
    mock.add_build("nightly-login", 42, "UNSTABLE");
    mock.testng_counts("nightly-login", 42, 3, 1, 0);
    serve_testng(&mock, "nightly-login", 42);

    let store = Arc::new(MemoryStore::new());
    let outcome = syncer_for(&mock, store.clone()).sync_job("nightly-login").await;

    assert!(!outcome.is_failure(), "sync failed: {:?}", outcome.error);
    assert_eq!(outcome.state, SyncState::Persisted);
    assert_eq!(outcome.build_number.as_deref(), Some("42"));
    assert_eq!(outcome.test_case_count, Some(1));
    assert_eq!(outcome.source, Some(TestCaseSource::ResultArtifacts));

    let build = store.build("nightly-login", "42").expect("build stored");
    assert_eq!(outcome.build_result_id, Some(build.id));
    assert_eq!(build.build_status, BuildStatus::Unstable);
    assert_eq!(build.total_tests, Some(3));
    assert_eq!(build.passed_tests, Some(2));
    assert_eq!(build.failed_tests, Some(1));
    assert_eq!(build.skipped_tests, Some(0));
    assert_eq!(build.pass_percentage, 67);
    assert_eq!(build.job_frequency, "Daily");
    assert_eq!(
        build.build_timestamp.map(|t| t.timestamp_millis()),
        Some(BUILD_TIMESTAMP_MS)
    );
    assert_eq!(
        build.build_url,
        Some(format!("{}/job/nightly-login/42/", mock.base_url))
    );

    let cases = store.cases("nightly-login", "42");
    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].class_name, "com.x.Y");
    assert_eq!(cases[0].status, TestStatus::Failed);
    assert_eq!(cases[0].error_message.as_deref(), Some("boom"));
}

/// (2) Re-syncing an unchanged build writes nothing.
#[actix_rt::test]
async fn test_unchanged_build_is_skipped() {
    let mock = MockJenkins::start().await;
    mock.add_build("nightly-login", 42, "UNSTABLE");
    mock.testng_counts("nightly-login", 42, 3, 1, 0);
    serve_testng(&mock, "nightly-login", 42);

    let store = Arc::new(MemoryStore::new());
    let syncer = syncer_for(&mock, store.clone());

    let first = syncer.sync_job("nightly-login").await;
    assert_eq!(first.state, SyncState::Persisted);
    let before = store.build("nightly-login", "42").unwrap();

    let second = syncer.sync_job("nightly-login").await;
    assert_eq!(second.state, SyncState::Skipped);
    assert_eq!(second.build_result_id, Some(before.id));
    assert_eq!(second.source, None);
    assert!(!second.is_failure());

    let after = store.build("nightly-login", "42").unwrap();
    assert_eq!(after.updated_at, before.updated_at);
    assert_eq!(store.build_writes(), 1);
    assert_eq!(store.case_writes(), 1);
    assert_eq!(store.cases("nightly-login", "42").len(), 1);

    // No counts or artifacts were fetched the second time
    assert_eq!(
        mock.request_count("GET", "/job/nightly-login/42/testngreports/api/json"),
        1
    );
}

/// (3) A status change on the same build number replaces the test cases.
#[actix_rt::test]
async fn test_status_change_replaces_test_cases() {
    let mock = MockJenkins::start().await;
    mock.add_build("checkout", 8, "FAILURE");
    serve_testng(&mock, "checkout", 8);

    let store = Arc::new(MemoryStore::new());
    let syncer = syncer_for(&mock, store.clone());
    assert_eq!(syncer.sync_job("checkout").await.state, SyncState::Persisted);
    let original = store.build("checkout", "8").unwrap();

    store
        .update_notes(
            original.id,
            BuildNotes {
                bugs_identified: Some("JIRA-12".to_string()),
                failure_reasons: Some("flaky gateway".to_string()),
            },
        )
        .await
        .unwrap();

    // Rebuilt in place with different results
    mock.add_build("checkout", 8, "SUCCESS");
    mock.artifacts(
        "checkout",
        8,
        &[("TEST-com.acme.ApiTest.xml", "target/surefire-reports/TEST-com.acme.ApiTest.xml")],
    );
    mock.artifact(
        "checkout",
        8,
        "target/surefire-reports/TEST-com.acme.ApiTest.xml",
        SUREFIRE_XML,
    );

    let outcome = syncer.sync_job("checkout").await;
    assert_eq!(outcome.state, SyncState::Persisted);
    assert_eq!(outcome.test_case_count, Some(2));

    let updated = store.build("checkout", "8").unwrap();
    assert_eq!(updated.id, original.id);
    assert_eq!(updated.build_status, BuildStatus::Success);
    assert_eq!(updated.bugs_identified.as_deref(), Some("JIRA-12"));
    assert_eq!(updated.failure_reasons.as_deref(), Some("flaky gateway"));

    let names: Vec<String> = store
        .cases("checkout", "8")
        .into_iter()
        .map(|c| c.test_name)
        .collect();
    assert_eq!(names, vec!["getsUser", "deletesUser"]);
}

/// (4) A job without a completed build stays in `New` and is not an error.
#[actix_rt::test]
async fn test_job_without_completed_build() {
    let mock = MockJenkins::start().await;
    mock.json(
        "/job/fresh-job/api/json",
        json!({ "name": "fresh-job", "lastCompletedBuild": null }),
    );

    let store = Arc::new(MemoryStore::new());
    let outcome = syncer_for(&mock, store.clone()).sync_job("fresh-job").await;

    assert_eq!(outcome.state, SyncState::New);
    assert!(!outcome.is_failure());
    assert_eq!(outcome.build_number, None);
    assert_eq!(store.build_writes(), 0);
}

/// (5) A Jenkins error is captured in the outcome instead of propagated.
#[actix_rt::test]
async fn test_network_error_recorded_in_outcome() {
    let mock = MockJenkins::start().await;
    mock.status("/job/broken/api/json", 503);

    let store = Arc::new(MemoryStore::new());
    let outcome = syncer_for(&mock, store.clone()).sync_job("broken").await;

    assert!(outcome.is_failure());
    assert_eq!(outcome.state, SyncState::New);
    assert!(outcome.error.as_deref().unwrap().contains("503"));
    assert_eq!(store.build_writes(), 0);
}

/// (6) Without TestNG counts, totals come from the test report.
#[actix_rt::test]
async fn test_counts_fall_back_to_test_report() {
    let mock = MockJenkins::start().await;
    mock.add_build("payments-api", 5, "UNSTABLE");
    mock.test_report(
        "payments-api",
        5,
        json!({
            "passCount": 5, "failCount": 1, "skipCount": 2,
            "suites": [{ "cases": [
                { "className": "p.A", "name": "charges", "status": "PASSED", "duration": 0.2 },
                { "className": "p.A", "name": "refunds", "status": "REGRESSION",
                  "errorDetails": "expected 200" }
            ]}]
        }),
    );

    let store = Arc::new(MemoryStore::new());
    let outcome = syncer_for(&mock, store.clone()).sync_job("payments-api").await;

    assert_eq!(outcome.state, SyncState::Persisted);
    assert_eq!(outcome.source, Some(TestCaseSource::TestReport));

    let build = store.build("payments-api", "5").unwrap();
    assert_eq!(build.total_tests, Some(8));
    assert_eq!(build.passed_tests, Some(5));
    assert_eq!(build.failed_tests, Some(1));
    assert_eq!(build.skipped_tests, Some(2));
    assert_eq!(build.pass_percentage, 63);

    let cases = store.cases("payments-api", "5");
    assert_eq!(cases.len(), 2);
    assert_eq!(cases[1].status, TestStatus::Failed);
    assert_eq!(cases[1].error_message.as_deref(), Some("expected 200"));
}

/// (7) No counts anywhere leaves them unknown with a zero pass percentage.
#[actix_rt::test]
async fn test_missing_counts_stay_unknown() {
    let mock = MockJenkins::start().await;
    mock.add_build("reports", 2, "SUCCESS");
    mock.console("reports", 2, "testcases.reports.DailyIT.renders PASSED\n");

    let store = Arc::new(MemoryStore::new());
    let outcome = syncer_for(&mock, store.clone()).sync_job("reports").await;

    assert_eq!(outcome.state, SyncState::Persisted);
    assert_eq!(outcome.source, Some(TestCaseSource::ConsoleLog));

    let build = store.build("reports", "2").unwrap();
    assert_eq!(build.total_tests, None);
    assert_eq!(build.passed_tests, None);
    assert_eq!(build.pass_percentage, 0);
    assert_eq!(build.job_frequency, "Unknown");
}

/// (8) Configured credentials are sent as HTTP basic auth on every request.
#[actix_rt::test]
async fn test_basic_auth_sent_on_every_request() {
    let mock = MockJenkins::start().await;
    mock.add_build("secured", 1, "SUCCESS");
    mock.testng_counts("secured", 1, 1, 0, 0);
    serve_testng(&mock, "secured", 1);

    let mut settings = settings_for(&mock);
    settings.username = Some("ci-bot".to_string());
    settings.token = Some(SecretString::from("s3cret".to_string()));
    let client = Arc::new(JenkinsClient::new(&settings).unwrap());

    let store = Arc::new(MemoryStore::new());
    let syncer = BuildSyncer::new(client, store, LOG_FALLBACK_CLASS);
    assert_eq!(syncer.sync_job("secured").await.state, SyncState::Persisted);

    let expected = format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode("ci-bot:s3cret")
    );
    let requests = mock.requests();
    assert!(!requests.is_empty());
    for request in requests {
        assert_eq!(
            request.authorization.as_deref(),
            Some(expected.as_str()),
            "{} {}",
            request.method,
            request.target
        );
    }
}

/// (9) A failed save leaves the old build and cases in place, and the next sync retries.
#[actix_rt::test]
async fn test_failed_save_is_retried_on_next_sync() {
    let mock = MockJenkins::start().await;
    mock.add_build("checkout", 8, "FAILURE");
    serve_testng(&mock, "checkout", 8);

    let store = Arc::new(MemoryStore::new());
    let syncer = syncer_for(&mock, store.clone());
    assert_eq!(syncer.sync_job("checkout").await.state, SyncState::Persisted);

    // Rebuilt in place as a success with two Surefire cases
    mock.add_build("checkout", 8, "SUCCESS");
    mock.artifacts(
        "checkout",
        8,
        &[("TEST-com.acme.ApiTest.xml", "target/surefire-reports/TEST-com.acme.ApiTest.xml")],
    );
    mock.artifact(
        "checkout",
        8,
        "target/surefire-reports/TEST-com.acme.ApiTest.xml",
        SUREFIRE_XML,
    );

    store.fail_next_save("connection reset");
    let first = syncer.sync_job("checkout").await;
    assert!(first.is_failure());
    assert_eq!(first.state, SyncState::CasesFetched);
    assert!(first.error.as_deref().unwrap().contains("connection reset"));
    assert_eq!(first.build_result_id, None);

    let unchanged = store.build("checkout", "8").unwrap();
    assert_eq!(unchanged.build_status, BuildStatus::Failure);
    assert_eq!(store.cases("checkout", "8").len(), 1);

    let second = syncer.sync_job("checkout").await;
    assert!(!second.is_failure(), "retry failed: {:?}", second.error);
    assert_eq!(second.state, SyncState::Persisted);
    assert_eq!(second.test_case_count, Some(2));

    let updated = store.build("checkout", "8").unwrap();
    assert_eq!(updated.id, unchanged.id);
    assert_eq!(updated.build_status, BuildStatus::Success);
    assert_eq!(store.cases("checkout", "8").len(), 2);
}

/// (10) A failed save of a brand-new build stores nothing at all.
#[actix_rt::test]
async fn test_failed_save_of_new_build_stores_nothing() {
    let mock = MockJenkins::start().await;
    mock.add_build("nightly-login", 42, "UNSTABLE");
    mock.testng_counts("nightly-login", 42, 3, 1, 0);
    serve_testng(&mock, "nightly-login", 42);

    let store = Arc::new(MemoryStore::new());
    let syncer = syncer_for(&mock, store.clone());

    store.fail_next_save("connection reset");
    let first = syncer.sync_job("nightly-login").await;
    assert_eq!(first.state, SyncState::CasesFetched);
    assert!(store.build("nightly-login", "42").is_none());
    assert_eq!(store.build_writes(), 0);

    let second = syncer.sync_job("nightly-login").await;
    assert_eq!(second.state, SyncState::Persisted);
    assert_eq!(store.cases("nightly-login", "42").len(), 1);
}
