//! E2E tests: latest-build queries and frequency labels.

use chrono::{TimeZone, Utc};

use ci_results_lib::models::BuildStatus;

use super::test_helpers::*;

/// Latest-per-job returns one row per job: the most recently created build.
#[actix_rt::test]
async fn test_latest_per_job_with_two_builds_of_one_job() {
    let pool = create_test_pool().await;
    let api = unique_job("nightly-api");
    let ui = unique_job("weekly-ui");

    pool.save_build_result(new_build(&api, "41", BuildStatus::Failure, 1, 2), Vec::new())
        .await
        .unwrap();
    let (newer, _) = pool
        .save_build_result(new_build(&api, "42", BuildStatus::Success, 2, 2), Vec::new())
        .await
        .unwrap();
    let (only_ui, _) = pool
        .save_build_result(new_build(&ui, "7", BuildStatus::Unstable, 3, 4), Vec::new())
        .await
        .unwrap();

    let latest = pool.get_latest_build_results().await.unwrap();
    let ours: Vec<_> = latest
        .iter()
        .filter(|b| b.job_name == api || b.job_name == ui)
        .collect();
    assert_eq!(ours.len(), 2);

    let api_latest = ours.iter().find(|b| b.job_name == api).unwrap();
    assert_eq!(api_latest.id, newer.id);
    assert_eq!(api_latest.build_number, "42");
    let ui_latest = ours.iter().find(|b| b.job_name == ui).unwrap();
    assert_eq!(ui_latest.id, only_ui.id);
    assert_eq!(ui_latest.pass_percentage, 75);
}

/// Latest for one job follows the build timestamp; undated builds sort last.
#[actix_rt::test]
async fn test_latest_for_job_orders_by_timestamp() {
    let pool = create_test_pool().await;
    let job = unique_job("daily-billing");

    let mut older = new_build(&job, "9", BuildStatus::Success, 1, 1);
    older.build_timestamp = Some(Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap());
    let mut newer = new_build(&job, "10", BuildStatus::Failure, 0, 1);
    newer.build_timestamp = Some(Utc.with_ymd_and_hms(2026, 10, 2, 8, 0, 0).unwrap());
    let undated = new_build(&job, "11", BuildStatus::Aborted, 0, 0);

    // Saved out of order
    pool.save_build_result(newer, Vec::new()).await.unwrap();
    pool.save_build_result(older, Vec::new()).await.unwrap();
    pool.save_build_result(undated, Vec::new()).await.unwrap();

    let latest = pool
        .get_latest_build_result_for_job(&job)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.build_number, "10");

    let missing = pool
        .get_latest_build_result_for_job(&unique_job("never-built"))
        .await
        .unwrap();
    assert!(missing.is_none());
}

/// Frequency labels are listed once each.
#[actix_rt::test]
async fn test_distinct_frequencies() {
    let pool = create_test_pool().await;
    pool.save_build_result(
        new_build(&unique_job("weekly-a"), "1", BuildStatus::Success, 1, 1),
        Vec::new(),
    )
    .await
    .unwrap();
    pool.save_build_result(
        new_build(&unique_job("weekly-b"), "1", BuildStatus::Success, 1, 1),
        Vec::new(),
    )
    .await
    .unwrap();
    pool.save_build_result(
        new_build(&unique_job("hourly-a"), "1", BuildStatus::Success, 1, 1),
        Vec::new(),
    )
    .await
    .unwrap();

    let labels = pool.get_distinct_frequencies().await.unwrap();
    assert_eq!(labels.iter().filter(|l| *l == "Weekly").count(), 1);
    assert!(labels.contains(&"Hourly".to_string()));
}
