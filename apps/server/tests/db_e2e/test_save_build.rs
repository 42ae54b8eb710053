//! E2E tests: saving a build together with its test cases.

use chrono::{TimeZone, Utc};

use ci_results_lib::db::ResultStore;
use ci_results_lib::models::{BuildNotes, BuildStatus, NewTestCase, TestStatus};

use super::test_helpers::*;

/// A second save of the same build overwrites sync columns and keeps notes.
#[actix_rt::test]
async fn test_upsert_keeps_notes_and_recomputes_percentage() {
    let pool = create_test_pool().await;
    let job = unique_job("nightly-orders");

    let (first, written) = pool
        .save_build_result(
            new_build(&job, "12", BuildStatus::Failure, 1, 3),
            passing_cases("first", 1),
        )
        .await
        .unwrap();
    assert_eq!(written, 1);
    assert_eq!(first.pass_percentage, 33);
    assert_eq!(first.job_frequency, "Daily");

    pool.update_build_notes(
        first.id,
        BuildNotes {
            bugs_identified: Some("ORD-7".to_string()),
            failure_reasons: Some("payment stub down".to_string()),
        },
    )
    .await
    .unwrap()
    .expect("build exists");

    let mut rebuilt = new_build(&job, "12", BuildStatus::Success, 3, 3);
    rebuilt.build_timestamp = Some(Utc.with_ymd_and_hms(2026, 10, 18, 2, 0, 0).unwrap());
    let (second, _) = pool
        .save_build_result(rebuilt, passing_cases("second", 3))
        .await
        .unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.build_status, BuildStatus::Success);
    assert_eq!(second.passed_tests, Some(3));
    assert_eq!(second.pass_percentage, 100);
    assert_eq!(second.bugs_identified.as_deref(), Some("ORD-7"));
    assert_eq!(second.failure_reasons.as_deref(), Some("payment stub down"));
    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at >= first.updated_at);
    assert_eq!(
        second.build_timestamp,
        Some(Utc.with_ymd_and_hms(2026, 10, 18, 2, 0, 0).unwrap())
    );

    let found = pool
        .find_build_by_job_and_number(&job, "12")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.bugs_identified.as_deref(), Some("ORD-7"));
    assert_eq!(found.pass_percentage, 100);
}

/// Saving replaces the whole case set; nothing from the previous save survives.
#[actix_rt::test]
async fn test_save_fully_replaces_test_cases() {
    let pool = create_test_pool().await;
    let job = unique_job("weekly-ui");

    let (build, _) = pool
        .save_build_result(
            new_build(&job, "3", BuildStatus::Unstable, 4, 5),
            passing_cases("old", 5),
        )
        .await
        .unwrap();

    let replacement = vec![
        NewTestCase {
            class_name: "ui.LoginIT".to_string(),
            test_name: "rejectsBadPassword".to_string(),
            status: TestStatus::Failed,
            raw_status: None,
            duration_seconds: Some(1.5),
            error_message: Some("  expected 401\n".to_string()),
            stack_trace: Some("java.lang.AssertionError\n\tat ui.LoginIT".to_string()),
        },
        NewTestCase {
            class_name: "ui.LoginIT".to_string(),
            test_name: "acceptsGoodPassword".to_string(),
            status: TestStatus::Unknown,
            raw_status: Some("FLAKY".to_string()),
            duration_seconds: None,
            error_message: None,
            stack_trace: None,
        },
    ];
    let (_, written) = pool
        .save_build_result(new_build(&job, "3", BuildStatus::Failure, 0, 2), replacement)
        .await
        .unwrap();
    assert_eq!(written, 2);

    let cases = pool.get_test_case_results(build.id).await.unwrap();
    let names: Vec<&str> = cases.iter().map(|c| c.test_name.as_str()).collect();
    assert_eq!(names, vec!["rejectsBadPassword", "acceptsGoodPassword"]);
    assert!(cases.iter().all(|c| c.build_result_id == build.id));
    assert_eq!(cases[0].status, TestStatus::Failed);
    assert_eq!(cases[0].error_message.as_deref(), Some("  expected 401\n"));
    assert_eq!(cases[1].status, TestStatus::Unknown);
    assert_eq!(cases[1].raw_status.as_deref(), Some("FLAKY"));

    // An empty extraction clears the cases
    let (_, written) = pool
        .save_build_result(new_build(&job, "3", BuildStatus::Aborted, 0, 0), Vec::new())
        .await
        .unwrap();
    assert_eq!(written, 0);
    assert!(pool.get_test_case_results(build.id).await.unwrap().is_empty());
}

/// Large case sets are written across several INSERT statements, in order.
#[actix_rt::test]
async fn test_save_large_case_set_keeps_order() {
    let pool = create_test_pool().await;
    let job = unique_job("hourly-smoke");

    let (build, written) = pool
        .save_build_result(
            new_build(&job, "900", BuildStatus::Success, 1203, 1203),
            passing_cases("case", 1203),
        )
        .await
        .unwrap();
    assert_eq!(written, 1203);

    let cases = pool.get_test_case_results(build.id).await.unwrap();
    assert_eq!(cases.len(), 1203);
    assert_eq!(cases[0].test_name, "case0");
    assert_eq!(cases[499].test_name, "case499");
    assert_eq!(cases[500].test_name, "case500");
    assert_eq!(cases[1202].test_name, "case1202");
}

/// Overlapping saves of one build leave exactly one save's cases.
#[actix_rt::test]
async fn test_overlapping_saves_do_not_mix_cases() {
    let pool = create_test_pool().await;
    let job = unique_job("nightly-race");

    pool.save_build_result(
        new_build(&job, "5", BuildStatus::Failure, 0, 1),
        passing_cases("seed", 1),
    )
    .await
    .unwrap();

    let left = pool.clone();
    let right = pool.clone();
    let (a, b) = tokio::join!(
        left.save_build_result(
            new_build(&job, "5", BuildStatus::Success, 40, 40),
            passing_cases("left", 40),
        ),
        right.save_build_result(
            new_build(&job, "5", BuildStatus::Unstable, 30, 30),
            passing_cases("right", 30),
        ),
    );
    let (build, _) = a.unwrap();
    b.unwrap();

    let cases = pool.get_test_case_results(build.id).await.unwrap();
    let from_left = cases.iter().filter(|c| c.test_name.starts_with("left")).count();
    let from_right = cases.iter().filter(|c| c.test_name.starts_with("right")).count();
    assert!(
        (from_left, from_right) == (40, 0) || (from_left, from_right) == (0, 30),
        "mixed case sets: {} left, {} right",
        from_left,
        from_right
    );

    let stored = pool
        .find_build_by_job_and_number(&job, "5")
        .await
        .unwrap()
        .unwrap();
    let expected_status = if from_left == 40 {
        BuildStatus::Success
    } else {
        BuildStatus::Unstable
    };
    assert_eq!(stored.build_status, expected_status);
}

/// The store seam persists through the same transaction.
#[actix_rt::test]
async fn test_result_store_save_and_read_back() {
    let pool = create_test_pool().await;
    let job = unique_job("monthly-report");

    let (saved, written) = pool
        .save_build(
            new_build(&job, "1", BuildStatus::Success, 2, 2),
            passing_cases("t", 2),
        )
        .await
        .unwrap();
    assert_eq!(written, 2);

    let found = pool.find_build(&job, "1").await.unwrap().unwrap();
    assert_eq!(found.id, saved.id);
    assert_eq!(pool.test_cases_for_build(saved.id).await.unwrap().len(), 2);
    assert_eq!(pool.get_build(saved.id).await.unwrap().unwrap().job_name, job);

    let notes = pool
        .update_notes(saved.id, BuildNotes::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(notes.bugs_identified.as_deref(), Some(""));
    assert_eq!(notes.failure_reasons.as_deref(), Some(""));
}
