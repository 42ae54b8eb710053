//! Parsing of the Jenkins `testReport` JSON document.

use serde_json::Value;

use crate::models::{normalize_status, NewTestCase};

use super::sanitize;

/// Extract test cases from `suites[].cases[]`, or a top-level `cases[]`.
///
/// A document with neither array yields an empty list.
pub fn parse_test_report(report: &Value) -> Vec<NewTestCase> {
    let case_nodes: Vec<&Value> = match report.get("suites").and_then(Value::as_array) {
        Some(suites) => suites
            .iter()
            .filter_map(|suite| suite.get("cases").and_then(Value::as_array))
            .flatten()
            .collect(),
        None => report
            .get("cases")
            .and_then(Value::as_array)
            .map(|cases| cases.iter().collect())
            .unwrap_or_default(),
    };

    case_nodes.into_iter().map(parse_case).collect()
}

fn parse_case(node: &Value) -> NewTestCase {
    let text = |key: &str| node.get(key).and_then(Value::as_str);

    let (status, raw_status) = normalize_status(text("status"));
    let mut case = NewTestCase::new(text("className"), text("name"), status);
    case.raw_status = raw_status;
    case.duration_seconds = node.get("duration").and_then(Value::as_f64);
    case.error_message = sanitize::error_message(text("errorDetails"));
    case.stack_trace = sanitize::stack_trace(text("errorStackTrace"));
    case
}

/// Aggregate counts from the same document, if present.
pub fn report_counts(report: &Value) -> Option<(i32, i32, i32)> {
    let count = |key: &str| {
        report
            .get(key)
            .and_then(Value::as_i64)
            .and_then(|v| i32::try_from(v).ok())
    };
    Some((count("passCount")?, count("failCount")?, count("skipCount")?))
}
