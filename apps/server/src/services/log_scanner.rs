//! Last-resort extraction of test outcomes from console output.
//!
//! Lines look like `... testcases.billing.InvoiceIT.createsInvoice PASSED`.
//! No duration or failure detail is available from this source.

use crate::models::{NewTestCase, TestStatus};

const QUALIFIED_PREFIX: &str = "testcases.";

/// Status literals in match priority. A line containing several takes the first.
const STATUS_LITERALS: [(&str, TestStatus); 3] = [
    ("PASSED", TestStatus::Passed),
    ("FAILED", TestStatus::Failed),
    ("SKIPPED", TestStatus::Skipped),
];

/// Scan console text for `testcases.<...>` lines carrying a status literal.
///
/// A qualified name without a class part is attributed to `fallback_class`.
pub fn scan_console_log(console: &str, fallback_class: &str) -> Vec<NewTestCase> {
    console
        .lines()
        .filter_map(|line| scan_line(line, fallback_class))
        .collect()
}

fn scan_line(line: &str, fallback_class: &str) -> Option<NewTestCase> {
    let start = line.find(QUALIFIED_PREFIX)?;
    let status = STATUS_LITERALS
        .iter()
        .find(|(literal, _)| line.contains(literal))
        .map(|(_, status)| *status)?;

    let token = line[start..]
        .split_whitespace()
        .next()
        .unwrap_or_default();

    let (class_name, test_name) = match token.rfind('.') {
        Some(dot) if dot >= QUALIFIED_PREFIX.len() => (&token[..dot], &token[dot + 1..]),
        _ => (fallback_class, token),
    };

    Some(NewTestCase::new(Some(class_name), Some(test_name), status))
}
