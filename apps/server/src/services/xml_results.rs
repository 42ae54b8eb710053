//! Test result XML parsing for TestNG and Surefire/JUnit report files.

use serde::Deserialize;

use crate::error::AppResult;
use crate::models::{normalize_status, NewTestCase, TestStatus};

use super::sanitize;

// TestNG: testng-results > suite > test > class > test-method

#[derive(Debug, Deserialize, Default)]
struct TestNgResults {
    #[serde(rename = "suite", default)]
    suites: Vec<TestNgSuite>,
}

#[derive(Debug, Deserialize, Default)]
struct TestNgSuite {
    #[serde(rename = "test", default)]
    tests: Vec<TestNgTest>,
}

#[derive(Debug, Deserialize, Default)]
struct TestNgTest {
    #[serde(rename = "class", default)]
    classes: Vec<TestNgClass>,
}

#[derive(Debug, Deserialize, Default)]
struct TestNgClass {
    #[serde(rename = "@name", default)]
    name: Option<String>,
    #[serde(rename = "test-method", default)]
    methods: Vec<TestNgMethod>,
}

#[derive(Debug, Deserialize, Default)]
struct TestNgMethod {
    #[serde(rename = "@name", default)]
    name: Option<String>,
    #[serde(rename = "@status", default)]
    status: Option<String>,
    #[serde(rename = "@is-config", default)]
    is_config: Option<String>,
    #[serde(rename = "@duration-ms", default)]
    duration_ms: Option<String>,
    #[serde(rename = "exception", default)]
    exceptions: Vec<TestNgException>,
}

#[derive(Debug, Deserialize, Default)]
struct TestNgException {
    #[serde(rename = "@message", default)]
    message_attr: Option<String>,
    #[serde(rename = "message", default)]
    message: Option<String>,
    #[serde(rename = "full-stacktrace", default)]
    full_stacktrace: Option<String>,
}

// Surefire: [testsuites >] testsuite > testcase

#[derive(Debug, Deserialize, Default)]
struct SurefireSuites {
    #[serde(rename = "testsuite", default)]
    suites: Vec<SurefireSuite>,
}

#[derive(Debug, Deserialize, Default)]
struct SurefireSuite {
    #[serde(rename = "testcase", default)]
    cases: Vec<SurefireCase>,
}

#[derive(Debug, Deserialize, Default)]
struct SurefireCase {
    #[serde(rename = "@name", default)]
    name: Option<String>,
    #[serde(rename = "@classname", default)]
    classname: Option<String>,
    #[serde(rename = "@time", default)]
    time: Option<String>,
    #[serde(default)]
    failure: Option<SurefireProblem>,
    #[serde(default)]
    error: Option<SurefireProblem>,
    #[serde(default)]
    skipped: Option<SurefireSkipped>,
}

#[derive(Debug, Deserialize, Default)]
struct SurefireProblem {
    #[serde(rename = "@message", default)]
    message: Option<String>,
    #[serde(rename = "$text", default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct SurefireSkipped {}

/// XML dialect of a result file, decided by sniffing its root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlDialect {
    TestNgResults,
    TestNgSuite,
    SurefireSuites,
    SurefireSuite,
}

impl XmlDialect {
    pub fn detect(content: &str) -> Option<Self> {
        if content.contains("<testng-results") {
            Some(Self::TestNgResults)
        } else if content.contains("<testsuites") {
            Some(Self::SurefireSuites)
        } else if content.contains("<testsuite") {
            Some(Self::SurefireSuite)
        } else if content.contains("<suite") {
            Some(Self::TestNgSuite)
        } else {
            None
        }
    }
}

/// Parse one result file. Unrecognized content yields an empty list.
pub fn parse_result_xml(content: &str) -> AppResult<Vec<NewTestCase>> {
    let cases = match XmlDialect::detect(content) {
        Some(XmlDialect::TestNgResults) => {
            let results: TestNgResults = quick_xml::de::from_str(content)?;
            testng_cases(results.suites)
        }
        Some(XmlDialect::TestNgSuite) => {
            let suite: TestNgSuite = quick_xml::de::from_str(content)?;
            testng_cases(vec![suite])
        }
        Some(XmlDialect::SurefireSuites) => {
            let suites: SurefireSuites = quick_xml::de::from_str(content)?;
            surefire_cases(suites.suites)
        }
        Some(XmlDialect::SurefireSuite) => {
            let suite: SurefireSuite = quick_xml::de::from_str(content)?;
            surefire_cases(vec![suite])
        }
        None => Vec::new(),
    };
    Ok(cases)
}

fn testng_cases(suites: Vec<TestNgSuite>) -> Vec<NewTestCase> {
    let mut cases = Vec::new();

    for class in suites
        .into_iter()
        .flat_map(|s| s.tests)
        .flat_map(|t| t.classes)
    {
        for method in class.methods {
            if method.is_config.as_deref() == Some("true") {
                continue;
            }

            let (status, raw_status) = normalize_status(method.status.as_deref());
            let mut case = NewTestCase::new(class.name.as_deref(), method.name.as_deref(), status);
            case.raw_status = raw_status;
            case.duration_seconds = parse_seconds(method.duration_ms.as_deref()).map(|ms| ms / 1000.0);

            if status == TestStatus::Failed
                && let Some(exception) = method.exceptions.into_iter().next()
            {
                let message = exception
                    .message_attr
                    .filter(|m| !m.trim().is_empty())
                    .or_else(|| child_text(exception.message));
                case.error_message = sanitize::error_message(message.as_deref());
                case.stack_trace =
                    sanitize::stack_trace(child_text(exception.full_stacktrace).as_deref());
            }

            cases.push(case);
        }
    }

    cases
}

fn surefire_cases(suites: Vec<SurefireSuite>) -> Vec<NewTestCase> {
    suites
        .into_iter()
        .flat_map(|s| s.cases)
        .map(|tc| {
            let (status, problem) = match (tc.failure, tc.error, tc.skipped) {
                (Some(failure), _, _) => (TestStatus::Failed, Some(failure)),
                (None, Some(error), _) => (TestStatus::Failed, Some(error)),
                (None, None, Some(_)) => (TestStatus::Skipped, None),
                (None, None, None) => (TestStatus::Passed, None),
            };

            let mut case = NewTestCase::new(tc.classname.as_deref(), tc.name.as_deref(), status);
            case.duration_seconds = parse_seconds(tc.time.as_deref());
            if let Some(problem) = problem {
                case.error_message = sanitize::error_message(problem.message.as_deref());
                case.stack_trace = sanitize::stack_trace(problem.text.as_deref());
            }
            case
        })
        .collect()
}

/// Text of a TestNG child element without the indentation TestNG wraps around its CDATA.
fn child_text(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string())
}

fn parse_seconds(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
