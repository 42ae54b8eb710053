//! Discovery of test-result XML files among a build's artifacts.

use tracing::{debug, warn};

use super::jenkins_client::{Artifact, JenkinsClient};

/// Conventional result locations probed when the manifest has no match.
pub const FALLBACK_ARTIFACT_PATHS: [&str; 4] = [
    "target/surefire-reports/testng-results.xml",
    "test-output/testng-results.xml",
    "testng-results.xml",
    "target/surefire-reports/TEST-TestSuite.xml",
];

/// Relative paths of manifest entries that look like test results, in manifest order.
pub fn select_result_artifacts(artifacts: &[Artifact]) -> Vec<String> {
    artifacts
        .iter()
        .filter(|a| is_result_artifact(a))
        .map(|a| a.relative_path.clone())
        .collect()
}

fn is_result_artifact(artifact: &Artifact) -> bool {
    let name = artifact.file_name.as_str();
    let path = artifact.relative_path.as_str();
    if !name.ends_with(".xml") || path.is_empty() {
        return false;
    }
    name.contains("testng") || path.contains("surefire-reports") || path.contains("test-output")
}

/// Candidate result-file paths for a build. Never fails; empty means no candidates.
pub async fn locate_result_artifacts(
    client: &JenkinsClient,
    job_name: &str,
    build_number: i64,
) -> Vec<String> {
    match client.artifacts(job_name, build_number).await {
        Ok(artifacts) => {
            let selected = select_result_artifacts(&artifacts);
            if !selected.is_empty() {
                debug!(
                    "Found {} result artifact(s) for {} #{}",
                    selected.len(),
                    job_name,
                    build_number
                );
                return selected;
            }
        }
        Err(e) => warn!(
            "Artifact manifest unavailable for {} #{}: {}",
            job_name, build_number, e
        ),
    }

    let mut found = Vec::new();
    for path in FALLBACK_ARTIFACT_PATHS {
        match client.artifact_exists(job_name, build_number, path).await {
            Ok(true) => found.push(path.to_string()),
            Ok(false) => {}
            Err(e) => debug!(
                "Probe of {} failed for {} #{}: {}",
                path, job_name, build_number, e
            ),
        }
    }
    found
}
