//! HTTP client for the Jenkins JSON API.
//!
//! Every request carries the configured timeouts, and HTTP Basic credentials
//! when a username and token are configured. Non-2xx responses surface as
//! `AppError::Network`.

use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::JenkinsSettings;
use crate::error::{AppError, AppResult};
use crate::models::BuildStatus;

/// Metadata of one completed build.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildInfo {
    pub number: i64,
    /// SUCCESS, FAILURE, UNSTABLE, ABORTED, NOT_BUILT, or null while running
    pub result: Option<String>,
    pub url: Option<String>,
    /// Epoch milliseconds
    pub timestamp: Option<i64>,
}

impl BuildInfo {
    pub fn status(&self) -> BuildStatus {
        BuildStatus::from_jenkins(self.result.as_deref())
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.and_then(DateTime::from_timestamp_millis)
    }
}

/// Aggregate counts from the TestNG results plugin.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestNgCounts {
    pub total: Option<i32>,
    pub fail_count: Option<i32>,
    pub skip_count: Option<i32>,
}

/// One entry of a build's artifact manifest.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub relative_path: String,
}

#[derive(Deserialize)]
struct JobList {
    #[serde(default)]
    jobs: Vec<JobEntry>,
}

#[derive(Deserialize)]
struct JobEntry {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobDetail {
    last_completed_build: Option<BuildRef>,
}

#[derive(Deserialize)]
struct BuildRef {
    number: i64,
}

#[derive(Deserialize)]
struct ArtifactManifest {
    #[serde(default)]
    artifacts: Vec<Artifact>,
}

/// Jenkins REST client.
pub struct JenkinsClient {
    http: reqwest::Client,
    base_url: String,
    username: Option<String>,
    token: Option<SecretString>,
}

impl JenkinsClient {
    /// Build a client with timeouts from settings.
    pub fn new(settings: &JenkinsSettings) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout())
            .timeout(settings.timeout)
            .build()
            .map_err(|e| AppError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: settings.url.trim_end_matches('/').to_string(),
            username: settings.username.clone(),
            token: settings.token.clone(),
        })
    }

    /// Probe the server root. Returns an error for any non-2xx response.
    pub async fn ping(&self) -> AppResult<()> {
        self.request(Method::GET, format!("{}/api/json", self.base_url))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Names of all top-level jobs.
    pub async fn list_job_names(&self) -> AppResult<Vec<String>> {
        let url = format!("{}/api/json?tree={}", self.base_url, urlencoding::encode("jobs[name]"));
        let list: JobList = self.get_json(url).await?;
        Ok(list.jobs.into_iter().map(|j| j.name).collect())
    }

    /// Metadata of the job's latest completed build, or `None` if it has none.
    pub async fn latest_completed_build(&self, job_name: &str) -> AppResult<Option<BuildInfo>> {
        let url = format!("{}/api/json", self.job_url(job_name));
        let detail: JobDetail = self.get_json(url).await?;

        let Some(build) = detail.last_completed_build else {
            return Ok(None);
        };

        let info: BuildInfo = self
            .get_json(format!("{}/api/json", self.build_url(job_name, build.number)))
            .await?;
        Ok(Some(info))
    }

    /// Counts from the TestNG report endpoint.
    pub async fn testng_counts(&self, job_name: &str, build_number: i64) -> AppResult<TestNgCounts> {
        let url = format!(
            "{}/testngreports/api/json",
            self.build_url(job_name, build_number)
        );
        self.get_json(url).await
    }

    /// The standard test report document (counts plus suites/cases tree).
    pub async fn test_report(&self, job_name: &str, build_number: i64) -> AppResult<Value> {
        let url = format!(
            "{}/testReport/api/json",
            self.build_url(job_name, build_number)
        );
        self.get_json(url).await
    }

    /// The build's artifact manifest.
    pub async fn artifacts(&self, job_name: &str, build_number: i64) -> AppResult<Vec<Artifact>> {
        let url = format!(
            "{}/api/json?tree={}",
            self.build_url(job_name, build_number),
            urlencoding::encode("artifacts[*]")
        );
        let manifest: ArtifactManifest = self.get_json(url).await?;
        Ok(manifest.artifacts)
    }

    /// HEAD-probe an artifact path.
    pub async fn artifact_exists(
        &self,
        job_name: &str,
        build_number: i64,
        relative_path: &str,
    ) -> AppResult<bool> {
        let url = self.artifact_url(job_name, build_number, relative_path);
        let response = self.request(Method::HEAD, url).send().await?;

        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(AppError::Network(format!(
                "HTTP {} probing artifact {}",
                s.as_u16(),
                relative_path
            ))),
        }
    }

    /// Download an artifact as text.
    pub async fn download_artifact(
        &self,
        job_name: &str,
        build_number: i64,
        relative_path: &str,
    ) -> AppResult<String> {
        let url = self.artifact_url(job_name, build_number, relative_path);
        self.get_text(url).await
    }

    /// Raw console output of a build.
    pub async fn console_text(&self, job_name: &str, build_number: i64) -> AppResult<String> {
        let url = format!("{}/consoleText", self.build_url(job_name, build_number));
        self.get_text(url).await
    }

    fn job_url(&self, job_name: &str) -> String {
        format!("{}{}", self.base_url, job_path(job_name))
    }

    fn build_url(&self, job_name: &str, build_number: i64) -> String {
        format!("{}/{}", self.job_url(job_name), build_number)
    }

    fn artifact_url(&self, job_name: &str, build_number: i64, relative_path: &str) -> String {
        format!(
            "{}/artifact/{}",
            self.build_url(job_name, build_number),
            encode_path(relative_path)
        )
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        debug!("Jenkins {} {}", method, url);
        let builder = self.http.request(method, url);
        match (&self.username, &self.token) {
            (Some(user), Some(token)) => builder.basic_auth(user, Some(token.expose_secret())),
            _ => builder,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> AppResult<T> {
        let body = self
            .request(Method::GET, url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_text(&self, url: String) -> AppResult<String> {
        let text = self
            .request(Method::GET, url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }
}

/// URL path for a job; `/` in the name addresses nested folders.
pub fn job_path(job_name: &str) -> String {
    job_name
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| format!("/job/{}", urlencoding::encode(segment)))
        .collect()
}

fn encode_path(relative_path: &str) -> String {
    relative_path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
