//! Jenkins HTTP client
//!
//! Implements [`BuildSource`] over the Jenkins REST endpoints:
//!
//! - `{job}/api/json?tree=builds[number,result]` for the build list
//! - `{job}/{build}/consoleText` for console logs
//! - `{job}/LAYOUT={view},label={label}/{build}/consoleText` for matrix views

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use triage_core::{BuildNumber, BuildResult, BuildSource, BuildSummary, FetchError, FetchResult};

use crate::config::JenkinsConfig;
use crate::html::{html_to_text, is_html};
use crate::Result;

const USER_AGENT: &str = concat!("jenkins-triage/", env!("CARGO_PKG_VERSION"));

/// Jenkins path for a (possibly foldered) job: `a/b` becomes `job/a/job/b`.
pub fn job_path(job: &str) -> String {
    job.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| format!("job/{}", segment))
        .collect::<Vec<_>>()
        .join("/")
}

/// URL segment for a build; `latest` is Jenkins' `lastBuild` permalink.
pub fn build_segment(build: BuildNumber) -> String {
    match build {
        BuildNumber::Number(n) => n.to_string(),
        BuildNumber::Latest => "lastBuild".to_string(),
    }
}

/// Map a non-success HTTP status onto a fetch error.
pub fn status_error(status: u16, resource: &str) -> FetchError {
    let resource = resource.to_string();
    match status {
        404 => FetchError::NotFound { resource },
        401 | 403 => FetchError::Unauthorized { resource },
        _ => FetchError::Status { status, resource },
    }
}

#[derive(Debug, Deserialize)]
struct BuildsResponse {
    #[serde(default)]
    builds: Vec<BuildEntry>,
}

#[derive(Debug, Deserialize)]
struct BuildEntry {
    number: u32,
    result: Option<String>,
}

/// Decode the `tree=builds[number,result]` JSON body, newest first as served.
pub fn parse_builds(body: &str) -> FetchResult<Vec<BuildSummary>> {
    let response: BuildsResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    Ok(response
        .builds
        .into_iter()
        .map(|b| BuildSummary::new(b.number, BuildResult::from_jenkins(b.result.as_deref())))
        .collect())
}

/// Jenkins client for console and build-list fetches
pub struct JenkinsClient {
    config: JenkinsConfig,
    http_client: reqwest::Client,
}

impl JenkinsClient {
    /// Create a new Jenkins client
    pub fn new(config: JenkinsConfig) -> Result<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(JenkinsClient {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &JenkinsConfig {
        &self.config
    }

    pub fn builds_url(&self, job: &str) -> String {
        format!(
            "{}/{}/api/json?tree=builds[number,result]",
            self.config.base(),
            job_path(job)
        )
    }

    pub fn console_url(&self, job: &str, build: BuildNumber) -> String {
        format!(
            "{}/{}/{}/consoleText",
            self.config.base(),
            job_path(job),
            build_segment(build)
        )
    }

    pub fn nested_url(&self, job: &str, view: &str, build: BuildNumber) -> String {
        format!(
            "{}/{}/LAYOUT={},label={}/{}/consoleText",
            self.config.base(),
            job_path(job),
            view,
            self.config.nested_label,
            build_segment(build)
        )
    }

    /// GET `url`, returning the content type and body of a 2xx response.
    async fn fetch(&self, url: &str) -> FetchResult<(String, String)> {
        debug!(url = %url, "GET");

        let mut request = self.http_client.get(url);
        if let Some(username) = &self.config.username {
            request = request.basic_auth(username, self.config.token.as_deref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status.as_u16(), url));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        debug!(url = %url, bytes = body.len(), "fetched");
        Ok((content_type, body))
    }
}

#[async_trait]
impl BuildSource for JenkinsClient {
    async fn console_text(&self, job: &str, build: BuildNumber) -> FetchResult<String> {
        let (_, body) = self.fetch(&self.console_url(job, build)).await?;
        Ok(body)
    }

    async fn nested_text(&self, job: &str, view: &str, build: BuildNumber) -> FetchResult<String> {
        let (content_type, body) = self.fetch(&self.nested_url(job, view, build)).await?;
        if is_html(&content_type) {
            return Ok(html_to_text(&body));
        }
        Ok(body)
    }

    async fn list_builds(&self, job: &str) -> FetchResult<Vec<BuildSummary>> {
        let (_, body) = self.fetch(&self.builds_url(job)).await?;
        parse_builds(&body)
    }
}
