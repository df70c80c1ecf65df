//! Error types for jenkins-client

use thiserror::Error;

/// Errors raised while configuring or constructing the Jenkins client.
///
/// Per-request failures are reported as [`triage_core::FetchError`] so the
/// triage run can skip the affected build.
#[derive(Error, Debug)]
pub enum JenkinsError {
    /// No base URL was configured
    #[error("Jenkins URL is not configured (set JENKINS_URL or pass --jenkins-url)")]
    MissingUrl,

    /// Base URL is not an absolute http(s) URL
    #[error("Invalid Jenkins URL: {0}")]
    InvalidUrl(String),

    /// A token was given without a username
    #[error("Jenkins token supplied without a username")]
    MissingUsername,

    /// HTTP client could not be built
    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for JenkinsError {
    fn from(err: reqwest::Error) -> Self {
        JenkinsError::Http(err.to_string())
    }
}
