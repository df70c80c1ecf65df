//! Jenkins connection settings

use serde::{Deserialize, Serialize};

use crate::error::JenkinsError;
use crate::Result;

/// Label axis appended to matrix view names.
pub const DEFAULT_NESTED_LABEL: &str = "beaker";

/// Request timeout applied to every fetch.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Jenkins configuration
///
/// Environment lookup (`JENKINS_URL`, `JENKINS_USERNAME`, `JENKINS_TOKEN`)
/// happens at the CLI edge; this type only holds resolved values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JenkinsConfig {
    /// Jenkins base URL, e.g. `https://jenkins.example.net`
    pub base_url: String,
    /// Basic auth username
    pub username: Option<String>,
    /// API token used as the basic auth password
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Label segment of nested matrix views
    pub nested_label: String,
    pub timeout_secs: u64,
}

impl JenkinsConfig {
    /// Create config for a specific server, without credentials
    pub fn new(base_url: &str) -> Self {
        JenkinsConfig {
            base_url: base_url.to_string(),
            username: None,
            token: None,
            nested_label: DEFAULT_NESTED_LABEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set basic auth credentials
    pub fn with_credentials(mut self, username: &str, token: &str) -> Self {
        self.username = Some(username.to_string());
        self.token = Some(token.to_string());
        self
    }

    pub fn with_nested_label(mut self, label: &str) -> Self {
        self.nested_label = label.to_string();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// A username was given but no API token to go with it.
    pub fn needs_token(&self) -> bool {
        self.username.is_some() && self.token.is_none()
    }

    /// Base URL without trailing slashes.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn validate(&self) -> Result<()> {
        let base = self.base();
        if base.is_empty() {
            return Err(JenkinsError::MissingUrl);
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(JenkinsError::InvalidUrl(self.base_url.clone()));
        }
        if self.token.is_some() && self.username.is_none() {
            return Err(JenkinsError::MissingUsername);
        }
        Ok(())
    }
}
