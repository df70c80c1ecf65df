//! Collaborator boundary: where console text comes from.
//!
//! The triage core never performs I/O itself. A [`BuildSource`] is injected
//! into each [`Triage`](crate::triage::Triage) run and is the only place a
//! fetch can fail. An in-memory implementation lives in [`crate::fakes`].

use async_trait::async_trait;

use crate::domain::{BuildNumber, BuildSummary, FetchResult};

/// Read-only access to a CI server's build history and logs.
#[async_trait]
pub trait BuildSource: Send + Sync {
    /// Raw console log of one build of `job`.
    async fn console_text(&self, job: &str, build: BuildNumber) -> FetchResult<String>;

    /// Console text of a matrix view/layout of `job`, as plain text.
    async fn nested_text(&self, job: &str, view: &str, build: BuildNumber) -> FetchResult<String>;

    /// Build history of `job` in server order.
    async fn list_builds(&self, job: &str) -> FetchResult<Vec<BuildSummary>>;
}
