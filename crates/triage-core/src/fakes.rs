//! In-memory fakes for the collaborator trait (testing and offline use)
//!
//! `MemoryBuildSource` satisfies the [`BuildSource`] contract from canned
//! text, and records every fetch so tests can assert on call order.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{BuildNumber, BuildSummary, FetchError, FetchResult};
use crate::source::BuildSource;

/// A fetch made against a [`MemoryBuildSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchCall {
    Console { job: String, build: BuildNumber },
    Nested { job: String, view: String, build: BuildNumber },
    ListBuilds { job: String },
}

/// Canned build source backed by hash maps.
///
/// Unknown resources yield `FetchError::NotFound`; explicit failures can be
/// injected per console log.
#[derive(Debug, Default)]
pub struct MemoryBuildSource {
    builds: HashMap<String, Vec<BuildSummary>>,
    console: HashMap<(String, BuildNumber), FetchResult<String>>,
    nested: HashMap<(String, String, BuildNumber), String>,
    calls: Mutex<Vec<FetchCall>>,
}

impl MemoryBuildSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builds(mut self, job: &str, builds: Vec<BuildSummary>) -> Self {
        self.builds.insert(job.to_string(), builds);
        self
    }

    pub fn with_console(mut self, job: &str, build: BuildNumber, text: &str) -> Self {
        self.console
            .insert((job.to_string(), build), Ok(text.to_string()));
        self
    }

    pub fn with_console_error(mut self, job: &str, build: BuildNumber, err: FetchError) -> Self {
        self.console.insert((job.to_string(), build), Err(err));
        self
    }

    pub fn with_nested(mut self, job: &str, view: &str, build: BuildNumber, text: &str) -> Self {
        self.nested
            .insert((job.to_string(), view.to_string(), build), text.to_string());
        self
    }

    /// Every fetch made so far, in order.
    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: FetchCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl BuildSource for MemoryBuildSource {
    async fn console_text(&self, job: &str, build: BuildNumber) -> FetchResult<String> {
        self.record(FetchCall::Console {
            job: job.to_string(),
            build,
        });
        self.console
            .get(&(job.to_string(), build))
            .cloned()
            .unwrap_or_else(|| {
                Err(FetchError::NotFound {
                    resource: format!("{}/{}/consoleText", job, build),
                })
            })
    }

    async fn nested_text(&self, job: &str, view: &str, build: BuildNumber) -> FetchResult<String> {
        self.record(FetchCall::Nested {
            job: job.to_string(),
            view: view.to_string(),
            build,
        });
        self.nested
            .get(&(job.to_string(), view.to_string(), build))
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                resource: format!("{}/{}/{}", job, view, build),
            })
    }

    async fn list_builds(&self, job: &str) -> FetchResult<Vec<BuildSummary>> {
        self.record(FetchCall::ListBuilds {
            job: job.to_string(),
        });
        self.builds
            .get(job)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                resource: job.to_string(),
            })
    }
}
