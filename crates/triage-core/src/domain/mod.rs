//! Domain models for triage runs.
//!
//! - `BuildNumber` / `BuildSummary`: identity of a build in a job's history
//! - `ErrorSet` / `BuildErrors`: extracted error lines per build
//! - `TriageError` / `FetchError`: error taxonomy

pub mod build;
pub mod error;
pub mod error_set;

pub use build::{BuildNumber, BuildResult, BuildSummary};
pub use error::{FetchError, FetchResult, Result, TriageError};
pub use error_set::{BuildErrors, ErrorSet};
