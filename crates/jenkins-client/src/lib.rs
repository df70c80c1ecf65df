//! Jenkins collaborator for jenkins-triage
//!
//! Provides the HTTP implementation of [`triage_core::BuildSource`]:
//! build listing, console logs and matrix view logs, with basic auth.

pub mod client;
pub mod config;
pub mod error;
pub mod html;

pub use client::{build_segment, job_path, parse_builds, JenkinsClient};
pub use config::JenkinsConfig;
pub use error::JenkinsError;

/// Result type for client construction
pub type Result<T> = std::result::Result<T, JenkinsError>;
