//! Structured observability hooks for triage runs.
//!
//! This module provides:
//! - Run-scoped tracing span via [`triage_span`]
//! - Emission functions for run lifecycle and per-build outcomes
//!
//! Lifecycle events are emitted at `info!`; nested reference traversal at
//! `debug!`; skipped builds at `warn!`.

use tracing::{debug, info, warn};

use crate::domain::BuildNumber;
use crate::extract::ExtractionStrategy;
use crate::similarity::Observation;

/// Run-scoped span tagged with the run id and job.
///
/// Attach it to the run future with `tracing::Instrument` so every event
/// emitted while the run is polled carries both fields:
///
/// ```ignore
/// run_loop().instrument(triage_span(&run_id, "pe-acceptance")).await;
/// ```
pub fn triage_span(run_id: &str, job: &str) -> tracing::Span {
    tracing::info_span!("triage.run", run_id = %run_id, job = %job)
}

/// Emit event: run started with the number of builds to examine.
pub fn emit_triage_started(run_id: &str, job: &str, mode: &str, builds: usize) {
    info!(event = "triage.started", run_id = %run_id, job = %job, mode = %mode, builds = builds);
}

/// Emit event: one build extracted and fed into the bucket.
pub fn emit_build_classified(
    build: BuildNumber,
    strategy: ExtractionStrategy,
    lines: usize,
    observation: &Observation,
) {
    match observation {
        Observation::Baseline => info!(
            event = "build.baseline",
            build = %build,
            strategy = %strategy,
            lines = lines,
        ),
        Observation::Compared(cmp) => info!(
            event = "build.classified",
            build = %build,
            strategy = %strategy,
            lines = lines,
            classification = ?cmp.classification,
            ratio = cmp.ratio,
        ),
        Observation::Empty => info!(
            event = "build.empty",
            build = %build,
            strategy = %strategy,
        ),
    }
}

/// Emit event: build skipped because a fetch failed (warning level).
pub fn emit_build_skipped(build: BuildNumber, error: &dyn std::fmt::Display) {
    warn!(event = "build.skipped", build = %build, error = %error);
}

/// Emit event: following a nested job/view reference.
pub fn emit_nested_reference(target: &str, build: BuildNumber, depth: usize) {
    debug!(event = "nested.follow", target = %target, build = %build, depth = depth);
}

/// Emit event: nested references found past the depth limit (warning level).
pub fn emit_nested_depth_exceeded(job: &str, references: usize, depth: usize) {
    warn!(
        event = "nested.depth_exceeded",
        job = %job,
        references = references,
        depth = depth,
    );
}

/// Emit event: run finished with bucket counts.
pub fn emit_triage_finished(
    run_id: &str,
    exact: usize,
    similar: usize,
    distinct: usize,
    skipped: usize,
) {
    info!(
        event = "triage.finished",
        run_id = %run_id,
        exact = exact,
        similar = similar,
        distinct = distinct,
        skipped = skipped,
    );
}
