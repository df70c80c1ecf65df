//! Triage run loop.
//!
//! A [`Triage`] owns everything one run needs: the injected [`BuildSource`],
//! the noise filter and the similarity clusterer. Builds are processed one at
//! a time in the order the source lists them. A fetch failure skips the
//! affected build and the run carries on.

use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::config::TriageConfig;
use crate::domain::{
    BuildErrors, BuildNumber, BuildSummary, ErrorSet, FetchError, FetchResult, Result,
};
use crate::extract::{
    extract, extract_range, select_strategy, Delimiters, Extraction, ExtractionStrategy,
    NoiseFilter,
};
use crate::obs::{
    emit_build_classified, emit_build_skipped, emit_nested_depth_exceeded, emit_nested_reference,
    emit_triage_finished, emit_triage_started, triage_span,
};
use crate::report::{SkippedBuild, TriageMode, TriageReport};
use crate::similarity::{SimilarityBucket, SimilarityClusterer};
use crate::source::BuildSource;

/// One triage run over a job's build history.
pub struct Triage {
    source: Arc<dyn BuildSource>,
    noise: NoiseFilter,
    clusterer: SimilarityClusterer,
    max_nested_depth: usize,
}

impl Triage {
    /// Build a run from validated configuration.
    pub fn new(source: Arc<dyn BuildSource>, config: &TriageConfig) -> Result<Self> {
        Ok(Self {
            source,
            noise: config.noise_filter()?,
            clusterer: config.clusterer()?,
            max_nested_depth: config.max_nested_depth,
        })
    }

    /// Build a run with the default noise list and threshold.
    pub fn with_defaults(source: Arc<dyn BuildSource>) -> Self {
        Self {
            source,
            noise: NoiseFilter::default(),
            clusterer: SimilarityClusterer::default(),
            max_nested_depth: crate::config::DEFAULT_MAX_NESTED_DEPTH,
        }
    }

    /// Cluster the failed builds of `job`, choosing a strategy per log.
    ///
    /// Only the build listing is fatal; per-build fetch failures are
    /// recorded as skipped.
    pub async fn errors(&self, job: &str) -> Result<TriageReport> {
        let builds: Vec<BuildSummary> = self
            .source
            .list_builds(job)
            .await?
            .into_iter()
            .filter(BuildSummary::failed)
            .collect();

        Ok(self.run(job, TriageMode::Errors, builds, None).await)
    }

    /// Cluster every build of `job` by the region between `delimiters`.
    pub async fn gather(&self, job: &str, delimiters: &Delimiters) -> Result<TriageReport> {
        let builds = self.source.list_builds(job).await?;
        Ok(self
            .run(job, TriageMode::Gather, builds, Some(delimiters))
            .await)
    }

    async fn run(
        &self,
        job: &str,
        mode: TriageMode,
        builds: Vec<BuildSummary>,
        delimiters: Option<&Delimiters>,
    ) -> TriageReport {
        let run_id = Uuid::new_v4();
        let span = triage_span(&run_id.to_string(), job);
        self.run_builds(run_id, job, mode, builds, delimiters)
            .instrument(span)
            .await
    }

    async fn run_builds(
        &self,
        run_id: Uuid,
        job: &str,
        mode: TriageMode,
        builds: Vec<BuildSummary>,
        delimiters: Option<&Delimiters>,
    ) -> TriageReport {
        let run_id_str = run_id.to_string();
        emit_triage_started(&run_id_str, job, &mode.to_string(), builds.len());

        let examined = builds.len();
        let mut bucket = SimilarityBucket::new(self.clusterer);
        let mut skipped = Vec::new();

        for summary in builds {
            let build = BuildNumber::Number(summary.number);
            match self.extract_build(job, build, delimiters).await {
                Ok(errors) => {
                    let strategy = errors.strategy;
                    let lines = errors.errors.len();
                    let observation = bucket.observe(errors);
                    emit_build_classified(build, strategy, lines, &observation);
                }
                Err(e) => {
                    emit_build_skipped(build, &e);
                    skipped.push(SkippedBuild {
                        build,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let threshold = bucket.threshold();
        let report = TriageReport::new(
            run_id,
            job,
            mode,
            threshold,
            examined,
            bucket.into_parts(),
            skipped,
        );
        emit_triage_finished(
            &run_id_str,
            report.exact,
            report.similar,
            report.distinct,
            report.skipped.len(),
        );
        report
    }

    /// Fetch one build's console text and extract its error set.
    pub async fn extract_build(
        &self,
        job: &str,
        build: BuildNumber,
        delimiters: Option<&Delimiters>,
    ) -> FetchResult<BuildErrors> {
        let text = self.source.console_text(job, build).await?;
        let (strategy, errors) = self.resolve(job, build, text, delimiters, 0).await?;
        Ok(BuildErrors {
            job: job.to_string(),
            build,
            strategy,
            errors,
        })
    }

    /// Extract from already-fetched `text`, following nested references.
    ///
    /// Failure references fetch the referenced job's console log and are
    /// re-classified without delimiters. Success references fetch the matrix
    /// view of the current job and build; with delimiters the view is range
    /// extracted, otherwise it is re-classified.
    pub fn resolve<'a>(
        &'a self,
        job: &'a str,
        build: BuildNumber,
        text: String,
        delimiters: Option<&'a Delimiters>,
        depth: usize,
    ) -> BoxFuture<'a, FetchResult<(ExtractionStrategy, ErrorSet)>> {
        async move {
            let strategy = select_strategy(&text, delimiters);
            debug!(job = %job, build = %build, strategy = %strategy, depth = depth, "strategy selected");

            let references = match extract(&text, strategy, delimiters, &self.noise) {
                Extraction::Lines(set) => return Ok::<_, FetchError>((strategy, set)),
                Extraction::References(references) => references,
            };

            if depth >= self.max_nested_depth {
                if !references.is_empty() {
                    emit_nested_depth_exceeded(job, references.len(), depth);
                }
                return Ok((strategy, ErrorSet::default()));
            }

            let mut lines = Vec::new();
            for reference in references {
                emit_nested_reference(&reference.target, reference.build, depth + 1);

                let nested = if strategy.is_success() {
                    let view_text = self
                        .source
                        .nested_text(job, &reference.target, build)
                        .await?;
                    match delimiters {
                        Some(d) => extract_range(&view_text, d),
                        None => {
                            self.resolve(job, build, view_text, None, depth + 1)
                                .await?
                                .1
                        }
                    }
                } else {
                    let console = self
                        .source
                        .console_text(&reference.target, reference.build)
                        .await?;
                    self.resolve(&reference.target, reference.build, console, None, depth + 1)
                        .await?
                        .1
                };

                lines.extend(nested.into_lines());
            }

            Ok::<_, FetchError>((strategy, ErrorSet::new(lines)))
        }
        .boxed()
    }
}
