//! Triage report artifact.
//!
//! A `TriageReport` is the read-once output of a run: the baseline error
//! set, bucket counts, exemplars, and the builds that could not be fetched.
//! It serialises to JSON for machine consumers and renders to plain text
//! for operators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::{BuildErrors, BuildNumber, ErrorSet};
use crate::similarity::BucketParts;

/// Which command produced the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageMode {
    /// Failed builds only, extraction strategy chosen per log.
    Errors,
    /// Every build, with a caller-supplied delimiter pair.
    Gather,
}

impl TriageMode {
    fn noun(&self) -> &'static str {
        match self {
            TriageMode::Errors => "errors",
            TriageMode::Gather => "check lines",
        }
    }
}

impl fmt::Display for TriageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriageMode::Errors => write!(f, "errors"),
            TriageMode::Gather => write!(f, "gather"),
        }
    }
}

/// A build dropped from the run because a fetch failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedBuild {
    pub build: BuildNumber,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageReport {
    pub run_id: Uuid,
    pub job: String,
    pub mode: TriageMode,
    pub generated_at: DateTime<Utc>,
    pub similarity_threshold: f64,
    /// Builds selected for examination, including skipped ones.
    pub builds_examined: usize,
    pub baseline: Option<BuildErrors>,
    pub exact: usize,
    pub similar: usize,
    pub distinct: usize,
    pub empty: usize,
    pub similar_exemplars: Vec<BuildErrors>,
    pub distinct_exemplars: Vec<BuildErrors>,
    pub skipped: Vec<SkippedBuild>,
}

impl TriageReport {
    pub fn new(
        run_id: Uuid,
        job: &str,
        mode: TriageMode,
        similarity_threshold: f64,
        builds_examined: usize,
        parts: BucketParts,
        skipped: Vec<SkippedBuild>,
    ) -> Self {
        Self {
            run_id,
            job: job.to_string(),
            mode,
            generated_at: Utc::now(),
            similarity_threshold,
            builds_examined,
            baseline: parts.baseline,
            exact: parts.exact,
            similar: parts.similar,
            distinct: parts.distinct,
            empty: parts.empty,
            similar_exemplars: parts.similar_exemplars,
            distinct_exemplars: parts.distinct_exemplars,
            skipped,
        }
    }

    /// Render the operator-facing summary, one error line per row.
    pub fn render_text(&self) -> String {
        let noun = self.mode.noun();
        let mut out = String::new();

        let Some(baseline) = &self.baseline else {
            out.push_str(&format!(
                "No {} were extracted from {} build(s) of {}.\n",
                noun, self.builds_examined, self.job
            ));
            push_skipped(&mut out, &self.skipped);
            return out;
        };

        out.push_str(&format!(
            "Last job {} were (build #{}):\n",
            noun, baseline.build
        ));
        push_lines(&mut out, &baseline.errors);

        if self.exact > 0 {
            out.push_str(&format!(
                "There were {} jobs that failed with {} exactly the same as the last failed job:\n",
                self.exact, noun
            ));
            push_lines(&mut out, &baseline.errors);
        }

        if self.similar > 0 {
            out.push_str(&format!(
                "There were {} jobs that failed with {} similar to the last failed job:\n",
                self.similar, noun
            ));
            push_lines(&mut out, &baseline.errors);
            for exemplar in &self.similar_exemplars {
                out.push_str(&format!("Additional Failed Job (build #{}):\n", exemplar.build));
                push_lines(&mut out, &exemplar.errors);
            }
        }

        if self.distinct > 0 {
            out.push_str(&format!(
                "There were {} jobs that failed with different {}:\n",
                self.distinct, noun
            ));
            for exemplar in &self.distinct_exemplars {
                out.push_str(&format!("Distinct Failed Job (build #{}):\n", exemplar.build));
                push_lines(&mut out, &exemplar.errors);
            }
        }

        push_skipped(&mut out, &self.skipped);
        out
    }
}

fn push_lines(out: &mut String, errors: &ErrorSet) {
    for line in errors {
        out.push('\t');
        out.push_str(line);
        out.push('\n');
    }
}

fn push_skipped(out: &mut String, skipped: &[SkippedBuild]) {
    if skipped.is_empty() {
        return;
    }
    out.push_str(&format!("Skipped {} build(s):\n", skipped.len()));
    for s in skipped {
        out.push_str(&format!("\t#{}: {}\n", s.build, s.reason));
    }
}
