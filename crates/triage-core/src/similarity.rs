//! Cross-build similarity clustering.
//!
//! Each build's [`ErrorSet`] is compared against a fixed baseline (the first
//! non-empty set of the run) with a normalised longest-common-subsequence
//! ratio over whole lines:
//!
//! ```text
//! ratio = 2 * LCS(a, b) / (len(a) + len(b))
//! ```
//!
//! | ratio                    | classification |
//! |--------------------------|----------------|
//! | `1.0`                    | `Exact`        |
//! | `[threshold, 1.0)`       | `Similar`      |
//! | `[0.0, threshold)`       | `Distinct`     |

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::{BuildErrors, ErrorSet, Result, TriageError};

/// Lowest ratio still considered a recurrence of the baseline failure.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

/// Bucket a candidate falls into relative to the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Exact,
    Similar,
    Distinct,
}

/// Result of comparing one candidate against the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub classification: Classification,
    pub ratio: f64,
    /// Number of lines in the longest common subsequence.
    pub matches: usize,
}

/// Length of the longest common subsequence of two line sequences.
pub fn lcs_len(a: &[String], b: &[String]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for line_a in a {
        for (j, line_b) in b.iter().enumerate() {
            curr[j + 1] = if line_a == line_b {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Normalised similarity in `[0, 1]`. Two empty sets are identical.
pub fn similarity_ratio(a: &ErrorSet, b: &ErrorSet) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * lcs_len(a.lines(), b.lines()) as f64 / total as f64
}

/// Classifies candidates against a baseline with a fixed threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityClusterer {
    threshold: f64,
}

impl SimilarityClusterer {
    /// `threshold` must lie in `(0, 1]`.
    pub fn new(threshold: f64) -> Result<Self> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(TriageError::InvalidThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn classify(&self, baseline: &ErrorSet, candidate: &ErrorSet) -> Comparison {
        let matches = lcs_len(baseline.lines(), candidate.lines());
        let total = baseline.len() + candidate.len();

        // Exactness on integer counts: ratio == 1.0 iff every line matched.
        if 2 * matches == total {
            return Comparison {
                classification: Classification::Exact,
                ratio: 1.0,
                matches,
            };
        }

        let ratio = 2.0 * matches as f64 / total as f64;
        let classification = if ratio >= self.threshold {
            Classification::Similar
        } else {
            Classification::Distinct
        };

        Comparison {
            classification,
            ratio,
            matches,
        }
    }
}

impl Default for SimilarityClusterer {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

/// What happened to one build fed into a [`SimilarityBucket`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    /// First non-empty set of the run; now the fixed baseline.
    Baseline,
    /// Compared against the baseline.
    Compared(Comparison),
    /// Nothing extracted; not compared and never a baseline.
    Empty,
}

/// Running aggregate of one triage run.
///
/// The baseline is fixed by the first non-empty set and never replaced.
/// Exemplars are deduplicated by content digest and kept in arrival order.
#[derive(Debug, Clone, Default)]
pub struct SimilarityBucket {
    clusterer: SimilarityClusterer,
    baseline: Option<BuildErrors>,
    exact: usize,
    similar: usize,
    distinct: usize,
    empty: usize,
    similar_exemplars: Vec<BuildErrors>,
    distinct_exemplars: Vec<BuildErrors>,
    seen: HashSet<(Classification, String)>,
}

impl SimilarityBucket {
    pub fn new(clusterer: SimilarityClusterer) -> Self {
        Self {
            clusterer,
            ..Default::default()
        }
    }

    pub fn observe(&mut self, build: BuildErrors) -> Observation {
        if build.errors.is_empty() {
            self.empty += 1;
            return Observation::Empty;
        }

        let Some(baseline) = &self.baseline else {
            self.baseline = Some(build);
            return Observation::Baseline;
        };

        let comparison = self.clusterer.classify(&baseline.errors, &build.errors);
        match comparison.classification {
            Classification::Exact => self.exact += 1,
            Classification::Similar => {
                self.similar += 1;
                self.remember(Classification::Similar, build);
            }
            Classification::Distinct => {
                self.distinct += 1;
                self.remember(Classification::Distinct, build);
            }
        }

        Observation::Compared(comparison)
    }

    fn remember(&mut self, classification: Classification, build: BuildErrors) {
        if !self.seen.insert((classification, build.errors.digest())) {
            return;
        }
        match classification {
            Classification::Similar => self.similar_exemplars.push(build),
            Classification::Distinct => self.distinct_exemplars.push(build),
            Classification::Exact => {}
        }
    }

    pub fn baseline(&self) -> Option<&BuildErrors> {
        self.baseline.as_ref()
    }

    pub fn exact(&self) -> usize {
        self.exact
    }

    pub fn similar(&self) -> usize {
        self.similar
    }

    pub fn distinct(&self) -> usize {
        self.distinct
    }

    pub fn empty(&self) -> usize {
        self.empty
    }

    pub fn similar_exemplars(&self) -> &[BuildErrors] {
        &self.similar_exemplars
    }

    pub fn distinct_exemplars(&self) -> &[BuildErrors] {
        &self.distinct_exemplars
    }

    pub fn threshold(&self) -> f64 {
        self.clusterer.threshold()
    }

    /// Consume the bucket, handing its parts to the report.
    pub fn into_parts(self) -> BucketParts {
        BucketParts {
            baseline: self.baseline,
            exact: self.exact,
            similar: self.similar,
            distinct: self.distinct,
            empty: self.empty,
            similar_exemplars: self.similar_exemplars,
            distinct_exemplars: self.distinct_exemplars,
        }
    }
}

/// Owned contents of a finished [`SimilarityBucket`].
#[derive(Debug, Clone)]
pub struct BucketParts {
    pub baseline: Option<BuildErrors>,
    pub exact: usize,
    pub similar: usize,
    pub distinct: usize,
    pub empty: usize,
    pub similar_exemplars: Vec<BuildErrors>,
    pub distinct_exemplars: Vec<BuildErrors>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BuildNumber;
    use crate::extract::ExtractionStrategy;
    use proptest::prelude::*;

    fn set(lines: &[&str]) -> ErrorSet {
        ErrorSet::from(lines.to_vec())
    }

    fn build(n: u32, lines: &[&str]) -> BuildErrors {
        BuildErrors {
            job: "job".to_string(),
            build: BuildNumber::Number(n),
            strategy: ExtractionStrategy::NoiseFiltered,
            errors: set(lines),
        }
    }

    #[test]
    fn test_lcs_len() {
        let a: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let b: Vec<String> = ["b", "x", "d"].iter().map(|s| s.to_string()).collect();
        assert_eq!(lcs_len(&a, &b), 2);
        assert_eq!(lcs_len(&a, &[]), 0);
    }

    #[test]
    fn test_lines_are_atomic_tokens() {
        // Near-identical lines share nothing.
        let ratio = similarity_ratio(&set(&["error: a1"]), &set(&["error: a2"]));
        assert_eq!(ratio, 0.0);
    }

    #[test]
    fn test_exact_match() {
        let c = SimilarityClusterer::default();
        let cmp = c.classify(&set(&["err1", "err2"]), &set(&["err1", "err2"]));
        assert_eq!(cmp.classification, Classification::Exact);
        assert_eq!(cmp.ratio, 1.0);
    }

    #[test]
    fn test_half_overlap_is_distinct() {
        let c = SimilarityClusterer::default();
        let cmp = c.classify(&set(&["err1", "err2"]), &set(&["err1", "err3"]));
        assert_eq!(cmp.ratio, 0.5);
        assert_eq!(cmp.classification, Classification::Distinct);
    }

    #[test]
    fn test_similar_above_threshold() {
        let c = SimilarityClusterer::default();
        // 2*3 / (4+4) = 0.75
        let cmp = c.classify(&set(&["a", "b", "c", "d"]), &set(&["a", "b", "c", "x"]));
        assert_eq!(cmp.classification, Classification::Similar);
        assert!((cmp.ratio - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_threshold_boundary_is_similar() {
        let c = SimilarityClusterer::new(0.5).unwrap();
        let cmp = c.classify(&set(&["err1", "err2"]), &set(&["err1", "err3"]));
        assert_eq!(cmp.classification, Classification::Similar);
    }

    #[test]
    fn test_reordered_lines_not_exact() {
        let c = SimilarityClusterer::default();
        let cmp = c.classify(&set(&["a", "b"]), &set(&["b", "a"]));
        assert_ne!(cmp.classification, Classification::Exact);
    }

    #[test]
    fn test_reflexive() {
        let c = SimilarityClusterer::default();
        for lines in [vec!["x"], vec!["a", "b", "a"], vec!["1", "2", "3", "4", "5"]] {
            let s = ErrorSet::from(lines);
            let cmp = c.classify(&s, &s);
            assert_eq!(cmp.classification, Classification::Exact);
            assert_eq!(cmp.ratio, 1.0);
        }
    }

    #[test]
    fn test_buckets_partition_ratio_domain() {
        let c = SimilarityClusterer::default();
        let baseline = set(&["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"]);
        let mut last = Classification::Distinct;
        // Grow the shared prefix; classifications must move monotonically
        // Distinct -> Similar -> Exact with no overlap.
        for shared in 0..=10 {
            let mut lines: Vec<String> = baseline.lines()[..shared].to_vec();
            lines.extend((shared..10).map(|i| format!("other-{i}")));
            let cmp = c.classify(&baseline, &ErrorSet::new(lines));
            let expected = if cmp.ratio == 1.0 {
                Classification::Exact
            } else if cmp.ratio >= 0.7 {
                Classification::Similar
            } else {
                Classification::Distinct
            };
            assert_eq!(cmp.classification, expected);
            assert!(rank(cmp.classification) >= rank(last));
            last = cmp.classification;
        }
        assert_eq!(last, Classification::Exact);
    }

    fn rank(c: Classification) -> u8 {
        match c {
            Classification::Distinct => 0,
            Classification::Similar => 1,
            Classification::Exact => 2,
        }
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        assert!(SimilarityClusterer::new(0.0).is_err());
        assert!(SimilarityClusterer::new(1.5).is_err());
        assert!(SimilarityClusterer::new(f64::NAN).is_err());
        assert!(SimilarityClusterer::new(1.0).is_ok());
    }

    #[test]
    fn test_bucket_first_non_empty_becomes_baseline() {
        let mut bucket = SimilarityBucket::default();
        assert_eq!(bucket.observe(build(1, &[])), Observation::Empty);
        assert_eq!(bucket.observe(build(2, &["err1"])), Observation::Baseline);
        assert_eq!(bucket.baseline().unwrap().build, BuildNumber::Number(2));
        assert_eq!(bucket.empty(), 1);
    }

    #[test]
    fn test_bucket_never_rebaselines() {
        let mut bucket = SimilarityBucket::default();
        bucket.observe(build(1, &["a", "b"]));
        bucket.observe(build(2, &["x", "y"]));
        bucket.observe(build(3, &["x", "y"]));

        assert_eq!(bucket.baseline().unwrap().build, BuildNumber::Number(1));
        assert_eq!(bucket.exact(), 0);
        assert_eq!(bucket.distinct(), 2);
    }

    #[test]
    fn test_bucket_counts_and_dedups_exemplars() {
        let mut bucket = SimilarityBucket::default();
        bucket.observe(build(1, &["a", "b", "c", "d"]));
        bucket.observe(build(2, &["a", "b", "c", "d"]));
        bucket.observe(build(3, &["a", "b", "c", "x"]));
        bucket.observe(build(4, &["a", "b", "c", "x"]));
        bucket.observe(build(5, &["zzz"]));

        assert_eq!(bucket.exact(), 1);
        assert_eq!(bucket.similar(), 2);
        assert_eq!(bucket.distinct(), 1);
        assert_eq!(bucket.similar_exemplars().len(), 1);
        assert_eq!(bucket.similar_exemplars()[0].build, BuildNumber::Number(3));
        assert_eq!(bucket.distinct_exemplars().len(), 1);
    }

    #[test]
    fn test_bucket_empty_after_baseline_not_compared() {
        let mut bucket = SimilarityBucket::default();
        bucket.observe(build(1, &["a"]));
        assert_eq!(bucket.observe(build(2, &[])), Observation::Empty);
        assert_eq!(bucket.distinct(), 0);
        assert_eq!(bucket.empty(), 1);
    }

    fn error_lines() -> impl Strategy<Value = Vec<String>> {
        // small alphabet so generated sets overlap often
        prop::collection::vec("err[0-5]", 1..12)
    }

    proptest! {
        #[test]
        fn proptest_classify_is_reflexive(lines in error_lines()) {
            let s = ErrorSet::new(lines);
            let cmp = SimilarityClusterer::default().classify(&s, &s);
            prop_assert_eq!(cmp.classification, Classification::Exact);
            prop_assert_eq!(cmp.ratio, 1.0);
        }

        #[test]
        fn proptest_buckets_partition_ratio_domain(
            a in error_lines(),
            b in error_lines(),
            threshold in 0.05f64..=1.0,
        ) {
            let c = SimilarityClusterer::new(threshold).unwrap();
            let (a, b) = (ErrorSet::new(a), ErrorSet::new(b));
            let cmp = c.classify(&a, &b);

            prop_assert!((0.0..=1.0).contains(&cmp.ratio));
            prop_assert_eq!(cmp.ratio, similarity_ratio(&a, &b));
            let expected = if cmp.ratio == 1.0 {
                Classification::Exact
            } else if cmp.ratio >= threshold {
                Classification::Similar
            } else {
                Classification::Distinct
            };
            prop_assert_eq!(cmp.classification, expected);
        }

        #[test]
        fn proptest_classify_is_symmetric(a in error_lines(), b in error_lines()) {
            let c = SimilarityClusterer::default();
            let (a, b) = (ErrorSet::new(a), ErrorSet::new(b));
            prop_assert_eq!(c.classify(&a, &b), c.classify(&b, &a));
        }
    }
}
