//! Jenkins Triage Core Library
//!
//! Extracts the error signal from CI console logs and clusters failures
//! across builds by similarity, so a recurring failure can be told apart
//! from a new one.
//!
//! ## Pipeline
//!
//! 1. [`select_strategy`] picks one [`ExtractionStrategy`] per console text
//! 2. [`extract`] pulls lines out (or returns nested references to follow)
//! 3. [`SimilarityBucket`] compares each build against the fixed baseline
//! 4. [`TriageReport`] carries the result to the operator
//!
//! I/O happens only through the injected [`BuildSource`].

pub mod config;
pub mod domain;
pub mod extract;
pub mod fakes;
pub mod obs;
pub mod report;
pub mod similarity;
pub mod source;
pub mod telemetry;
pub mod triage;

pub use config::TriageConfig;
pub use domain::{
    BuildErrors, BuildNumber, BuildResult, BuildSummary, ErrorSet, FetchError, FetchResult,
    Result, TriageError,
};
pub use extract::{
    console_lines, extract, extract_range, select_strategy, Delimiters, Extraction,
    ExtractionStrategy, NestedReference, NoiseFilter, RangeState,
};
pub use report::{SkippedBuild, TriageMode, TriageReport};
pub use similarity::{
    similarity_ratio, Classification, Comparison, Observation, SimilarityBucket,
    SimilarityClusterer,
};
pub use source::BuildSource;
pub use telemetry::init_tracing;
pub use triage::Triage;

/// Jenkins Triage version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
