//! Error-line extraction.
//!
//! [`select_strategy`] inspects a console text and picks exactly one
//! [`ExtractionStrategy`]; [`extract`] then runs it. Extraction is a pure
//! function of the text: strategies that point at nested builds return the
//! references to follow instead of fetching them.
//!
//! - `matchers`: nested job/view reference detectors
//! - `range`: delimited region state machine
//! - `noise`: error-marker scan with an ignore list

pub mod matchers;
pub mod noise;
pub mod range;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::ErrorSet;
pub use matchers::{LineMatcher, NestedReference, FAILURE_MATCHERS, SUCCESS_MATCHERS};
pub use noise::{NoiseFilter, DEFAULT_IGNORE_PATTERNS};
pub use range::{extract_range, Delimiters, RangeState};

/// Lines of a console log.
///
/// Splits on `\n`, `\r\n` and a lone `\r`, so carriage-return progress
/// output yields one line per redraw. A trailing terminator does not produce
/// an empty final line.
pub fn console_lines(text: &str) -> ConsoleLines<'_> {
    ConsoleLines { rest: text }
}

/// Iterator returned by [`console_lines`].
#[derive(Debug, Clone)]
pub struct ConsoleLines<'a> {
    rest: &'a str,
}

impl<'a> Iterator for ConsoleLines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        let Some(end) = self.rest.find(|c| c == '\r' || c == '\n') else {
            let line = self.rest;
            self.rest = "";
            return Some(line);
        };
        let line = &self.rest[..end];
        let skip = if self.rest[end..].starts_with("\r\n") { 2 } else { 1 };
        self.rest = &self.rest[end + skip..];
        Some(line)
    }
}

const SUCCESS_MARKERS: &[&str] = &["status : SUCCESS", "completed with result SUCCESS"];
const FAILURE_MARKERS: &[&str] = &["status : FAILURE", "completed with result FAILURE"];

/// How error lines are pulled out of one console text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    SuccessWithBuild,
    SuccessWithoutBuild,
    FailureWithBuild,
    FailureWithoutBuild,
    Delimited,
    NoiseFiltered,
}

impl ExtractionStrategy {
    /// Reference detectors for strategies that follow nested builds.
    pub fn matchers(&self) -> Option<&'static [LineMatcher]> {
        match self {
            ExtractionStrategy::SuccessWithBuild | ExtractionStrategy::SuccessWithoutBuild => {
                Some(SUCCESS_MATCHERS)
            }
            ExtractionStrategy::FailureWithBuild | ExtractionStrategy::FailureWithoutBuild => {
                Some(FAILURE_MATCHERS)
            }
            ExtractionStrategy::Delimited | ExtractionStrategy::NoiseFiltered => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ExtractionStrategy::SuccessWithBuild | ExtractionStrategy::SuccessWithoutBuild
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExtractionStrategy::SuccessWithBuild => "success_with_build",
            ExtractionStrategy::SuccessWithoutBuild => "success_without_build",
            ExtractionStrategy::FailureWithBuild => "failure_with_build",
            ExtractionStrategy::FailureWithoutBuild => "failure_without_build",
            ExtractionStrategy::Delimited => "delimited",
            ExtractionStrategy::NoiseFiltered => "noise_filtered",
        }
    }
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pick the extraction strategy for `text`.
///
/// Decision order, first match wins:
/// 1. success marker -> success variant
/// 2. failure marker -> failure variant
/// 3. both delimiters supplied -> `Delimited`
/// 4. otherwise -> `NoiseFiltered`
///
/// The `WithBuild` variants are chosen when some line carries a numbered
/// `Finished Build : #<N>` reference.
pub fn select_strategy(text: &str, delimiters: Option<&Delimiters>) -> ExtractionStrategy {
    if SUCCESS_MARKERS.iter().any(|m| text.contains(m)) {
        return if console_lines(text).any(|l| matchers::success_with_build(l).is_some()) {
            ExtractionStrategy::SuccessWithBuild
        } else {
            ExtractionStrategy::SuccessWithoutBuild
        };
    }

    if FAILURE_MARKERS.iter().any(|m| text.contains(m)) {
        return if console_lines(text).any(|l| matchers::failure_with_build(l).is_some()) {
            ExtractionStrategy::FailureWithBuild
        } else {
            ExtractionStrategy::FailureWithoutBuild
        };
    }

    if delimiters.is_some() {
        return ExtractionStrategy::Delimited;
    }

    ExtractionStrategy::NoiseFiltered
}

/// Output of running one strategy over one text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Error lines found directly in the text.
    Lines(ErrorSet),
    /// Nested builds whose text holds the errors, in line order.
    References(Vec<NestedReference>),
}

impl Extraction {
    /// The extracted lines; references yield an empty set.
    pub fn into_lines(self) -> ErrorSet {
        match self {
            Extraction::Lines(set) => set,
            Extraction::References(_) => ErrorSet::default(),
        }
    }
}

/// Run `strategy` over `text`.
///
/// `Delimited` without delimiters yields no lines.
pub fn extract(
    text: &str,
    strategy: ExtractionStrategy,
    delimiters: Option<&Delimiters>,
    noise: &NoiseFilter,
) -> Extraction {
    if let Some(table) = strategy.matchers() {
        return Extraction::References(matchers::find_references(table, text));
    }

    match strategy {
        ExtractionStrategy::Delimited => Extraction::Lines(
            delimiters
                .map(|d| extract_range(text, d))
                .unwrap_or_default(),
        ),
        _ => Extraction::Lines(noise.extract(text)),
    }
}
