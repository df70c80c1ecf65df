//! Fallback extractor: lines mentioning an error, minus known noise.

use regex::{Regex, RegexSet};

use super::console_lines;
use crate::domain::{ErrorSet, Result, TriageError};

/// Case-insensitive marker a line must contain to count as an error.
pub const ERROR_MARKER: &str = "error";

/// Benign lines that mention errors but never explain a failure.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    // git plugin on repos without submodules
    r"ERROR: No submodules found.",
    // unresolved build parameter substitution
    r"Failed to resolve parameters in string SHA=\$\{enterprise_dist_sha\} due to following error:",
    // wget robots.txt notice
    r"Loading robots.txt; please ignore errors.",
    r".* ERROR 404: Not Found.",
];

/// Error-line scanner with an ignore list of regular expressions.
#[derive(Debug, Clone)]
pub struct NoiseFilter {
    patterns: Vec<String>,
    set: RegexSet,
}

impl NoiseFilter {
    /// Use exactly `patterns` as the ignore list.
    pub fn with_patterns<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();

        for pattern in &patterns {
            Regex::new(pattern).map_err(|e| TriageError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
        }

        let set = RegexSet::new(&patterns).map_err(|e| TriageError::InvalidPattern {
            pattern: patterns.join(" | "),
            reason: e.to_string(),
        })?;

        Ok(Self { patterns, set })
    }

    /// Default ignore list extended with `extra`.
    pub fn with_extra_patterns(extra: &[String]) -> Result<Self> {
        Self::with_patterns(
            DEFAULT_IGNORE_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .chain(extra.iter().cloned()),
        )
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether `line` matches any ignore pattern (search semantics).
    pub fn is_ignored(&self, line: &str) -> bool {
        self.set.is_match(line)
    }

    pub fn is_error_line(line: &str) -> bool {
        line.to_lowercase().contains(ERROR_MARKER)
    }

    /// Keep lines that mention an error and match no ignore pattern.
    pub fn extract(&self, text: &str) -> ErrorSet {
        console_lines(text)
            .filter(|line| Self::is_error_line(line) && !self.is_ignored(line))
            .map(str::to_string)
            .collect()
    }
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self::with_patterns(DEFAULT_IGNORE_PATTERNS.iter().copied())
            .expect("default ignore patterns compile")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_patterns_compile() {
        let filter = NoiseFilter::default();
        assert_eq!(filter.patterns().len(), DEFAULT_IGNORE_PATTERNS.len());
    }

    #[test]
    fn test_keeps_error_lines_case_insensitively() {
        let filter = NoiseFilter::default();
        let text = "ok\nError: boom\nfatal ERROR in step\nno problems\nerrors=0";
        assert_eq!(
            filter.extract(text),
            ErrorSet::from(vec!["Error: boom", "fatal ERROR in step", "errors=0"])
        );
    }

    #[test]
    fn test_submodule_notice_is_ignored() {
        let filter = NoiseFilter::default();
        assert!(filter.extract("ERROR: No submodules found.").is_empty());
    }

    #[test]
    fn test_each_default_pattern_suppresses_its_line() {
        let filter = NoiseFilter::default();
        let text = "\
ERROR: No submodules found.
Failed to resolve parameters in string SHA=${enterprise_dist_sha} due to following error:
Loading robots.txt; please ignore errors.
2018-01-01 12:00:00 ERROR 404: Not Found.
ERROR: real failure";
        assert_eq!(filter.extract(text), ErrorSet::from(vec!["ERROR: real failure"]));
    }

    #[test]
    fn test_ignored_lines_never_leak() {
        let filter = NoiseFilter::with_extra_patterns(&["flaky-error-\\d+".to_string()]).unwrap();
        let text = "flaky-error-12\nerror: compile\nwarn: flaky-error-7 again";
        let out = filter.extract(text);
        assert!(out.lines().iter().all(|l| !filter.is_ignored(l)));
        assert_eq!(out, ErrorSet::from(vec!["error: compile"]));
    }

    #[test]
    fn test_extra_patterns_append_to_defaults() {
        let filter = NoiseFilter::with_extra_patterns(&["^WARN".to_string()]).unwrap();
        assert_eq!(filter.patterns().len(), DEFAULT_IGNORE_PATTERNS.len() + 1);
        assert_eq!(filter.patterns().last().map(String::as_str), Some("^WARN"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let err = NoiseFilter::with_extra_patterns(&["(unclosed".to_string()]).unwrap_err();
        match err {
            TriageError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "(unclosed"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_ignore_list() {
        let filter = NoiseFilter::with_patterns(Vec::<String>::new()).unwrap();
        assert_eq!(
            filter.extract("ERROR: No submodules found."),
            ErrorSet::from(vec!["ERROR: No submodules found."])
        );
    }

    #[test]
    fn test_carriage_return_progress_is_split() {
        let filter = NoiseFilter::default();
        let text = "Downloading 10%\rDownloading 100%\rERROR: compile failed\n";
        assert_eq!(
            filter.extract(text),
            ErrorSet::from(vec!["ERROR: compile failed"])
        );
    }

    fn console_line() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("ERROR: No submodules found.".to_string()),
            Just("Loading robots.txt; please ignore errors.".to_string()),
            Just("12:00:01 ERROR 404: Not Found.".to_string()),
            Just("Failed to resolve parameters in string SHA=${enterprise_dist_sha} due to following error:".to_string()),
            "(error|ERROR|Error)?[a-z0-9 :]{0,24}",
        ]
    }

    proptest! {
        #[test]
        fn proptest_ignored_lines_never_leak(lines in prop::collection::vec(console_line(), 0..40)) {
            let filter = NoiseFilter::default();
            let out = filter.extract(&lines.join("\n"));
            for line in out.lines() {
                prop_assert!(!filter.is_ignored(line));
                prop_assert!(NoiseFilter::is_error_line(line));
            }
        }
    }
}
