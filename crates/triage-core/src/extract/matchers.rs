//! Line detectors for references to nested jobs and views.
//!
//! Upstream/downstream Jenkins jobs announce the builds they triggered with
//! one of a few fixed phrasings. Each detector recognises one phrasing and
//! yields the referenced target. Detectors are grouped in ordered tables per
//! outcome; within a line the first detector that matches wins.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::console_lines;
use crate::domain::BuildNumber;

static FAILURE_WITH_BUILD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Finished Build : #(?P<build>\d+) of Job : (?P<job>.*) with status : FAILURE")
        .expect("valid regex")
});

static FAILURE_WITHOUT_BUILD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r".* » (?P<job>.*) completed with result FAILURE").expect("valid regex")
});

static SUCCESS_WITH_BUILD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Finished Build : #(?P<build>\d+) of Job : (?P<job>.*) with status : SUCCESS")
        .expect("valid regex")
});

static SUCCESS_WITHOUT_BUILD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r".* » (?P<view>.*),beaker completed with result SUCCESS").expect("valid regex")
});

/// Matrix views that pin `PLATFORM=NONE` are published under a layout key
/// that also carries an (empty) `SCM_BRANCH` axis.
const PLATFORM_NONE: &str = "PLATFORM=NONE,";
const PLATFORM_NONE_LAYOUT: &str = "PLATFORM=NONE,SCM_BRANCH=";

/// A pointer from one console line to another job or view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedReference {
    /// Job name (failure references) or layout/view name (success references).
    pub target: String,
    pub build: BuildNumber,
}

impl NestedReference {
    pub fn new(target: impl Into<String>, build: BuildNumber) -> Self {
        Self {
            target: target.into(),
            build,
        }
    }
}

/// A named line detector.
#[derive(Debug, Clone, Copy)]
pub struct LineMatcher {
    pub name: &'static str,
    pub detect: fn(&str) -> Option<NestedReference>,
}

/// Detectors tried on each line of a failed upstream build, in order.
pub const FAILURE_MATCHERS: &[LineMatcher] = &[
    LineMatcher {
        name: "failure_with_build",
        detect: failure_with_build,
    },
    LineMatcher {
        name: "failure_without_build",
        detect: failure_without_build,
    },
];

/// Detectors tried on each line of a successful upstream build, in order.
pub const SUCCESS_MATCHERS: &[LineMatcher] = &[
    LineMatcher {
        name: "success_with_build",
        detect: success_with_build,
    },
    LineMatcher {
        name: "success_without_build",
        detect: success_without_build,
    },
];

fn numbered(re: &Regex, line: &str) -> Option<NestedReference> {
    let caps = re.captures(line)?;
    let build = caps["build"].parse().ok()?;
    Some(NestedReference::new(&caps["job"], BuildNumber::Number(build)))
}

/// `Finished Build : #<N> of Job : <name> with status : FAILURE`
pub fn failure_with_build(line: &str) -> Option<NestedReference> {
    numbered(&FAILURE_WITH_BUILD, line)
}

/// `<anything> » <job> completed with result FAILURE`
pub fn failure_without_build(line: &str) -> Option<NestedReference> {
    let caps = FAILURE_WITHOUT_BUILD.captures(line)?;
    Some(NestedReference::new(&caps["job"], BuildNumber::Latest))
}

/// `Finished Build : #<N> of Job : <name> with status : SUCCESS`
pub fn success_with_build(line: &str) -> Option<NestedReference> {
    numbered(&SUCCESS_WITH_BUILD, line)
}

/// `<anything> » <view>,beaker completed with result SUCCESS`
///
/// The view name is rewritten to its layout key before being returned.
pub fn success_without_build(line: &str) -> Option<NestedReference> {
    let caps = SUCCESS_WITHOUT_BUILD.captures(line)?;
    let view = caps["view"].replace(PLATFORM_NONE, PLATFORM_NONE_LAYOUT);
    Some(NestedReference::new(view, BuildNumber::Latest))
}

/// First reference any matcher in `table` finds on `line`.
pub fn match_line(table: &[LineMatcher], line: &str) -> Option<NestedReference> {
    table.iter().find_map(|m| (m.detect)(line))
}

/// All references in `text`, in line order, at most one per line.
pub fn find_references(table: &[LineMatcher], text: &str) -> Vec<NestedReference> {
    console_lines(text)
        .filter_map(|line| match_line(table, line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_with_build() {
        let line = "Finished Build : #12 of Job : build-foo with status : FAILURE";
        assert_eq!(
            failure_with_build(line),
            Some(NestedReference::new("build-foo", BuildNumber::Number(12)))
        );
        assert_eq!(success_with_build(line), None);
    }

    #[test]
    fn test_failure_with_build_requires_digits() {
        let line = "Finished Build : # of Job : build-foo with status : FAILURE";
        assert_eq!(failure_with_build(line), None);
    }

    #[test]
    fn test_failure_without_build_takes_last_segment() {
        let line = "pipeline » stage » deploy-job completed with result FAILURE";
        assert_eq!(
            failure_without_build(line),
            Some(NestedReference::new("deploy-job", BuildNumber::Latest))
        );
    }

    #[test]
    fn test_success_with_build() {
        let line = "Finished Build : #3 of Job : smoke with status : SUCCESS";
        assert_eq!(
            success_with_build(line),
            Some(NestedReference::new("smoke", BuildNumber::Number(3)))
        );
    }

    #[test]
    fn test_success_without_build_rewrites_platform_none() {
        let line = "acceptance » LAYOUT=centos7,PLATFORM=NONE,UPGRADE=NONE,beaker completed with result SUCCESS";
        let reference = success_without_build(line).expect("should match");
        assert_eq!(
            reference.target,
            "LAYOUT=centos7,PLATFORM=NONE,SCM_BRANCH=UPGRADE=NONE"
        );
        assert_eq!(reference.build, BuildNumber::Latest);
    }

    #[test]
    fn test_success_without_build_leaves_other_views_alone() {
        let line = "acceptance » LAYOUT=ubuntu,beaker completed with result SUCCESS";
        assert_eq!(success_without_build(line).unwrap().target, "LAYOUT=ubuntu");
    }

    #[test]
    fn test_success_without_build_needs_beaker_suffix() {
        let line = "acceptance » LAYOUT=ubuntu completed with result SUCCESS";
        assert_eq!(success_without_build(line), None);
    }

    #[test]
    fn test_match_line_first_match_wins() {
        let line = "Finished Build : #5 of Job : a » b completed with result FAILURE with status : FAILURE";
        let reference = match_line(FAILURE_MATCHERS, line).unwrap();
        assert_eq!(reference.build, BuildNumber::Number(5));
    }

    #[test]
    fn test_find_references_in_line_order() {
        let text = "\
Started by upstream
Finished Build : #7 of Job : unit with status : FAILURE
noise
x » integration completed with result FAILURE
";
        let refs = find_references(FAILURE_MATCHERS, text);
        assert_eq!(
            refs,
            vec![
                NestedReference::new("unit", BuildNumber::Number(7)),
                NestedReference::new("integration", BuildNumber::Latest),
            ]
        );
    }

    #[test]
    fn test_tables_are_ordered() {
        let names: Vec<_> = FAILURE_MATCHERS.iter().map(|m| m.name).collect();
        assert_eq!(names, ["failure_with_build", "failure_without_build"]);
        let names: Vec<_> = SUCCESS_MATCHERS.iter().map(|m| m.name).collect();
        assert_eq!(names, ["success_with_build", "success_without_build"]);
    }
}
