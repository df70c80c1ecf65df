//! Build identity types shared by the collaborator and the run loop.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A build identifier: a concrete number, or whatever ran last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildNumber {
    Number(u32),
    Latest,
}

impl fmt::Display for BuildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildNumber::Number(n) => write!(f, "{}", n),
            BuildNumber::Latest => write!(f, "latest"),
        }
    }
}

impl FromStr for BuildNumber {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("latest") {
            Ok(BuildNumber::Latest)
        } else {
            s.trim().parse().map(BuildNumber::Number)
        }
    }
}

impl From<u32> for BuildNumber {
    fn from(n: u32) -> Self {
        BuildNumber::Number(n)
    }
}

impl Serialize for BuildNumber {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BuildNumber::Number(n) => serializer.serialize_u32(*n),
            BuildNumber::Latest => serializer.serialize_str("latest"),
        }
    }
}

impl<'de> Deserialize<'de> for BuildNumber {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(BuildNumber::Number(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Final result of a build as reported by the CI server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    Success,
    Failure,
    Unstable,
    Aborted,
    NotBuilt,
    /// No result yet (Jenkins reports `null` while a build runs).
    InProgress,
}

impl BuildResult {
    /// Map an optional Jenkins result string; `None` means still running.
    pub fn from_jenkins(result: Option<&str>) -> Self {
        match result {
            Some("SUCCESS") => BuildResult::Success,
            Some("FAILURE") => BuildResult::Failure,
            Some("UNSTABLE") => BuildResult::Unstable,
            Some("ABORTED") => BuildResult::Aborted,
            Some("NOT_BUILT") => BuildResult::NotBuilt,
            _ => BuildResult::InProgress,
        }
    }
}

/// One entry of a job's build history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildSummary {
    pub number: u32,
    pub result: BuildResult,
}

impl BuildSummary {
    pub fn new(number: u32, result: BuildResult) -> Self {
        Self { number, result }
    }

    pub fn failed(&self) -> bool {
        self.result == BuildResult::Failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_number_parse_and_display() {
        assert_eq!("42".parse::<BuildNumber>().unwrap(), BuildNumber::Number(42));
        assert_eq!("latest".parse::<BuildNumber>().unwrap(), BuildNumber::Latest);
        assert_eq!("LATEST".parse::<BuildNumber>().unwrap(), BuildNumber::Latest);
        assert!("forty-two".parse::<BuildNumber>().is_err());

        assert_eq!(BuildNumber::Number(7).to_string(), "7");
        assert_eq!(BuildNumber::Latest.to_string(), "latest");
    }

    #[test]
    fn test_build_number_serde() {
        let json = serde_json::to_string(&BuildNumber::Number(12)).unwrap();
        assert_eq!(json, "12");
        let json = serde_json::to_string(&BuildNumber::Latest).unwrap();
        assert_eq!(json, "\"latest\"");

        let parsed: BuildNumber = serde_json::from_str("\"latest\"").unwrap();
        assert_eq!(parsed, BuildNumber::Latest);
        let parsed: BuildNumber = serde_json::from_str("12").unwrap();
        assert_eq!(parsed, BuildNumber::Number(12));
    }

    #[test]
    fn test_build_result_from_jenkins() {
        assert_eq!(BuildResult::from_jenkins(Some("FAILURE")), BuildResult::Failure);
        assert_eq!(BuildResult::from_jenkins(Some("SUCCESS")), BuildResult::Success);
        assert_eq!(BuildResult::from_jenkins(Some("NOT_BUILT")), BuildResult::NotBuilt);
        assert_eq!(BuildResult::from_jenkins(None), BuildResult::InProgress);
    }

    #[test]
    fn test_build_summary_failed() {
        assert!(BuildSummary::new(3, BuildResult::Failure).failed());
        assert!(!BuildSummary::new(4, BuildResult::Unstable).failed());
    }
}
