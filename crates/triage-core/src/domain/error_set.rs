//! Ordered error lines extracted from one build.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::build::BuildNumber;
use crate::extract::ExtractionStrategy;

/// Ordered sequence of error lines for one build.
///
/// Order is significant and the lines are never mutated once extracted;
/// sets are compared, never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorSet(Vec<String>);

impl ErrorSet {
    pub fn new(lines: Vec<String>) -> Self {
        ErrorSet(lines)
    }

    pub fn lines(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// SHA-256 over the lines, NUL separated.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for line in &self.0 {
            hasher.update(line.as_bytes());
            hasher.update(b"\0");
        }
        hex::encode(hasher.finalize())
    }

    pub fn into_lines(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for ErrorSet {
    fn from(lines: Vec<String>) -> Self {
        ErrorSet(lines)
    }
}

impl From<Vec<&str>> for ErrorSet {
    fn from(lines: Vec<&str>) -> Self {
        ErrorSet(lines.into_iter().map(str::to_string).collect())
    }
}

impl FromIterator<String> for ErrorSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        ErrorSet(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ErrorSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// An [`ErrorSet`] tagged with the build it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildErrors {
    pub job: String,
    pub build: BuildNumber,
    pub strategy: ExtractionStrategy,
    pub errors: ErrorSet,
}
