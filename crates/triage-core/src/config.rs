//! Triage configuration.
//!
//! Loaded from an optional TOML file; every key has a default so an empty
//! file (or no file) is a valid configuration.
//!
//! ```toml
//! similarity_threshold = 0.7
//! max_nested_depth = 4
//! ignore_patterns = [
//!     "^WARNING: .* error budget",
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::Result;
use crate::extract::NoiseFilter;
use crate::similarity::{SimilarityClusterer, DEFAULT_SIMILARITY_THRESHOLD};

/// Depth at which nested build references stop being followed.
pub const DEFAULT_MAX_NESTED_DEPTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TriageConfig {
    /// Minimum ratio for a build to count as a similar failure.
    pub similarity_threshold: f64,

    /// Extra ignore regexes appended to the built-in noise list.
    pub ignore_patterns: Vec<String>,

    /// How many levels of nested job references to follow.
    pub max_nested_depth: usize,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            ignore_patterns: Vec::new(),
            max_nested_depth: DEFAULT_MAX_NESTED_DEPTH,
        }
    }
}

impl TriageConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: TriageConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load `path` when given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.clusterer()?;
        self.noise_filter()?;
        Ok(())
    }

    pub fn clusterer(&self) -> Result<SimilarityClusterer> {
        SimilarityClusterer::new(self.similarity_threshold)
    }

    pub fn noise_filter(&self) -> Result<NoiseFilter> {
        NoiseFilter::with_extra_patterns(&self.ignore_patterns)
    }
}
