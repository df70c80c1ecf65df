//! Delimited region extraction.

use serde::{Deserialize, Serialize};

use super::console_lines;
use crate::domain::ErrorSet;

/// Literal start/end markers bounding a region of interest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiters {
    pub start: String,
    pub end: String,
}

impl Delimiters {
    /// Both markers are required; an empty marker means "not supplied".
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Option<Self> {
        let start = start.into();
        let end = end.into();
        if start.is_empty() || end.is_empty() {
            return None;
        }
        Some(Self { start, end })
    }

    /// Build from two optional CLI values.
    pub fn from_options(start: Option<String>, end: Option<String>) -> Option<Self> {
        Self::new(start?, end?)
    }
}

/// Scanner state while walking the lines of a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeState {
    Outside,
    Inside,
}

impl RangeState {
    /// Advance over one line. Returns the next state and whether the line
    /// belongs to the output. Delimiter lines are never kept; the start
    /// marker is checked before the end marker.
    pub fn step(self, line: &str, delimiters: &Delimiters) -> (RangeState, bool) {
        if line.contains(&delimiters.start) {
            return (RangeState::Inside, false);
        }
        if line.contains(&delimiters.end) {
            return (RangeState::Outside, false);
        }
        (self, self == RangeState::Inside)
    }
}

/// Collect every line strictly between start and end markers.
///
/// Regions may recur and are concatenated. A region left open runs to the
/// end of the text.
pub fn extract_range(text: &str, delimiters: &Delimiters) -> ErrorSet {
    let mut state = RangeState::Outside;
    let mut lines = Vec::new();

    for line in console_lines(text) {
        let (next, keep) = state.step(line, delimiters);
        if keep {
            lines.push(line.to_string());
        }
        state = next;
    }

    ErrorSet::new(lines)
}
