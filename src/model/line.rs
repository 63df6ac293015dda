//! Line classification records produced by the noise filter.

use serde::{Deserialize, Serialize};

/// Classification outcome for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineOutcome {
    Keep,
    Drop,
}

/// One physical line and how the noise filter classified it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineRecord {
    /// Trimmed line content
    pub line: String,
    /// Keep or drop
    pub outcome: LineOutcome,
    /// Name of the rule that dropped the line
    pub rule: Option<&'static str>,
}

impl LineRecord {
    /// A kept line.
    pub fn keep(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            outcome: LineOutcome::Keep,
            rule: None,
        }
    }

    /// A line dropped by `rule`.
    pub fn drop(line: impl Into<String>, rule: &'static str) -> Self {
        Self {
            line: line.into(),
            outcome: LineOutcome::Drop,
            rule: Some(rule),
        }
    }

    /// Whether the line survives filtering.
    pub fn is_kept(&self) -> bool {
        self.outcome == LineOutcome::Keep
    }
}
