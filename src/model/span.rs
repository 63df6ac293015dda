//! Structural spans slated for deletion.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// What a removed region contained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanKind {
    FontTable,
    ColorTable,
    StyleSheet,
    InfoBlock,
    PictureBlock,
    ObjectBlock,
    GeneratorBlock,
    ListTable,
    /// Legacy paragraph numbering text (`\pntxta`, `\pntxtb`)
    NumberingText,
    /// Any other `{\*\word ...}` group
    IgnorableDestination,
    /// Hex, base64, raster or XMP data outside a recognized group
    BinaryPayload,
}

impl SpanKind {
    /// Map a group keyword to its kind.
    ///
    /// `starred` tells whether the group was marked `\*`; unknown starred
    /// keywords are ignorable destinations, unknown plain ones are content.
    pub fn from_keyword(keyword: &str, starred: bool) -> Option<Self> {
        let kind = match keyword {
            "fonttbl" => SpanKind::FontTable,
            "colortbl" => SpanKind::ColorTable,
            "stylesheet" => SpanKind::StyleSheet,
            "info" => SpanKind::InfoBlock,
            "generator" => SpanKind::GeneratorBlock,
            "pict" | "shppict" => SpanKind::PictureBlock,
            "object" => SpanKind::ObjectBlock,
            "listtable" | "listoverridetable" => SpanKind::ListTable,
            "pntxta" | "pntxtb" => SpanKind::NumberingText,
            _ if starred => SpanKind::IgnorableDestination,
            _ => return None,
        };
        Some(kind)
    }

    /// Short label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            SpanKind::FontTable => "font table",
            SpanKind::ColorTable => "color table",
            SpanKind::StyleSheet => "style sheet",
            SpanKind::InfoBlock => "info block",
            SpanKind::PictureBlock => "picture",
            SpanKind::ObjectBlock => "object",
            SpanKind::GeneratorBlock => "generator",
            SpanKind::ListTable => "list table",
            SpanKind::NumberingText => "numbering text",
            SpanKind::IgnorableDestination => "ignorable destination",
            SpanKind::BinaryPayload => "binary payload",
        }
    }
}

impl std::fmt::Display for SpanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A byte range of the text to delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralSpan {
    /// Start offset (inclusive)
    pub start: usize,
    /// End offset (exclusive)
    pub end: usize,
    /// What the range contained
    pub kind: SpanKind,
}

impl StructuralSpan {
    /// Create a new span.
    pub fn new(start: usize, end: usize, kind: SpanKind) -> Self {
        Self { start, end, kind }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span covers nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The span as a range.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}
