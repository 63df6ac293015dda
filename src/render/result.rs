//! Extraction result with diagnostics and statistics.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::detect::RtfFormat;
use crate::model::{EscapeToken, LineRecord, SpanKind};

/// Result of extracting a document: the text and how it was produced.
#[derive(Debug, Clone, Serialize)]
pub struct RenderResult {
    /// The extracted text
    pub content: String,

    /// Per-stage diagnostics
    pub report: ExtractionReport,
}

impl RenderResult {
    /// Create a new render result.
    pub fn new(content: String, report: ExtractionReport) -> Self {
        Self { content, report }
    }

    /// Create a simple result with just content.
    pub fn content_only(content: String) -> Self {
        Self {
            content,
            report: ExtractionReport::default(),
        }
    }

    /// Get the content length in bytes.
    pub fn content_len(&self) -> usize {
        self.content.len()
    }

    /// Extraction statistics.
    pub fn stats(&self) -> &ExtractionStats {
        &self.report.stats
    }
}

/// What each stage saw and did. Diagnostics only; nothing downstream reads it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionReport {
    /// Header information, when the input starts like RTF
    pub format: Option<RtfFormat>,

    /// Encoding the byte decoder settled on
    pub encoding: String,

    /// Whether the lossy fallback ran
    pub lossy_decode: bool,

    /// Every `\uN` escape seen, in order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<EscapeToken>,

    /// Removed spans per kind
    pub spans_by_kind: BTreeMap<SpanKind, usize>,

    /// Groups removed through end of text
    pub unclosed_groups: usize,

    /// Dropped lines per rule name
    pub dropped_by_rule: BTreeMap<&'static str, usize>,

    /// Classification of every line reaching the noise filter
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<LineRecord>,

    /// Counters
    pub stats: ExtractionStats,
}

impl ExtractionReport {
    /// Record line classifications and update the line counters.
    pub fn record_lines(&mut self, lines: Vec<LineRecord>) {
        for record in &lines {
            match record.rule {
                Some(rule) if !record.is_kept() => {
                    *self.dropped_by_rule.entry(rule).or_default() += 1;
                    self.stats.lines_dropped += 1;
                }
                _ => self.stats.lines_kept += 1,
            }
        }
        self.lines = lines;
    }

    /// Record a removed span.
    pub fn record_span(&mut self, kind: SpanKind, len: usize) {
        *self.spans_by_kind.entry(kind).or_default() += 1;
        self.stats.spans_removed += 1;
        self.stats.bytes_removed += len as u64;
    }
}

/// Statistics collected during content extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionStats {
    /// Size of the raw input
    pub input_bytes: u64,

    /// `\uN` escapes turned into characters
    pub escapes_resolved: u32,

    /// `\uN` escapes left as written
    pub escapes_unresolved: u32,

    /// `\'hh` bytes decoded through the code page
    pub hex_bytes_decoded: u32,

    /// Groups and payload runs removed
    pub spans_removed: u32,

    /// Bytes of text removed with them
    pub bytes_removed: u64,

    /// Lines kept by the noise filter
    pub lines_kept: u32,

    /// Lines dropped by the noise filter
    pub lines_dropped: u32,

    /// Approximate word count (whitespace-separated tokens)
    pub word_count: u32,

    /// Character count (excluding whitespace)
    pub char_count: u32,
}

impl ExtractionStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add word and character counts from text.
    pub fn count_text(&mut self, text: &str) {
        // Word count: whitespace-separated tokens
        self.word_count += text.split_whitespace().count() as u32;

        // Character count: non-whitespace characters
        self.char_count += text.chars().filter(|c| !c.is_whitespace()).count() as u32;
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &ExtractionStats) {
        self.input_bytes += other.input_bytes;
        self.escapes_resolved += other.escapes_resolved;
        self.escapes_unresolved += other.escapes_unresolved;
        self.hex_bytes_decoded += other.hex_bytes_decoded;
        self.spans_removed += other.spans_removed;
        self.bytes_removed += other.bytes_removed;
        self.lines_kept += other.lines_kept;
        self.lines_dropped += other.lines_dropped;
        self.word_count += other.word_count;
        self.char_count += other.char_count;
    }
}
