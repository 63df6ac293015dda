//! # unrtf
//!
//! Readable text extraction from RTF documents.
//!
//! RTF files carry their text between font tables, color tables, embedded
//! pictures and formatting commands. This library strips all of that and
//! returns the text, including Japanese and other multi-byte scripts written
//! as `\uN` or `\'hh` escapes.
//!
//! ## Quick Start
//!
//! ```
//! let text = unrtf::extract(b"{\\rtf1 Hello\\par \\u26085\\?\\u26412\\? world}");
//! assert_eq!(text, "Hello\n日本 world");
//! ```
//!
//! ## Pipeline
//!
//! Every document passes through six stages, each a text-to-text transform:
//!
//! 1. **Byte decoding**: first encoding of a candidate list that decodes cleanly
//! 2. **Escape decoding**: `\uN` and `\'hh` escapes become characters
//! 3. **Structure stripping**: font, color, style, info and picture groups are removed
//! 4. **Control-code elimination**: `\par`, `\tab`, `\page` become whitespace, the rest goes
//! 5. **Noise filtering**: leftover residue lines are dropped by named rules
//! 6. **Whitespace normalization**
//!
//! Extraction never fails on malformed input; only I/O can fail.
//!
//! ## Features
//!
//! - **CJK support**: Japanese text in UTF-8, Shift_JIS, EUC-JP or escapes
//! - **Auditable filtering**: every dropped line names the rule that dropped it
//! - **Batch conversion**: parallel, isolated per document, with a JSON report

pub mod batch;
pub mod convert;
pub mod decode;
pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;

// Re-export commonly used types
pub use batch::{
    derive_output_path, run_batch, BatchEvent, BatchOptions, BatchReport, BatchRunner,
    DocumentOutcome, DocumentStatus,
};
pub use convert::{
    ConvertOptions, ConvertResult, ConverterRegistry, DocumentConverter, OutputFormat,
    RtfConverter,
};
pub use decode::DecoderOptions;
pub use detect::{
    detect_format_from_bytes, detect_format_from_path, is_rtf, summarize_structure, RtfFormat,
    StructureSummary,
};
pub use error::{Error, Result};
pub use model::{
    DecodedText, EscapeToken, LineOutcome, LineRecord, RawDocument, SpanKind, StructuralSpan,
};
pub use parser::{LineBreakMode, ParseOptions, Pipeline};
pub use render::{
    CleanupOptions, CleanupPreset, ExtractionReport, ExtractionStats, JsonFormat, LineRule,
    NoiseFilter, RenderResult,
};

use std::path::Path;

/// Extract the readable text of an RTF document.
///
/// Never fails: undecodable bytes, broken groups and bad escapes are
/// absorbed.
///
/// # Example
///
/// ```
/// let text = unrtf::extract(b"{\\fonttbl{\\f0 Times New Roman;}} Real content here");
/// assert_eq!(text, "Real content here");
/// ```
pub fn extract(data: &[u8]) -> String {
    Pipeline::default().run_bytes(data).content
}

/// Extract text with custom options, returning the extraction report too.
///
/// # Example
///
/// ```
/// use unrtf::{extract_with_options, CleanupPreset, ParseOptions};
///
/// let options = ParseOptions::new()
///     .japanese()
///     .with_cleanup_preset(CleanupPreset::Aggressive);
/// let result = extract_with_options(b"{\\rtf1 Hello}", &options);
/// assert_eq!(result.content, "Hello");
/// ```
pub fn extract_with_options(data: &[u8], options: &ParseOptions) -> RenderResult {
    Pipeline::new(options.clone()).run_bytes(data)
}

/// Extract the readable text of an RTF file.
///
/// # Example
///
/// ```no_run
/// let text = unrtf::extract_file("letter.rtf").unwrap();
/// println!("{}", text);
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<String> {
    Ok(Pipeline::default().run_file(path)?.content)
}

/// Classify every line reaching the noise filter.
///
/// # Example
///
/// ```
/// let records = unrtf::audit(b"{\\rtf1 Kept line\\par x4535}");
/// assert!(records[0].is_kept());
/// assert_eq!(records[1].rule, Some("measure-token"));
/// ```
pub fn audit(data: &[u8]) -> Vec<LineRecord> {
    Pipeline::default().run_bytes(data).report.lines
}

/// Builder for extracting RTF documents.
///
/// # Example
///
/// ```no_run
/// use unrtf::{CleanupPreset, Unrtf};
///
/// let result = Unrtf::new()
///     .japanese()
///     .with_cleanup(CleanupPreset::Aggressive)
///     .with_page_break_marker("--- 改ページ ---")
///     .parse("letter.rtf")?;
/// println!("{}", result.text());
/// # Ok::<(), unrtf::Error>(())
/// ```
pub struct Unrtf {
    parse_options: ParseOptions,
}

impl Unrtf {
    /// Create a new Unrtf builder.
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::default(),
        }
    }

    /// Try Shift_JIS and EUC-JP before windows-1252.
    pub fn japanese(mut self) -> Self {
        self.parse_options = self.parse_options.japanese();
        self
    }

    /// Set the encoding tried first.
    pub fn with_encoding(mut self, encoding: &'static encoding_rs::Encoding) -> Self {
        self.parse_options = self.parse_options.with_encoding_hint(encoding);
        self
    }

    /// Set cleanup preset.
    pub fn with_cleanup(mut self, preset: CleanupPreset) -> Self {
        self.parse_options = self.parse_options.with_cleanup_preset(preset);
        self
    }

    /// Set the line emitted for page breaks.
    pub fn with_page_break_marker(mut self, marker: impl Into<String>) -> Self {
        self.parse_options = self.parse_options.with_page_break_marker(marker);
        self
    }

    /// Leave `\'hh` escapes undecoded.
    pub fn without_hex_escapes(mut self) -> Self {
        self.parse_options = self.parse_options.with_hex_escapes(false);
        self
    }

    /// Set raw line-break handling.
    pub fn with_line_breaks(mut self, mode: LineBreakMode) -> Self {
        self.parse_options = self.parse_options.with_line_breaks(mode);
        self
    }

    /// Extract an RTF file and return a result wrapper.
    pub fn parse<P: AsRef<Path>>(self, path: P) -> Result<UnrtfResult> {
        let result = Pipeline::new(self.parse_options).run_file(path)?;
        Ok(UnrtfResult { result })
    }

    /// Extract RTF from bytes.
    pub fn parse_bytes(self, data: &[u8]) -> UnrtfResult {
        let result = Pipeline::new(self.parse_options).run_bytes(data);
        UnrtfResult { result }
    }
}

impl Default for Unrtf {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of extracting an RTF document.
pub struct UnrtfResult {
    result: RenderResult,
}

impl UnrtfResult {
    /// The extracted text.
    pub fn text(&self) -> &str {
        &self.result.content
    }

    /// Convert to JSON, report included.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.result, format)
    }

    /// Diagnostics from every stage.
    pub fn report(&self) -> &ExtractionReport {
        &self.result.report
    }

    /// Take the underlying result.
    pub fn into_inner(self) -> RenderResult {
        self.result
    }
}
