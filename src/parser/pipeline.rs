//! The extraction pipeline.
//!
//! Bytes flow through six stages, each a text-to-text transform:
//! byte decoding, escape decoding, structure stripping, control-code
//! elimination, noise filtering and whitespace normalization.

use std::path::Path;

use encoding_rs::UTF_8;

use crate::decode::{encoding_for_codepage, encoding_or_default, ByteDecoder, EscapeDecoder};
use crate::detect::{detect_format_from_bytes, sniff_codepage};
use crate::error::Result;
use crate::model::RawDocument;
use crate::render::{ExtractionReport, NoiseFilter, RenderResult, WhitespaceNormalizer};

use super::control::ControlCodeEliminator;
use super::options::ParseOptions;
use super::structure::StructureStripper;

/// Runs the extraction stages with one set of options.
///
/// Holds no per-document state; one pipeline can serve many threads.
#[derive(Debug)]
pub struct Pipeline {
    options: ParseOptions,
    filter: NoiseFilter,
}

impl Pipeline {
    /// Create a pipeline with the given options.
    pub fn new(options: ParseOptions) -> Self {
        let filter = NoiseFilter::new(&options.cleanup);
        Self { options, filter }
    }

    /// Replace the noise filter, keeping the other options.
    pub fn with_filter(mut self, filter: NoiseFilter) -> Self {
        self.filter = filter;
        self
    }

    /// The options in use.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// The noise filter in use.
    pub fn filter(&self) -> &NoiseFilter {
        &self.filter
    }

    /// Read and extract a file.
    pub fn run_file<P: AsRef<Path>>(&self, path: P) -> Result<RenderResult> {
        let raw = RawDocument::open(path)?;
        Ok(self.run(&raw))
    }

    /// Extract text from raw bytes. Never fails.
    pub fn run_bytes(&self, data: &[u8]) -> RenderResult {
        self.run(&RawDocument::new(data))
    }

    /// Extract text from a raw document. Never fails.
    pub fn run(&self, raw: &RawDocument) -> RenderResult {
        let mut report = ExtractionReport::default();
        report.stats.input_bytes = raw.len() as u64;
        report.format = detect_format_from_bytes(raw.bytes()).ok();
        let is_rtf = report.format.is_some();
        let codepage = report
            .format
            .as_ref()
            .and_then(|f| f.codepage)
            .or_else(|| sniff_codepage(raw.bytes()));

        // Byte decoding
        let mut decoder_options = self.options.decoder.clone();
        if self.options.use_declared_codepage {
            if let Some(encoding) = codepage.and_then(encoding_for_codepage) {
                decoder_options = decoder_options.prefer(encoding).prefer(UTF_8);
            }
        }
        let hinted;
        let raw = match self.options.encoding_hint {
            Some(hint) => {
                hinted = raw.clone().with_encoding_hint(hint);
                &hinted
            }
            None => raw,
        };
        let decoded = ByteDecoder::new(decoder_options).decode(raw);
        report.encoding = decoded.encoding_name().to_string();
        report.lossy_decode = decoded.lossy;

        // Escape decoding
        let mut escape_decoder = EscapeDecoder::new();
        if self.options.decode_hex_escapes {
            escape_decoder = escape_decoder.with_hex_encoding(encoding_or_default(codepage));
        }
        let escaped = escape_decoder.decode(&decoded.text);
        report.stats.escapes_resolved = escaped.resolved_count() as u32;
        report.stats.escapes_unresolved = escaped.unresolved_count() as u32;
        report.stats.hex_bytes_decoded = escaped.hex_bytes as u32;
        log::debug!(
            "Escapes: {} resolved, {} unresolved, {} hex bytes, {} fallbacks skipped",
            escaped.resolved_count(),
            escaped.unresolved_count(),
            escaped.hex_bytes,
            escaped.skipped_fallbacks
        );
        report.tokens = escaped.tokens;

        // Structure stripping
        let stripped = StructureStripper::new()
            .with_payloads(self.options.strip_payloads)
            .strip(&escaped.text);
        for span in stripped.spans() {
            report.record_span(span.kind, span.len());
        }
        report.unclosed_groups = stripped.unclosed_groups;

        // Control-code elimination
        let plain = ControlCodeEliminator::new()
            .with_page_break_marker(self.options.page_break_marker.clone())
            .with_source_line_breaks(self.options.line_breaks.keeps_breaks(is_rtf))
            .eliminate(&stripped.text);
        log::debug!(
            "Control codes removed: {} -> {} bytes",
            stripped.text.len(),
            plain.len()
        );

        // Noise filtering
        let records = self.filter.audit(&plain);
        let filtered = crate::render::join_kept(&records);
        report.record_lines(records);
        log::debug!(
            "Noise filter kept {} of {} lines",
            report.stats.lines_kept,
            report.stats.lines_kept + report.stats.lines_dropped
        );

        // Normalization
        let content = WhitespaceNormalizer::new()
            .with_nfc(self.options.cleanup.normalize_unicode)
            .normalize(&filtered);
        report.stats.count_text(&content);

        RenderResult::new(content, report)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(ParseOptions::default())
    }
}
