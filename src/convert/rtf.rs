//! RTF document converter implementation.

use crate::detect::is_rtf_bytes;
use crate::error::{Error, Result};
use crate::model::RawDocument;
use crate::parser::Pipeline;
use crate::render::{to_json, JsonFormat, RenderResult};
use std::path::Path;

use super::{ConvertOptions, ConvertResult, DocumentConverter, OutputFormat};

/// RTF document converter.
///
/// Extracts the readable text of RTF documents as Markdown, plain text, or
/// JSON with the extraction report.
#[derive(Debug, Clone, Default)]
pub struct RtfConverter {
    _private: (),
}

impl RtfConverter {
    /// Create a new RTF converter.
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn convert_raw(&self, raw: &RawDocument, options: &ConvertOptions) -> Result<ConvertResult> {
        let pipeline = Pipeline::new(options.parse.clone());
        let result = pipeline.run(raw);

        if options.require_header && result.report.format.is_none() {
            return Err(Error::UnknownFormat);
        }

        self.convert_result(result, options)
    }

    fn convert_result(&self, result: RenderResult, options: &ConvertOptions) -> Result<ConvertResult> {
        let content = match options.output_format {
            OutputFormat::Markdown | OutputFormat::Text => result.content.clone(),
            OutputFormat::Json => to_json(&result, JsonFormat::Pretty)?,
        };

        let mut converted = ConvertResult::new(content, result.report.format.clone())
            .with_mime_type(options.output_format.mime_type());
        if options.collect_stats {
            converted = converted.with_stats(result.report.stats);
        }
        Ok(converted)
    }
}

impl DocumentConverter for RtfConverter {
    fn supported_extensions(&self) -> &[&str] {
        &["rtf"]
    }

    fn name(&self) -> &str {
        "rtf"
    }

    fn sniff(&self, header: &[u8]) -> bool {
        is_rtf_bytes(header)
    }

    fn convert(&self, path: &Path, options: &ConvertOptions) -> Result<ConvertResult> {
        let raw = RawDocument::open(path)?;
        self.convert_raw(&raw, options)
    }

    fn convert_bytes(&self, bytes: &[u8], options: &ConvertOptions) -> Result<ConvertResult> {
        self.convert_raw(&RawDocument::new(bytes), options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rtf_converter_extensions() {
        let converter = RtfConverter::new();
        assert_eq!(converter.supported_extensions(), &["rtf"]);
        assert!(converter.supports_extension("rtf"));
        assert!(converter.supports_extension("RTF"));
        assert!(!converter.supports_extension("docx"));
    }

    #[test]
    fn test_rtf_converter_name() {
        let converter = RtfConverter::new();
        assert_eq!(converter.name(), "rtf");
    }

    #[test]
    fn test_rtf_converter_sniff() {
        let converter = RtfConverter::new();
        assert!(converter.sniff(b"\xEF\xBB\xBF{\\rtf1\\ansi"));
        assert!(!converter.sniff(b"%PDF-1.7"));
    }

    #[test]
    fn test_convert_bytes_text() {
        let options = ConvertOptions::new().with_format(OutputFormat::Text);
        let result = RtfConverter::new()
            .convert_bytes(b"{\\rtf1 Hello\\par world}", &options)
            .unwrap();
        assert_eq!(result.content, "Hello\nworld");
        assert_eq!(result.mime_type, "text/plain");
        assert!(result.stats.is_none());
        assert_eq!(result.format.map(|f| f.version), Some(1));
    }

    #[test]
    fn test_convert_bytes_json_with_stats() {
        let options = ConvertOptions::new()
            .with_format(OutputFormat::Json)
            .with_stats(true);
        let result = RtfConverter::new()
            .convert_bytes(b"{\\rtf1 Hello\\par world}", &options)
            .unwrap();
        assert!(result.content.contains("\"content\": \"Hello\\nworld\""));
        assert_eq!(result.stats.unwrap().lines_kept, 2);
    }

    #[test]
    fn test_header_check() {
        let options = ConvertOptions::new().with_header_check(true);
        let err = RtfConverter::new()
            .convert_bytes(b"plain text, not rtf", &options)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownFormat));

        let lenient = RtfConverter::new()
            .convert_bytes(b"plain text, not rtf", &ConvertOptions::default())
            .unwrap();
        assert_eq!(lenient.content, "plain text, not rtf");
    }
}
