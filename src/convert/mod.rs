//! Converters from document files to extracted text.
//!
//! A [`ConverterRegistry`] picks a [`DocumentConverter`] by file extension,
//! and falls back to sniffing the content when the extension is unknown or
//! missing. Word, for one, happily saves RTF under a `.doc` name.
//!
//! # Example
//!
//! ```no_run
//! use unrtf::convert::{ConvertOptions, ConverterRegistry};
//! use std::path::Path;
//!
//! fn main() -> unrtf::Result<()> {
//!     let registry = ConverterRegistry::with_defaults();
//!     let result = registry.convert(Path::new("letter.doc"), &ConvertOptions::default())?;
//!     println!("{}", result.content);
//!     Ok(())
//! }
//! ```

mod rtf;

pub use rtf::RtfConverter;

use crate::detect::RtfFormat;
use crate::error::{Error, Result};
use crate::parser::ParseOptions;
use crate::render::ExtractionStats;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Bytes read from a file when sniffing its content.
const SNIFF_LEN: u64 = 512;

/// Options for document conversion.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Extraction options
    pub parse: ParseOptions,

    /// Reject input that does not start with an RTF header
    pub require_header: bool,

    /// Attach extraction statistics to the result
    pub collect_stats: bool,

    /// Shape of [`ConvertResult::content`]
    pub output_format: OutputFormat,
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set extraction options.
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse = options;
        self
    }

    /// Fail with [`Error::UnknownFormat`] on headerless input.
    pub fn with_header_check(mut self, require: bool) -> Self {
        self.require_header = require;
        self
    }

    /// Enable statistics collection.
    pub fn with_stats(mut self, collect: bool) -> Self {
        self.collect_stats = collect;
        self
    }

    /// Set output format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }
}

/// What a conversion produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Extracted text, written to a `.md` file
    #[default]
    Markdown,

    /// Extracted text
    Text,

    /// Text together with the extraction report
    Json,
}

impl OutputFormat {
    /// MIME type of content in this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "text/markdown",
            OutputFormat::Text => "text/plain",
            OutputFormat::Json => "application/json",
        }
    }
}

/// Output of a converter.
#[derive(Debug, Clone)]
pub struct ConvertResult {
    pub content: String,

    /// Header of the source, when it had one
    pub format: Option<RtfFormat>,

    /// Present when [`ConvertOptions::collect_stats`] was set
    pub stats: Option<ExtractionStats>,

    pub mime_type: &'static str,
}

impl ConvertResult {
    /// Create a new conversion result.
    pub fn new(content: String, format: Option<RtfFormat>) -> Self {
        Self {
            content,
            format,
            stats: None,
            mime_type: OutputFormat::Markdown.mime_type(),
        }
    }

    /// Attach extraction statistics.
    pub fn with_stats(mut self, stats: ExtractionStats) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Override the MIME type.
    pub fn with_mime_type(mut self, mime_type: &'static str) -> Self {
        self.mime_type = mime_type;
        self
    }

    /// Content length in bytes.
    pub fn content_len(&self) -> usize {
        self.content.len()
    }
}

/// A converter for one document format.
pub trait DocumentConverter: Send + Sync {
    /// Lowercase extensions without the dot, e.g. `["rtf"]`.
    fn supported_extensions(&self) -> &[&str];

    /// Converter name used in logs and lookups.
    fn name(&self) -> &str;

    /// Whether the leading bytes of a file belong to this format.
    ///
    /// Used when the extension does not pick a converter.
    fn sniff(&self, _header: &[u8]) -> bool {
        false
    }

    /// Convert a file.
    fn convert(&self, path: &Path, options: &ConvertOptions) -> Result<ConvertResult>;

    /// Convert document bytes held in memory.
    fn convert_bytes(&self, bytes: &[u8], options: &ConvertOptions) -> Result<ConvertResult>;

    fn supports_extension(&self, ext: &str) -> bool {
        self.supported_extensions()
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// Converters indexed by extension and name, in registration order.
pub struct ConverterRegistry {
    converters: Vec<Arc<dyn DocumentConverter>>,
    by_extension: HashMap<String, usize>,
}

impl ConverterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            converters: Vec::new(),
            by_extension: HashMap::new(),
        }
    }

    /// A registry holding [`RtfConverter`].
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(RtfConverter::new()));
        registry
    }

    /// Add a converter. A later converter takes over extensions it shares
    /// with an earlier one; sniffing still tries them in registration order.
    pub fn register(&mut self, converter: Arc<dyn DocumentConverter>) {
        let slot = self.converters.len();
        for ext in converter.supported_extensions() {
            self.by_extension.insert(ext.to_lowercase(), slot);
        }
        self.converters.push(converter);
    }

    /// Converter registered for an extension, case-insensitive.
    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn DocumentConverter>> {
        self.by_extension
            .get(&ext.to_lowercase())
            .map(|&slot| self.converters[slot].clone())
    }

    /// Case-insensitive lookup by converter name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn DocumentConverter>> {
        self.converters
            .iter()
            .rev()
            .find(|c| c.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    /// First converter whose [`DocumentConverter::sniff`] accepts `header`.
    pub fn get_by_content(&self, header: &[u8]) -> Option<Arc<dyn DocumentConverter>> {
        self.converters.iter().find(|c| c.sniff(header)).cloned()
    }

    /// Whether a converter handles the extension.
    pub fn supports(&self, ext: &str) -> bool {
        self.by_extension.contains_key(&ext.to_lowercase())
    }

    /// Registered extensions, sorted.
    pub fn supported_extensions(&self) -> Vec<&str> {
        let mut extensions: Vec<&str> = self.by_extension.keys().map(|s| s.as_str()).collect();
        extensions.sort_unstable();
        extensions
    }

    /// Pick the converter for a file: by extension first, then by content.
    pub fn resolve(&self, path: &Path) -> Result<Arc<dyn DocumentConverter>> {
        if let Some(converter) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|ext| self.get_by_extension(ext))
        {
            return Ok(converter);
        }

        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let mut header = Vec::new();
        File::open(path)?.take(SNIFF_LEN).read_to_end(&mut header)?;

        self.get_by_content(&header).ok_or_else(|| {
            Error::Other(format!("No converter recognizes {}", path.display()))
        })
    }

    /// Convert a file with the converter [`resolve`](Self::resolve) picks.
    pub fn convert(&self, path: &Path, options: &ConvertOptions) -> Result<ConvertResult> {
        let converter = self.resolve(path)?;
        log::debug!("Converting {} with {}", path.display(), converter.name());
        converter.convert(path, options)
    }

    /// Convert bytes, choosing by `ext` and falling back to content.
    pub fn convert_bytes(
        &self,
        bytes: &[u8],
        ext: &str,
        options: &ConvertOptions,
    ) -> Result<ConvertResult> {
        let converter = self
            .get_by_extension(ext)
            .or_else(|| self.get_by_content(bytes))
            .ok_or_else(|| Error::Other(format!("No converter for extension: {}", ext)))?;

        converter.convert_bytes(bytes, options)
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::CleanupPreset;

    #[test]
    fn test_convert_options_builder() {
        let options = ConvertOptions::new()
            .with_parse_options(ParseOptions::new().with_cleanup_preset(CleanupPreset::Minimal))
            .with_header_check(true)
            .with_stats(true)
            .with_format(OutputFormat::Text);

        assert!(!options.parse.cleanup.filter_noise);
        assert!(options.require_header);
        assert!(options.collect_stats);
        assert_eq!(options.output_format, OutputFormat::Text);
    }

    #[test]
    fn test_registry_lookup() {
        let registry = ConverterRegistry::with_defaults();
        assert!(registry.supports("RTF"));
        assert!(!registry.supports("docx"));
        assert_eq!(registry.get_by_extension("rtf").unwrap().name(), "rtf");
        assert!(registry.get_by_name("Rtf").is_some());
    }

    #[test]
    fn test_unknown_extension_falls_back_to_content() {
        let registry = ConverterRegistry::with_defaults();
        let result = registry
            .convert_bytes(b"{\\rtf1 Saved as doc}", "doc", &ConvertOptions::default())
            .unwrap();
        assert_eq!(result.content, "Saved as doc");

        let err = registry
            .convert_bytes(b"PK\x03\x04", "odt", &ConvertOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("odt"));
    }

    #[test]
    fn test_resolve_sniffs_file_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("letter.doc");
        std::fs::write(&path, b"{\\rtf1\\ansi Dear reader}").unwrap();

        let registry = ConverterRegistry::with_defaults();
        assert_eq!(registry.resolve(&path).unwrap().name(), "rtf");

        let other = dir.path().join("notes");
        std::fs::write(&other, b"plain words").unwrap();
        assert!(registry.resolve(&other).is_err());
    }

    #[test]
    fn test_resolve_missing_file() {
        let registry = ConverterRegistry::with_defaults();
        let err = registry.resolve(Path::new("nowhere/letter.doc")).err();
        assert!(matches!(err, Some(Error::NotFound(_))));
    }

    #[test]
    fn test_output_format_mime_types() {
        assert_eq!(OutputFormat::Markdown.mime_type(), "text/markdown");
        assert_eq!(OutputFormat::Json.mime_type(), "application/json");
    }
}
